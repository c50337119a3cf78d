//! CLI binary for receipt-prep.
//!
//! A thin shim over the library crate: `rectify` maps flags to
//! `RectifyConfig` and writes the normalised image, `extract-json` pulls the
//! JSON object out of a saved model reply.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use receipt_prep::{
    extract_first_json_object, parse_model_json, rectify_to_file, OutputFormat,
    ReceiptExtraction, RectifyConfig,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Flatten a receipt photo (writes IMG_0042.rectified.jpg)
  receipt-prep rectify IMG_0042.jpg

  # Lossless output at a smaller size
  receipt-prep rectify IMG_0042.jpg --format png --max-long-edge 1200 -o flat.png

  # Machine-readable summary
  receipt-prep rectify IMG_0042.jpg --json

  # Pull the JSON out of a saved model reply
  receipt-prep extract-json reply.txt

  # Same, from stdin, normalised into the receipt schema
  cat reply.txt | receipt-prep extract-json --receipt

ENVIRONMENT VARIABLES:
  RECEIPT_PREP_MAX_LONG_EDGE   Default for --max-long-edge
  RECEIPT_PREP_FORMAT          Default for --format (jpeg, png)
  RECEIPT_PREP_JPEG_QUALITY    Default for --jpeg-quality
  RUST_LOG                     Overrides the log filter (e.g. receipt_prep=debug)
"#;

/// Prepare receipt photos for vision models and parse their replies.
#[derive(Parser, Debug)]
#[command(
    name = "receipt-prep",
    version,
    about = "Prepare receipt photos for vision models and parse their replies",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RECEIPT_PREP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "RECEIPT_PREP_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the receipt, flatten it, resize and re-encode.
    Rectify(RectifyArgs),
    /// Print the first JSON object found in a model reply.
    ExtractJson(ExtractArgs),
}

#[derive(Args, Debug)]
struct RectifyArgs {
    /// Photo to process (JPEG or PNG).
    input: PathBuf,

    /// Output path. Default: `<stem>.rectified.<ext>` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Longest allowed output edge in pixels.
    #[arg(long, env = "RECEIPT_PREP_MAX_LONG_EDGE", default_value_t = receipt_prep::config::DEFAULT_MAX_LONG_EDGE,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_long_edge: u32,

    /// Output encoding.
    #[arg(long, env = "RECEIPT_PREP_FORMAT", value_enum, default_value = "jpeg")]
    format: FormatArg,

    /// JPEG quality (1–100). Ignored for PNG.
    #[arg(long, env = "RECEIPT_PREP_JPEG_QUALITY", default_value_t = receipt_prep::config::DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Print the result summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// File holding the model reply. Reads stdin when omitted or `-`.
    file: Option<PathBuf>,

    /// Print the extracted text verbatim instead of re-serialising it.
    #[arg(long, conflicts_with = "receipt")]
    raw: bool,

    /// Parse into the receipt schema and print the normalised result.
    #[arg(long)]
    receipt: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Jpeg,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Rectify(args) => run_rectify(args, cli.quiet),
        Command::ExtractJson(args) => run_extract(args),
    }
}

fn run_rectify(args: &RectifyArgs, quiet: bool) -> Result<()> {
    let config = RectifyConfig::builder()
        .max_long_edge(args.max_long_edge)
        .output_format(args.format.into())
        .jpeg_quality(args.jpeg_quality)
        .build()
        .context("Invalid configuration")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, config.output_format));

    let summary = rectify_to_file(&args.input, &output, &config)
        .with_context(|| format!("Failed to rectify {}", args.input.display()))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !quiet {
        let status = if summary.did_rectify {
            green("✔ rectified")
        } else {
            yellow("⚠ no document edge found, resized only")
        };
        eprintln!(
            "{status}  {}x{}  {} bytes  →  {}",
            summary.width,
            summary.height,
            summary.bytes,
            bold(&output.display().to_string()),
        );
    }
    Ok(())
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let text = read_reply(args.file.as_deref())?;

    if args.raw {
        let object = extract_first_json_object(&text).context("No JSON object in reply")?;
        println!("{object}");
        return Ok(());
    }

    let pretty = if args.receipt {
        let receipt = ReceiptExtraction::from_model_reply(&text)
            .context("Reply is not a receipt extraction")?;
        serde_json::to_string_pretty(&receipt)
    } else {
        let value: serde_json::Value =
            parse_model_json(&text).context("No usable JSON in reply")?;
        serde_json::to_string_pretty(&value)
    }
    .context("Failed to serialise JSON")?;

    println!("{pretty}");
    Ok(())
}

fn read_reply(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// `photos/IMG_1.HEIC.jpg` → `photos/IMG_1.HEIC.rectified.jpg`
fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "receipt".to_string());
    input.with_file_name(format!("{stem}.rectified.{}", format.extension()))
}
