//! # receipt-prep
//!
//! Prepare photographed receipts for a vision model, and make sense of what
//! the model sends back.
//!
//! ## Why this crate?
//!
//! Phone photos of receipts are taken at an angle, on a cluttered table, at
//! 12 megapixels. Vision models read them noticeably better once the paper is
//! cropped, flattened into a rectangle and scaled to a sane size, and the
//! request is cheaper too. On the way back, models asked for "JSON only"
//! still wrap it in fences or chatty prose. This crate handles both ends.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo bytes
//!  │
//!  ├─ 1. Decode   JPEG/PNG → RGB
//!  ├─ 2. Resize   area-average so the long edge ≤ max_long_edge
//!  ├─ 3. Detect   blur → Canny → outer contours → largest 4-gon (best effort)
//!  ├─ 4. Warp     perspective-correct the 4-gon into an upright rectangle
//!  └─ 5. Encode   JPEG/PNG bytes (+ data URL for the model request)
//!
//! model reply
//!  │
//!  ├─ 6. Extract  first balanced {...}, string-aware
//!  └─ 7. Parse    serde into ReceiptExtraction (lenient money/quantities)
//! ```
//!
//! If no document boundary is found the resized photo is returned unwarped
//! with `did_rectify = false`; only undecodable input is an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use receipt_prep::{rectify_file, ReceiptExtraction, RectifyConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RectifyConfig::default();
//!     let prepared = rectify_file("receipt.jpg", &config)?;
//!     eprintln!("{}x{} rectified={}", prepared.width, prepared.height, prepared.did_rectify);
//!     let image_url = prepared.to_data_url();
//!
//!     // ... send `image_url` to a vision model, get `reply` back ...
//!     # let _ = image_url;
//!     let reply = "```json\n{\"summary\": \"Coffee\"}\n```";
//!     let receipt = ReceiptExtraction::from_model_reply(reply)?;
//!     println!("{}", receipt.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `receipt-prep` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! receipt-prep = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod json;
pub mod output;
pub mod pipeline;
pub mod receipt;
pub mod rectify;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OutputFormat, RectifyConfig, RectifyConfigBuilder};
pub use error::{ExtractError, RectifyError};
pub use json::{extract_first_json_object, parse_model_json};
pub use output::{RectificationResult, RectificationSummary};
pub use pipeline::detect::detect_document;
pub use pipeline::geometry::{order_points, OrderedQuadrilateral, Point2, Quadrilateral};
pub use receipt::{Category, Extractions, Field, LineItem, QualityScores, ReceiptExtraction};
pub use rectify::{rectify, rectify_file, rectify_to_file};
