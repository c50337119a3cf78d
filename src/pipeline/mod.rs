//! Pipeline stages for receipt rectification.
//!
//! Each submodule implements one transformation step so that each can be
//! tested on synthetic images in isolation.
//!
//! ## Data Flow
//!
//! ```text
//! decode ──▶ detect ──▶ warp ──▶ encode
//! (bytes→RGB, (edges,    (homography) (JPEG/PNG)
//!  downscale)  contours)
//! ```
//!
//! 1. [`decode`]   bytes → `RgbImage`, then area-averaging downscale
//! 2. [`detect`]   best-effort document quadrilateral; `None` is normal
//! 3. [`geometry`] point ordering, polygon measures, Douglas–Peucker
//! 4. [`warp`]     flatten the quadrilateral into a rectangle
//! 5. [`encode`]   re-encode and wrap as a data URL

pub mod decode;
pub mod detect;
pub mod encode;
pub mod geometry;
pub mod warp;
