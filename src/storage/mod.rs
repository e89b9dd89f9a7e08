//! Local persistence of run output
//!
//! Only images are written to disk; the JSON report is written by the
//! binary.

pub mod images;

pub use images::{extension_for, ImageDownloader};
