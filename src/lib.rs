//! PDF Unstamp Library
//!
//! Detects and removes watermark artifacts that a known authoring tool
//! injects into exported PDFs: a small badge image repeated on every page
//! and link annotations pointing at the issuer's domain. This library
//! provides functionality to:
//! - Scan a PDF and report watermark removal targets
//! - Rewrite the PDF with those artifacts structurally removed
//! - Configure the issuer domain and image heuristic per instance
//!
//! # Example
//!
//! ```no_run
//! use pdf_unstamp::{WatermarkDetector, WatermarkRemover};
//! use std::path::Path;
//!
//! let detector = WatermarkDetector::new();
//! let outcome = detector
//!     .identify_watermarks(Path::new("deck.pdf"))
//!     .expect("Failed to scan PDF");
//!
//! if !outcome.is_clean() {
//!     let remover = WatermarkRemover::new();
//!     let stats = remover
//!         .clean_pdf_from_target_domain(Path::new("deck.pdf"), Path::new("deck-clean.pdf"))
//!         .expect("Failed to clean PDF");
//!     println!("removed {} images, {} links", stats.images_removed, stats.links_removed);
//! }
//! ```

pub mod config;
pub mod error;
pub mod pdf;

// Re-export commonly used items
pub use config::{CleanConfig, ImageHeuristic};
pub use error::{Error, Result};
pub use pdf::{
    RemovalStats, RemovalTarget, ScanOutcome, TargetKind, WatermarkDetector, WatermarkRemover,
};
