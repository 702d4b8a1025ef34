//! PDF watermark detection and removal

pub mod detect;
mod graph;
pub mod remove;

// Re-export commonly used items
pub use detect::{RemovalTarget, ScanOutcome, TargetKind, WatermarkDetector};
pub use remove::{RemovalStats, WatermarkRemover};
