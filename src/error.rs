//! Error types for the watermark removal library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the watermark removal library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input could not be parsed as a PDF
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Input is encrypted and cannot be inspected
    #[error("document is encrypted: {}", .0.display())]
    Encrypted(PathBuf),

    /// Internal invariant violated between classification and removal
    #[error("removal inconsistency: {0}")]
    Inconsistency(String),

    /// General error
    #[error("{0}")]
    General(String),
}
