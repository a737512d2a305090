//! Errors raised by the conversion dispatcher.
//!
//! Every variant is terminal for the current command. The CLI wraps these in
//! `anyhow` and exits with status 1.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    #[error("File {} not found.", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Unsupported file type: .{ext}")]
    UnsupportedFileType { ext: String },

    #[error("Only Markdown sources (.md/.markdown) are supported: {}", path.display())]
    NotMarkdown { path: PathBuf },

    #[error("Reference document {} was not found.", path.display())]
    ReferenceDocNotFound { path: PathBuf },

    // ── External tool errors ──────────────────────────────────────────────
    #[error("failed to launch {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} exceeded timeout of {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    /// The tool exited cleanly but the file it should have written is absent.
    #[error("conversion produced no output; expected {}", expected.display())]
    BridgeFailed { expected: PathBuf },

    // ── Conversion errors ─────────────────────────────────────────────────
    #[error("rasterizer produced no pages for {}", pdf.display())]
    NoPages { pdf: PathBuf },

    #[error("image conversion failed for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
