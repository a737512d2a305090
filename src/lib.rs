//! Document conversion dispatcher.
//!
//! Validates an input document, picks the external tool chain (LibreOffice,
//! pdftoppm, MarkItDown, Pandoc) and reports the produced files as JSON.

pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod util;

pub use error::{ConvertError, Result};
