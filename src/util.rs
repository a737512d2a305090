use crate::error::{ConvertError, Result};
use std::path::Path;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).map_err(|e| ConvertError::io(p, e))
}

/// `page_001.png` for page 1; pages are numbered from 1.
pub fn page_file_name(page: usize) -> String {
    format!("page_{page:03}.png")
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn display(path: &Path) -> String {
    path.display().to_string()
}
