use std::path::Path;

/// Dispatch key derived from a file's lowercase extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    OfficeLegacy,
    OfficeModern,
    Pdf,
    RasterImage,
    Markdown,
    Unsupported(String),
}

pub const OFFICE_LEGACY: &[&str] = &["doc", "ppt", "xls", "odt", "odp", "ods"];
pub const OFFICE_MODERN: &[&str] = &["docx", "pptx", "xlsx"];
pub const RASTER_IMAGE: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "gif"];
pub const MARKDOWN: &[&str] = &["md", "markdown"];

impl FileKind {
    pub fn is_office(&self) -> bool {
        matches!(self, FileKind::OfficeLegacy | FileKind::OfficeModern)
    }
}

/// Lowercase extension without the leading dot; empty when there is none.
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn classify(path: &Path) -> FileKind {
    let ext = extension(path);
    let e = ext.as_str();
    if OFFICE_LEGACY.contains(&e) {
        FileKind::OfficeLegacy
    } else if OFFICE_MODERN.contains(&e) {
        FileKind::OfficeModern
    } else if e == "pdf" {
        FileKind::Pdf
    } else if RASTER_IMAGE.contains(&e) {
        FileKind::RasterImage
    } else if MARKDOWN.contains(&e) {
        FileKind::Markdown
    } else {
        FileKind::Unsupported(ext)
    }
}

/// Modern container a legacy document is bridged into before text extraction.
///
/// The office converter has no slide or sheet export filter to `docx`, so
/// presentations and spreadsheets go to their own modern counterpart.
pub fn modern_counterpart(ext: &str) -> &'static str {
    match ext {
        "ppt" | "odp" => "pptx",
        "xls" | "ods" => "xlsx",
        _ => "docx",
    }
}
