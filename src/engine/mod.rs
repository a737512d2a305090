pub mod external;
pub mod types;

use crate::error::Result;
use std::path::{Path, PathBuf};

pub use types::{RenderRequest, ToolDiag};

/// The external tool chain the dispatcher delegates conversions to.
pub trait Engine {
    fn doctor(&self) -> Vec<ToolDiag>;
    /// Asks the office suite to write `<out_dir>/<input stem>.<target_ext>`.
    fn office_convert(&self, input: &Path, out_dir: &Path, target_ext: &str) -> Result<()>;
    /// Renders every page of `pdf` as PNG into `scratch_dir`, returned in page order.
    fn rasterize_pdf(&self, pdf: &Path, scratch_dir: &Path) -> Result<Vec<PathBuf>>;
    fn extract_markdown(&self, input: &Path) -> Result<String>;
    fn render_markup(&self, req: &RenderRequest) -> Result<()>;
}
