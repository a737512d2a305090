use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDiag {
    pub name: String,
    pub program: String,
    pub found: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One markup-renderer run. Optional flags are already filtered for `format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: String,
    pub reference_doc: Option<PathBuf>,
    pub pdf_engine: Option<String>,
}
