use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub raster: Raster,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Loads `path` when given, built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub libreoffice: String,
    pub pdftoppm: String,
    pub markitdown: String,
    pub pandoc: String,
    /// 0 disables the timeout; a stuck tool then blocks forever.
    pub timeout_seconds: u64,
    pub keep_tool_stderr: bool,
}
impl Default for Tools {
    fn default() -> Self {
        Self {
            libreoffice: "libreoffice".into(),
            pdftoppm: "pdftoppm".into(),
            markitdown: "markitdown".into(),
            pandoc: "pandoc".into(),
            timeout_seconds: 0,
            keep_tool_stderr: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Raster {
    pub dpi: u32,
}
impl Default for Raster {
    fn default() -> Self {
        Self { dpi: 200 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Render {
    pub default_formats: Vec<String>,
    pub reference_doc_formats: Vec<String>,
}
impl Default for Render {
    fn default() -> Self {
        Self {
            default_formats: vec!["docx".into(), "pdf".into()],
            reference_doc_formats: vec!["docx".into(), "pptx".into(), "odt".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
