//! The tool manifest: a JSON description of this CLI printed in place of
//! top-level help text.

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

static MANIFEST: OnceCell<serde_json::Value> = OnceCell::new();

/// True when argv is exactly the program name followed by `-h` or `--help`.
pub fn should_emit_manifest(argv: &[String]) -> bool {
    argv.len() == 2 && matches!(argv[1].as_str(), "-h" | "--help")
}

/// Where the manifest is looked up: next to the executable, then the crate root.
pub fn candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        out.push(dir.join(MANIFEST_FILE));
    }
    out.push(Path::new(env!("CARGO_MANIFEST_DIR")).join(MANIFEST_FILE));
    out
}

pub fn load_from(candidates: &[PathBuf]) -> Result<serde_json::Value> {
    for candidate in candidates {
        if candidate.exists() {
            let raw = std::fs::read_to_string(candidate)
                .with_context(|| format!("reading manifest: {}", candidate.display()))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("parsing manifest: {}", candidate.display()));
        }
    }
    Err(anyhow!(
        "{MANIFEST_FILE} not found alongside the executable or in the project root"
    ))
}

/// Loaded on first call and reused for the rest of the process.
pub fn manifest() -> Result<&'static serde_json::Value> {
    MANIFEST.get_or_try_init(|| load_from(&candidates()))
}

pub fn print_manifest() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(manifest()?)?);
    Ok(())
}
