#![allow(dead_code)]

use docshift::{
    ConvertError, Result,
    engine::{Engine, RenderRequest, ToolDiag},
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Engine that fakes each tool by writing placeholder files.
#[derive(Default)]
pub struct ScriptedEngine {
    /// When false the office bridge "succeeds" without writing anything.
    pub office_writes_output: bool,
    pub pages: usize,
    /// Return a page path that was never written, after the real ones.
    pub missing_last_page: bool,
    pub markdown: String,
    pub fail_format: Option<String>,
    pub calls: RefCell<Vec<String>>,
    pub renders: RefCell<Vec<RenderRequest>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            office_writes_output: true,
            pages: 1,
            markdown: "# Title\n\nBody text\n".into(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

fn failed(tool: &str) -> ConvertError {
    ConvertError::ToolFailed {
        tool: tool.into(),
        status: exit_status(1),
        stderr: format!("{tool} exploded"),
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code as u32)
}

impl Engine for ScriptedEngine {
    fn doctor(&self) -> Vec<ToolDiag> {
        Vec::new()
    }

    fn office_convert(&self, input: &Path, out_dir: &Path, target_ext: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("office:{target_ext}:{}", input.display()));
        if self.office_writes_output {
            let stem = input.file_stem().unwrap().to_string_lossy();
            std::fs::write(out_dir.join(format!("{stem}.{target_ext}")), b"bridged").unwrap();
        }
        Ok(())
    }

    fn rasterize_pdf(&self, pdf: &Path, scratch_dir: &Path) -> Result<Vec<PathBuf>> {
        self.calls
            .borrow_mut()
            .push(format!("rasterize:{}", pdf.display()));
        let mut out = Vec::new();
        for n in 1..=self.pages {
            let p = scratch_dir.join(format!("page-{n}.png"));
            std::fs::write(&p, format!("page {n}")).unwrap();
            out.push(p);
        }
        if self.missing_last_page {
            out.push(scratch_dir.join("page-999.png"));
        }
        Ok(out)
    }

    fn extract_markdown(&self, input: &Path) -> Result<String> {
        self.calls
            .borrow_mut()
            .push(format!("extract:{}", input.display()));
        Ok(self.markdown.clone())
    }

    fn render_markup(&self, req: &RenderRequest) -> Result<()> {
        self.renders.borrow_mut().push(req.clone());
        if self.fail_format.as_deref() == Some(req.format.as_str()) {
            return Err(failed("pandoc"));
        }
        std::fs::write(&req.output, b"rendered").unwrap();
        Ok(())
    }
}

pub fn page_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("page_") && n.ends_with(".png"))
        .collect();
    names.sort();
    names
}
