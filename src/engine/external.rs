use super::{types::*, Engine};
use crate::config::Config;
use crate::error::{ConvertError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

static PAGE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(\d+)\.png$").expect("page suffix regex"));

/// Engine backed by LibreOffice, pdftoppm, MarkItDown and Pandoc found on `PATH`.
pub struct ExternalEngine {
    cfg: Config,
}

impl ExternalEngine {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.clone() }
    }

    fn run<I, S>(&self, program: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Own process group, so a timeout can take down helpers the tool forks
        // (the libreoffice launcher is a shell wrapper around soffice.bin).
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if self.cfg.tools.timeout_seconds > 0 {
                cmd.process_group(0);
            }
        }
        debug!("exec {:?}", cmd);

        let mut child = cmd.spawn().map_err(|source| ConvertError::ToolSpawn {
            tool: program.to_string(),
            source,
        })?;

        let output = if self.cfg.tools.timeout_seconds > 0 {
            wait_with_timeout(
                &mut child,
                program,
                Duration::from_secs(self.cfg.tools.timeout_seconds),
            )?
        } else {
            child
                .wait_with_output()
                .map_err(|e| ConvertError::io(program, e))?
        };

        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                tool: program.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if self.cfg.tools.keep_tool_stderr && !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{program} stderr: {}", stderr.trim());
        }

        Ok(output)
    }

    fn diagnose(&self, name: &str, program: &str, version_flag: &str) -> ToolDiag {
        match self.run(program, [version_flag]) {
            Ok(out) => {
                // pdftoppm prints its version banner on stderr
                let text = if out.stdout.is_empty() {
                    String::from_utf8_lossy(&out.stderr).into_owned()
                } else {
                    String::from_utf8_lossy(&out.stdout).into_owned()
                };
                ToolDiag {
                    name: name.to_string(),
                    program: program.to_string(),
                    found: true,
                    version: text
                        .lines()
                        .map(str::trim)
                        .find(|l| !l.is_empty())
                        .map(str::to_string),
                    error: None,
                }
            }
            Err(err) => ToolDiag {
                name: name.to_string(),
                program: program.to_string(),
                found: !matches!(err, ConvertError::ToolSpawn { .. }),
                version: None,
                error: Some(err.to_string()),
            },
        }
    }
}

impl Engine for ExternalEngine {
    fn doctor(&self) -> Vec<ToolDiag> {
        let t = &self.cfg.tools;
        vec![
            self.diagnose("office", &t.libreoffice, "--version"),
            self.diagnose("rasterizer", &t.pdftoppm, "-v"),
            self.diagnose("extractor", &t.markitdown, "--version"),
            self.diagnose("renderer", &t.pandoc, "--version"),
        ]
    }

    fn office_convert(&self, input: &Path, out_dir: &Path, target_ext: &str) -> Result<()> {
        self.run(
            &self.cfg.tools.libreoffice,
            [
                OsStr::new("--headless"),
                OsStr::new("--convert-to"),
                OsStr::new(target_ext),
                OsStr::new("--outdir"),
                out_dir.as_os_str(),
                input.as_os_str(),
            ],
        )?;
        Ok(())
    }

    fn rasterize_pdf(&self, pdf: &Path, scratch_dir: &Path) -> Result<Vec<PathBuf>> {
        let dpi = self.cfg.raster.dpi.to_string();
        let prefix = scratch_dir.join("page");
        self.run(
            &self.cfg.tools.pdftoppm,
            [
                OsStr::new("-png"),
                OsStr::new("-r"),
                OsStr::new(&dpi),
                pdf.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;
        ordered_pages(scratch_dir)
    }

    fn extract_markdown(&self, input: &Path) -> Result<String> {
        let out = self.run(&self.cfg.tools.markitdown, [input.as_os_str()])?;
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn render_markup(&self, req: &RenderRequest) -> Result<()> {
        let mut args: Vec<&OsStr> = vec![
            req.input.as_os_str(),
            OsStr::new("--from=markdown"),
            OsStr::new("--to"),
            OsStr::new(&req.format),
            OsStr::new("--output"),
            req.output.as_os_str(),
            OsStr::new("--standalone"),
        ];
        if let Some(reference) = &req.reference_doc {
            args.push(OsStr::new("--reference-doc"));
            args.push(reference.as_os_str());
        }
        if let Some(engine) = &req.pdf_engine {
            args.push(OsStr::new("--pdf-engine"));
            args.push(OsStr::new(engine));
        }
        self.run(&self.cfg.tools.pandoc, args)?;
        Ok(())
    }
}

/// 1-based page number pdftoppm encodes in `<prefix>-<n>.png`.
///
/// The width of `<n>` depends on the document's page count, so callers must
/// sort on this number rather than on the file name.
pub fn page_number(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    PAGE_SUFFIX.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Rasterizer output in `dir`, ordered by page number.
pub fn ordered_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))?;
    let mut pages = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ConvertError::io(dir, e))?.path();
        if let Some(n) = page_number(&path) {
            pages.push((n, path));
        }
    }
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

fn wait_with_timeout(child: &mut Child, tool: &str, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a chatty tool can't block on a full pipe.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let join = |handle: std::thread::JoinHandle<std::io::Result<Vec<u8>>>| -> Result<Vec<u8>> {
        handle
            .join()
            .map_err(|_| ConvertError::io(tool, std::io::Error::other("pipe reader panicked")))?
            .map_err(|e| ConvertError::io(tool, e))
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(|e| ConvertError::io(tool, e))? {
            let stdout = join(stdout_thread)?;
            let stderr = join(stderr_thread)?;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("{tool} timed out after {:?}", timeout);
            kill_process_group(child);
            child.wait().map_err(|e| ConvertError::io(tool, e))?;
            // A descendant that escaped the group may still hold the pipes;
            // the readers are left to finish on their own.
            drop(stdout_thread);
            drop(stderr_thread);
            return Err(ConvertError::ToolTimeout {
                tool: tool.to_string(),
                secs: timeout.as_secs(),
            });
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    // The child leads its own group (see `ExternalEngine::run`).
    let pgid = child.id() as libc::pid_t;
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}
