use crate::{
    classify::{FileKind, classify, extension, modern_counterpart},
    config::Config,
    engine::{Engine, RenderRequest},
    error::{ConvertError, Result},
    report::{FilesReport, ImagesReport, MarkdownReport, RenderedFile},
    util::{display, ensure_dir, file_stem, page_file_name},
};
use image::{ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for rendering a Markdown source into deliverables.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Empty means the configured default formats.
    pub formats: Vec<String>,
    pub reference_doc: Option<PathBuf>,
    pub pdf_engine: Option<String>,
}

pub struct Dispatcher<E: Engine> {
    cfg: Config,
    engine: E,
}

impl<E: Engine> Dispatcher<E> {
    pub fn new(cfg: &Config, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            engine,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Produces one PNG per page from a PDF, office document, or raster image.
    pub fn convert_to_images(&self, input: &Path, out_dir: &Path) -> Result<ImagesReport> {
        require_input(input)?;
        ensure_dir(out_dir)?;

        let mut kind = classify(input);
        let mut source = input.to_path_buf();

        if kind.is_office() {
            info!("converting office document: {}", input.display());
            source = self.bridge(input, out_dir, "pdf")?;
            kind = FileKind::Pdf;
        }

        let images = match kind {
            FileKind::Pdf => {
                info!("rasterizing PDF: {}", source.display());
                self.rasterize(&source, out_dir)?
            }
            FileKind::RasterImage => {
                info!("processing image: {}", source.display());
                vec![normalize_image(&source, out_dir)?]
            }
            _ => {
                return Err(ConvertError::UnsupportedFileType {
                    ext: extension(input),
                });
            }
        };

        Ok(ImagesReport {
            images: images.iter().map(|p| display(p)).collect(),
        })
    }

    /// Extracts Markdown into `<out_dir>/<input stem>.md`.
    pub fn convert_to_markdown(&self, input: &Path, out_dir: &Path) -> Result<MarkdownReport> {
        require_input(input)?;
        ensure_dir(out_dir)?;

        let source = match classify(input) {
            FileKind::OfficeLegacy => {
                let target = modern_counterpart(&extension(input));
                info!(
                    "converting legacy office document to {target}: {}",
                    input.display()
                );
                self.bridge(input, out_dir, target)?
            }
            FileKind::Markdown => {
                return Err(ConvertError::UnsupportedFileType {
                    ext: extension(input),
                });
            }
            _ => input.to_path_buf(),
        };

        info!("extracting markdown: {}", source.display());
        let text = self.engine.extract_markdown(&source)?;

        let target = out_dir.join(format!("{}.md", file_stem(input)));
        std::fs::write(&target, text).map_err(|e| ConvertError::io(&target, e))?;

        Ok(MarkdownReport {
            markdown_file: display(&target),
        })
    }

    /// Renders a Markdown source once per requested format.
    ///
    /// The first renderer failure aborts the remaining formats.
    pub fn render_markdown(
        &self,
        input: &Path,
        out_dir: &Path,
        opts: &RenderOptions,
    ) -> Result<FilesReport> {
        require_input(input)?;
        if classify(input) != FileKind::Markdown {
            return Err(ConvertError::NotMarkdown {
                path: input.to_path_buf(),
            });
        }
        if let Some(reference) = &opts.reference_doc {
            if !reference.exists() {
                return Err(ConvertError::ReferenceDocNotFound {
                    path: reference.clone(),
                });
            }
        }
        ensure_dir(out_dir)?;

        let formats = normalize_formats(&opts.formats, &self.cfg.render.default_formats);
        let stem = file_stem(input);
        let name = input
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut files = Vec::with_capacity(formats.len());
        for format in formats {
            let output = out_dir.join(format!("{stem}.{format}"));
            info!("rendering {name} -> {}", output.display());

            let req = RenderRequest {
                input: input.to_path_buf(),
                output: output.clone(),
                reference_doc: opts
                    .reference_doc
                    .clone()
                    .filter(|_| self.cfg.render.reference_doc_formats.contains(&format)),
                pdf_engine: opts.pdf_engine.clone().filter(|_| format == "pdf"),
                format: format.clone(),
            };
            self.engine.render_markup(&req)?;

            files.push(RenderedFile {
                format,
                path: display(&output),
            });
        }

        Ok(FilesReport { files })
    }

    /// Office conversion that only counts as done when the expected file exists.
    fn bridge(&self, input: &Path, out_dir: &Path, target_ext: &str) -> Result<PathBuf> {
        let expected = out_dir.join(format!("{}.{}", file_stem(input), target_ext));
        // A leftover from an earlier run must not pass for this run's output.
        match std::fs::remove_file(&expected) {
            Ok(()) => debug!("removed stale {}", expected.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ConvertError::io(&expected, e)),
        }
        self.engine.office_convert(input, out_dir, target_ext)?;
        if !expected.exists() {
            return Err(ConvertError::BridgeFailed { expected });
        }
        debug!("bridge output {}", expected.display());
        Ok(expected)
    }

    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let scratch = tempfile::Builder::new()
            .prefix(".docshift-pages-")
            .tempdir_in(out_dir)
            .map_err(|e| ConvertError::io(out_dir, e))?;

        let pages = self.engine.rasterize_pdf(pdf, scratch.path())?;
        if pages.is_empty() {
            return Err(ConvertError::NoPages {
                pdf: pdf.to_path_buf(),
            });
        }

        let mut placed = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            let target = out_dir.join(page_file_name(i + 1));
            if let Err(err) = place(page, &target) {
                warn!(
                    "page {} could not be saved; removing {} pages already written",
                    i + 1,
                    placed.len()
                );
                rollback(&placed);
                return Err(err);
            }
            placed.push(target);
        }
        Ok(placed)
    }
}

/// Lowercases and strips a leading dot; drops blanks and repeats.
pub fn normalize_formats(requested: &[String], defaults: &[String]) -> Vec<String> {
    let clean = |list: &[String]| {
        let mut out: Vec<String> = Vec::new();
        for raw in list {
            let f = raw.trim().trim_start_matches('.').to_ascii_lowercase();
            if !f.is_empty() && !out.contains(&f) {
                out.push(f);
            }
        }
        out
    };
    let formats = clean(requested);
    if formats.is_empty() {
        clean(defaults)
    } else {
        formats
    }
}

fn require_input(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(ConvertError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    Ok(())
}

/// Re-encodes a raster image as the single page `page_001.png`.
///
/// Only the first frame of animated or multi-page images is kept.
pub fn normalize_image(input: &Path, out_dir: &Path) -> Result<PathBuf> {
    let image_err = |source| ConvertError::Image {
        path: input.to_path_buf(),
        source,
    };
    let img = ImageReader::open(input)
        .map_err(|e| ConvertError::io(input, e))?
        .with_guessed_format()
        .map_err(|e| ConvertError::io(input, e))?
        .decode()
        .map_err(image_err)?;

    let target = out_dir.join(page_file_name(1));
    img.save_with_format(&target, ImageFormat::Png)
        .map_err(image_err)?;
    Ok(target)
}

fn place(page: &Path, target: &Path) -> Result<()> {
    if std::fs::rename(page, target).is_ok() {
        return Ok(());
    }
    std::fs::copy(page, target).map_err(|e| ConvertError::io(page, e))?;
    Ok(())
}

fn rollback(placed: &[PathBuf]) {
    for p in placed {
        let _ = std::fs::remove_file(p);
    }
}
