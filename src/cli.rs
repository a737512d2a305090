use crate::{
    config::Config,
    engine::{Engine, external::ExternalEngine},
    pipeline::{Dispatcher, RenderOptions},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_CONFIG: &str = "docshift.toml";

#[derive(Parser, Debug)]
#[command(name = "docshift")]
#[command(about = "Convert documents to page images, Markdown, or Pandoc deliverables")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./docshift.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report which external tools are available.
    Doctor {},
    /// Convert a document (PDF, Office, image) to a series of PNG pages.
    Convert {
        input_path: PathBuf,
        /// Directory to save output images.
        #[arg(long, short = 'o')]
        output_dir: PathBuf,
    },
    /// Convert a document to Markdown.
    ConvertToMarkdown {
        input_path: PathBuf,
        /// Directory to save output markdown.
        #[arg(long, short = 'o')]
        output_dir: PathBuf,
    },
    /// Render Markdown into Office/PDF deliverables with Pandoc.
    ConvertMarkdown {
        input_path: PathBuf,
        /// Directory for generated files.
        #[arg(long, short = 'o')]
        output_dir: PathBuf,
        /// Pandoc output format. Repeat to request several (default: docx, pdf).
        #[arg(long = "format", short = 'f')]
        formats: Vec<String>,
        /// Pandoc reference document for Office outputs.
        #[arg(long)]
        reference_doc: Option<PathBuf>,
        /// Pandoc PDF engine (e.g. xelatex).
        #[arg(long)]
        pdf_engine: Option<String>,
    },
}

/// Runs one command. Failures after logging is up are reported through
/// `tracing` and turned into `ExitCode::FAILURE`; earlier ones are returned.
pub fn dispatch(args: Args) -> Result<ExitCode> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = Config::load_or_default(cfg_path.as_deref())?;
    let _guard = init_logging(&args, &cfg)?;

    match execute(&cfg, args.cmd) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            error!("{:#}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn execute(cfg: &Config, cmd: Command) -> Result<()> {
    let dispatcher = Dispatcher::new(cfg, ExternalEngine::new(cfg));

    match cmd {
        Command::Doctor {} => emit_pretty(&dispatcher.engine().doctor()),
        Command::Convert {
            input_path,
            output_dir,
        } => {
            let report = dispatcher
                .convert_to_images(&input_path, &output_dir)
                .with_context(|| format!("converting {} to images", input_path.display()))?;
            emit(&report)
        }
        Command::ConvertToMarkdown {
            input_path,
            output_dir,
        } => {
            let report = dispatcher
                .convert_to_markdown(&input_path, &output_dir)
                .with_context(|| format!("converting {} to markdown", input_path.display()))?;
            emit(&report)
        }
        Command::ConvertMarkdown {
            input_path,
            output_dir,
            formats,
            reference_doc,
            pdf_engine,
        } => {
            let opts = RenderOptions {
                formats,
                reference_doc,
                pdf_engine,
            };
            let report = dispatcher
                .render_markdown(&input_path, &output_dir, &opts)
                .with_context(|| format!("rendering {}", input_path.display()))?;
            emit(&report)
        }
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn emit_pretty<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Explicit path, else `./docshift.toml` when present, else built-in defaults.
pub fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from(DEFAULT_CONFIG);
    default.exists().then_some(default)
}

// stdout carries the JSON result, so every log layer writes elsewhere.
fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = match resolve_log_path(cfg) {
        Some(path) => {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            crate::util::ensure_dir(parent)?;
            let file = std::fs::File::create(&path)
                .with_context(|| format!("create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from("docshift.log"));
    }
    Some(PathBuf::from(&cfg.logging.file_path))
}
