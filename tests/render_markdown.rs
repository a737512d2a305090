mod common;

use common::ScriptedEngine;
use docshift::{
    ConvertError,
    config::Config,
    pipeline::{Dispatcher, RenderOptions, normalize_formats},
};

fn source(dir: &std::path::Path) -> std::path::PathBuf {
    let input = dir.join("handbook.md");
    std::fs::write(&input, "# Handbook\n").unwrap();
    input
}

#[test]
fn default_formats_produce_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = source(dir.path());
    let out = dir.path().join("dist");

    let d = Dispatcher::new(&Config::default(), ScriptedEngine::new());
    let report = d
        .render_markdown(&input, &out, &RenderOptions::default())
        .unwrap();

    let formats: Vec<_> = report.files.iter().map(|f| f.format.as_str()).collect();
    assert_eq!(formats, ["docx", "pdf"]);
    assert_eq!(
        report.files[0].path,
        out.join("handbook.docx").display().to_string()
    );
    assert!(out.join("handbook.docx").exists());
    assert!(out.join("handbook.pdf").exists());
}

#[test]
fn flags_are_applied_only_to_matching_formats() {
    let dir = tempfile::tempdir().unwrap();
    let input = source(dir.path());
    let reference = dir.path().join("style.docx");
    std::fs::write(&reference, b"ref").unwrap();

    let d = Dispatcher::new(&Config::default(), ScriptedEngine::new());
    let opts = RenderOptions {
        formats: vec![".DOCX".into(), "pdf".into(), "html".into()],
        reference_doc: Some(reference.clone()),
        pdf_engine: Some("xelatex".into()),
    };
    d.render_markdown(&input, &dir.path().join("dist"), &opts)
        .unwrap();

    let renders = d.engine().renders.borrow();
    assert_eq!(renders.len(), 3);
    assert_eq!(renders[0].format, "docx");
    assert_eq!(renders[0].reference_doc.as_ref(), Some(&reference));
    assert_eq!(renders[0].pdf_engine, None);
    assert_eq!(renders[1].format, "pdf");
    assert_eq!(renders[1].reference_doc, None);
    assert_eq!(renders[1].pdf_engine.as_deref(), Some("xelatex"));
    assert_eq!(renders[2].format, "html");
    assert_eq!(renders[2].reference_doc, None);
    assert_eq!(renders[2].pdf_engine, None);
}

#[test]
fn first_failure_aborts_remaining_formats() {
    let dir = tempfile::tempdir().unwrap();
    let input = source(dir.path());
    let out = dir.path().join("dist");

    let mut engine = ScriptedEngine::new();
    engine.fail_format = Some("docx".into());
    let d = Dispatcher::new(&Config::default(), engine);
    let err = d
        .render_markdown(&input, &out, &RenderOptions::default())
        .unwrap_err();

    assert!(matches!(err, ConvertError::ToolFailed { .. }), "{err}");
    assert!(err.to_string().contains("pandoc exploded"));
    assert_eq!(d.engine().renders.borrow().len(), 1);
    assert!(!out.join("handbook.pdf").exists());
}

#[test]
fn non_markdown_source_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("handbook.docx");
    std::fs::write(&input, b"docx").unwrap();

    let err = Dispatcher::new(&Config::default(), ScriptedEngine::new())
        .render_markdown(&input, dir.path(), &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, ConvertError::NotMarkdown { .. }), "{err}");
}

#[test]
fn missing_reference_doc_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = source(dir.path());
    let opts = RenderOptions {
        reference_doc: Some(dir.path().join("absent.docx")),
        ..Default::default()
    };

    let d = Dispatcher::new(&Config::default(), ScriptedEngine::new());
    let err = d.render_markdown(&input, dir.path(), &opts).unwrap_err();
    assert!(matches!(err, ConvertError::ReferenceDocNotFound { .. }), "{err}");
    assert!(d.engine().renders.borrow().is_empty());
}

#[test]
fn missing_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ghost.md");
    let err = Dispatcher::new(&Config::default(), ScriptedEngine::new())
        .render_markdown(&input, dir.path(), &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, ConvertError::InputNotFound { .. }));
    assert!(err.to_string().contains("ghost.md"));
}

#[test]
fn configured_defaults_are_used() {
    let dir = tempfile::tempdir().unwrap();
    let input = source(dir.path());
    let mut cfg = Config::default();
    cfg.render.default_formats = vec!["odt".into()];

    let report = Dispatcher::new(&cfg, ScriptedEngine::new())
        .render_markdown(&input, &dir.path().join("dist"), &RenderOptions::default())
        .unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].format, "odt");
}

#[test]
fn formats_fall_back_to_defaults() {
    let defaults = vec!["docx".to_string(), "pdf".to_string()];
    assert_eq!(normalize_formats(&[], &defaults), defaults);
    assert_eq!(
        normalize_formats(&[" ".to_string(), ".".to_string()], &defaults),
        defaults
    );
}

#[test]
fn formats_are_normalized_and_deduplicated() {
    let requested: Vec<String> = [".DOCX", "pdf", "docx", "Html"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        normalize_formats(&requested, &[]),
        ["docx", "pdf", "html"]
    );
}
