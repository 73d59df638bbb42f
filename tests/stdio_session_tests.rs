//! JSON-lines sessions driven through an in-memory reader and writer
use std::fs;
use std::future::{self, Future};
use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use md_live_preview::host::stdio::{drive_session, run_session};
use md_live_preview::render::{ChannelSurface, HtmlTemplate, surface_ready};
use md_live_preview::{
    Config, DisplaySurface, EditController, EditSession, MarkdownConverter, RenderQueue, Renderer,
    ZoomController,
};
use serde_json::Value;
use tempfile::tempdir;
use tokio::sync::mpsc;

struct BrokenConverter;

impl MarkdownConverter for BrokenConverter {
    fn convert(&self, _markdown: &str) -> Result<String> {
        bail!("converter exploded")
    }
}

struct BrokenSurface;

impl DisplaySurface for BrokenSurface {
    fn load_document(&mut self, _html: String) -> impl Future<Output = Result<()>> + Send {
        future::ready(Err(anyhow!("navigation failed")))
    }
}

fn parse_output(output: Vec<u8>) -> Vec<Value> {
    String::from_utf8(output)
        .expect("utf-8 output")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json line"))
        .collect()
}

fn test_config(folder: &std::path::Path) -> Config {
    Config {
        edit_folder: folder.to_path_buf(),
        ..Config::default()
    }
}

async fn run(config: &Config, input: &str) -> Vec<Value> {
    let output = run_session(config, input.as_bytes(), Vec::new())
        .await
        .expect("session runs");
    parse_output(output)
}

fn notices(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .filter(|m| m["kind"] == "notice")
        .map(|m| m["message"].as_str().unwrap())
        .collect()
}

fn outcomes(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .filter(|m| m["kind"] == "outcome")
        .map(|m| m["result"].as_str().unwrap())
        .collect()
}

fn documents(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .filter(|m| m["kind"] == "document")
        .map(|m| m["html"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_typing_produces_preview_document() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let messages = run(
        &config,
        "{\"event\":\"text_changed\",\"content\":\"# Title\\nbody text\"}\n",
    )
    .await;

    assert_eq!(outcomes(&messages), vec!["refreshed"]);
    let docs = documents(&messages);
    assert_eq!(docs.len(), 1);
    assert!(docs[0].contains("<h1>Title</h1>"));
    assert!(docs[0].contains("<p>body text</p>"));
}

#[tokio::test]
async fn test_session_round_trip_with_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let source = dir.path().join("draft.md");
    let copy = dir.path().join("copy.md");
    fs::write(&source, "# Draft").unwrap();

    let input = format!(
        concat!(
            "{{\"event\":\"files_dropped\",\"paths\":[{source:?}]}}\n",
            "{{\"event\":\"wheel\",\"pane\":\"editor\",\"delta\":120,\"ctrl\":true}}\n",
            "{{\"event\":\"wheel\",\"pane\":\"editor\",\"delta\":120}}\n",
            "{{\"event\":\"text_changed\",\"content\":\"# Draft\\nmore\"}}\n",
            "{{\"event\":\"save_as\",\"path\":{copy:?}}}\n",
            "{{\"event\":\"simple_edit\",\"enabled\":true}}\n",
        ),
        source = source.to_str().unwrap(),
        copy = copy.to_str().unwrap(),
    );

    let messages = run(&config, &input).await;

    assert_eq!(
        outcomes(&messages),
        vec![
            "refreshed",
            "zoomed",
            "ignored",
            "refreshed",
            "saved",
            "simple_edit_on"
        ]
    );
    let zoomed = messages
        .iter()
        .find(|m| m["result"] == "zoomed")
        .unwrap();
    assert_eq!(zoomed["scale"], 16.0);

    let saved = messages.iter().find(|m| m["result"] == "saved").unwrap();
    assert_eq!(saved["dirty"], false);
    assert_eq!(saved["file"].as_str(), copy.to_str());
    assert_eq!(saved["edit_folder"].as_str(), dir.path().to_str());
    assert_eq!(fs::read_to_string(&copy).unwrap(), "# Draft\nmore");
    assert_eq!(fs::read_to_string(&source).unwrap(), "# Draft");
}

#[tokio::test]
async fn test_rejected_drop_reports_notice() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let messages = run(
        &config,
        "{\"event\":\"files_dropped\",\"paths\":[\"a.md\",\"b.md\"]}\n",
    )
    .await;

    assert_eq!(messages[0]["kind"], "notice");
    assert_eq!(messages[0]["severity"], "transient");
    assert_eq!(messages[1]["result"], "failed");
    assert!(documents(&messages).is_empty());
}

#[tokio::test]
async fn test_malformed_line_reports_error_and_continues() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let messages = run(
        &config,
        "not json\n\n{\"event\":\"save\"}\n",
    )
    .await;

    assert_eq!(messages[0]["kind"], "error");
    assert_eq!(outcomes(&messages), vec!["ignored"]);
}

#[tokio::test]
async fn test_relative_save_as_lands_in_edit_folder() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let messages = run(
        &config,
        concat!(
            "{\"event\":\"text_changed\",\"content\":\"# Draft\"}\n",
            "{\"event\":\"save_as\",\"path\":\"draft.md\"}\n",
        ),
    )
    .await;

    assert_eq!(outcomes(&messages), vec!["refreshed", "saved"]);
    let saved = dir.path().join("draft.md");
    assert_eq!(fs::read_to_string(&saved).unwrap(), "# Draft");
}

#[tokio::test]
async fn test_render_failure_is_reported_to_host() {
    let (surface, shown) = ChannelSurface::new();
    let (signal, ready) = surface_ready();
    signal.mark_ready();
    let controller = EditController::new(
        EditSession::new(PathBuf::from("."), false, 14.0, 16.0),
        ZoomController::default(),
        Renderer::new(BrokenConverter, HtmlTemplate::default()),
        RenderQueue::spawn(surface, ready, None),
    );

    let input = "{\"event\":\"text_changed\",\"content\":\"# Title\"}\n";
    let output = drive_session(controller, shown, input.as_bytes(), Vec::new())
        .await
        .expect("session runs");
    let messages = parse_output(output);

    assert_eq!(outcomes(&messages), vec!["render_failed"]);
    let notices = notices(&messages);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("converter exploded"));
    assert!(documents(&messages).is_empty());
}

#[tokio::test]
async fn test_delivery_failure_is_reported_to_host() {
    let (signal, ready) = surface_ready();
    signal.mark_ready();
    let controller = EditController::new(
        EditSession::new(PathBuf::from("."), false, 14.0, 16.0),
        ZoomController::default(),
        Renderer::default(),
        RenderQueue::spawn(BrokenSurface, ready, None),
    );
    // The broken surface never produces documents
    let (_, shown) = mpsc::unbounded_channel();

    let input = concat!(
        "{\"event\":\"text_changed\",\"content\":\"# Title\"}\n",
        "{\"event\":\"text_changed\",\"content\":\"# Title\"}\n",
    );
    let output = drive_session(controller, shown, input.as_bytes(), Vec::new())
        .await
        .expect("session runs");
    let messages = parse_output(output);

    assert_eq!(outcomes(&messages)[0], "refreshed");
    let notices = notices(&messages);
    assert!(!notices.is_empty());
    assert!(
        notices
            .iter()
            .all(|n| n.starts_with("preview not updated") && n.contains("navigation failed"))
    );
}
