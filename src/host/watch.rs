//! File watching for live reload of the previewed file.
//!
//! The parent directory is watched rather than the file itself, since many
//! editors save by writing a new file and renaming it over the old one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Bursts of events closer together than this count as one change
const SETTLE_TIME: Duration = Duration::from_millis(50);

/// Events from the file watcher
#[derive(Debug)]
pub enum WatchEvent {
    Changed,
    Error(notify::Error),
}

/// Watches one markdown file for modifications
pub struct MarkdownWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<WatchEvent>,
}

/// Start watching `path`
pub fn watch_markdown(path: &Path) -> Result<MarkdownWatcher> {
    let path = std::fs::canonicalize(path)
        .with_context(|| format!("Cannot watch {}", path.display()))?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .context("Watched file has no parent directory")?;
    let name = path.file_name().map(|n| n.to_os_string());

    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if let EventKind::Create(_) | EventKind::Modify(_) = event.kind
                    && event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == name)
                {
                    let _ = tx.send(WatchEvent::Changed);
                }
            }
            Err(e) => {
                let _ = tx.send(WatchEvent::Error(e));
            }
        },
        Config::default(),
    )?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    log::info!("Watching {}", path.display());
    Ok(MarkdownWatcher {
        path,
        _watcher: watcher,
        rx,
    })
}

impl MarkdownWatcher {
    /// Canonical path of the watched file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next change, folding bursts of events into one
    pub async fn next(&mut self) -> Option<WatchEvent> {
        let event = self.rx.recv().await?;
        if matches!(event, WatchEvent::Changed) {
            tokio::time::sleep(SETTLE_TIME).await;
            loop {
                match self.rx.try_recv() {
                    Ok(WatchEvent::Changed) => continue,
                    Ok(WatchEvent::Error(e)) => log::warn!("File watcher error: {}", e),
                    Err(_) => break,
                }
            }
        }
        Some(event)
    }
}
