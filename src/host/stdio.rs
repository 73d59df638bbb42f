//! JSON-lines host adapter.
//!
//! Translates raw UI events read one JSON object per line into typed
//! triggers, and reports outcomes, notices and preview documents back as
//! JSON lines.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::host::preview_controller;
use crate::render::{ChannelSurface, DeliveryReport, MarkdownConverter, surface_ready};
use crate::session::{EditController, EditSession, NoticeSeverity, Outcome, Trigger};
use crate::zoom::{Pane, ZoomDirection};

/// Raw event from the host window
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    TextChanged {
        content: String,
    },
    FilesDropped {
        paths: Vec<PathBuf>,
    },
    Wheel {
        pane: Pane,
        delta: i32,
        #[serde(default)]
        ctrl: bool,
    },
    Save,
    SaveAs {
        path: PathBuf,
    },
    SimpleEdit {
        enabled: bool,
    },
}

impl HostEvent {
    /// Typed trigger for this event, if it is one the controller handles
    ///
    /// Wheel events only zoom with the control modifier held; plain
    /// scrolling belongs to the host.
    pub fn into_trigger(self) -> Option<Trigger> {
        match self {
            HostEvent::TextChanged { content } => Some(Trigger::TextChanged {
                content: Some(content),
            }),
            HostEvent::FilesDropped { paths } => Some(Trigger::FilesDropped(paths)),
            HostEvent::Wheel { pane, delta, ctrl } => {
                if !ctrl {
                    return None;
                }
                ZoomDirection::from_wheel_delta(delta)
                    .map(|direction| Trigger::Zoom { pane, direction })
            }
            HostEvent::Save => Some(Trigger::Save),
            HostEvent::SaveAs { path } => Some(Trigger::SaveAs(path)),
            HostEvent::SimpleEdit { enabled } => Some(Trigger::SetSimpleEdit(enabled)),
        }
    }
}

/// Message written back to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostMessage {
    Outcome {
        result: &'static str,
        dirty: bool,
        file: Option<PathBuf>,
        edit_folder: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        scale: Option<f64>,
    },
    Notice {
        severity: &'static str,
        message: String,
    },
    Document {
        html: String,
    },
    Error {
        message: String,
    },
}

impl HostMessage {
    /// Messages describing a dispatch outcome
    pub fn from_outcome(outcome: &Outcome, session: &EditSession) -> Vec<HostMessage> {
        let mut scale = None;
        let result = match outcome {
            Outcome::Refreshed { rendered: true } => "refreshed",
            Outcome::Refreshed { rendered: false } => "unchanged",
            Outcome::RenderFailed { .. } => "render_failed",
            Outcome::Suppressed => "suppressed",
            Outcome::Zoomed { scale: s, .. } => {
                scale = Some(*s);
                "zoomed"
            }
            Outcome::ModeChanged { simple_edit: true } => "simple_edit_on",
            Outcome::ModeChanged { simple_edit: false } => "simple_edit_off",
            Outcome::Saved(_) => "saved",
            Outcome::Ignored => "ignored",
            Outcome::Failed(_) => "failed",
        };

        let mut messages = Vec::with_capacity(2);
        match outcome {
            Outcome::Failed(e) => messages.push(HostMessage::Notice {
                severity: severity_name(e.severity()),
                message: e.to_string(),
            }),
            Outcome::RenderFailed { message } => messages.push(HostMessage::Notice {
                severity: severity_name(NoticeSeverity::Transient),
                message: format!("preview not updated: {message}"),
            }),
            _ => {}
        }
        messages.push(HostMessage::Outcome {
            result,
            dirty: session.is_dirty(),
            file: session.file().map(PathBuf::from),
            edit_folder: session.edit_folder().to_path_buf(),
            scale,
        });
        messages
    }

    /// Notice for a document the surface failed to show, if any
    pub fn from_report(report: DeliveryReport) -> Option<HostMessage> {
        match report {
            DeliveryReport::Delivered { generation } => {
                log::trace!("Preview {} delivered", generation);
                None
            }
            DeliveryReport::Failed { message, .. } => Some(HostMessage::Notice {
                severity: severity_name(NoticeSeverity::Transient),
                message: format!("preview not updated: {message}"),
            }),
        }
    }
}

fn severity_name(severity: NoticeSeverity) -> &'static str {
    match severity {
        NoticeSeverity::Transient => "transient",
        NoticeSeverity::Modal => "modal",
    }
}

/// Handle one input line and return the messages it produces
pub fn handle_line<C: MarkdownConverter>(
    controller: &mut EditController<C>,
    line: &str,
) -> Vec<HostMessage> {
    let event: HostEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(e) => {
            log::warn!("Invalid host event: {}", e);
            return vec![HostMessage::Error {
                message: format!("invalid event: {e}"),
            }];
        }
    };

    let outcome = match event.into_trigger() {
        Some(trigger) => controller.dispatch(trigger),
        None => Outcome::Ignored,
    };
    HostMessage::from_outcome(&outcome, controller.session())
}

/// Run an editing session over a line reader and a writer
///
/// Returns the writer once input is exhausted and every pending preview has
/// been written.
pub async fn run_session<R, W>(config: &Config, reader: R, writer: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (surface, documents) = ChannelSurface::new();
    let (signal, ready) = surface_ready();
    let controller = preview_controller(config, surface, ready);
    signal.mark_ready();

    drive_session(controller, documents, reader, writer).await
}

/// Run an editing session with an already built controller
///
/// `documents` carries the HTML the controller's surface receives; each one
/// is written out as a `document` message. Delivery failures become notices.
pub async fn drive_session<C, R, W>(
    mut controller: EditController<C>,
    mut documents: mpsc::UnboundedReceiver<String>,
    reader: R,
    writer: W,
) -> Result<W>
where
    C: MarkdownConverter,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (messages, messages_rx) = mpsc::unbounded_channel();
    let output = tokio::spawn(write_messages(messages_rx, writer));

    let document_messages = messages.clone();
    tokio::spawn(async move {
        while let Some(html) = documents.recv().await {
            if document_messages.send(HostMessage::Document { html }).is_err() {
                break;
            }
        }
    });

    if let Some(mut reports) = controller.queue_mut().take_reports() {
        let report_messages = messages.clone();
        tokio::spawn(async move {
            while let Some(report) = reports.recv().await {
                if let Some(message) = HostMessage::from_report(report)
                    && report_messages.send(message).is_err()
                {
                    break;
                }
            }
        });
    }

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read host event")? {
        if line.trim().is_empty() {
            continue;
        }
        for message in handle_line(&mut controller, &line) {
            let _ = messages.send(message);
        }
    }

    // Closing the render queue lets pending documents drain before output ends
    drop(controller);
    drop(messages);
    output.await.context("Output task failed")?
}

/// Serve the editor over standard input and output
pub async fn serve(config: &Config) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_session(config, stdin, tokio::io::stdout()).await?;
    Ok(())
}

async fn write_messages<W: AsyncWrite + Unpin>(
    mut rx: mpsc::UnboundedReceiver<HostMessage>,
    mut writer: W,
) -> Result<W> {
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_string(&message).context("Failed to encode message")?;
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("Failed to write message")?;
        writer.flush().await.context("Failed to flush output")?;
    }
    Ok(writer)
}
