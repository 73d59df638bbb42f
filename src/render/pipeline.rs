//! Render Pipeline
//!
//! Buffer text → HTML fragment → templated document → display surface.
//! Rendering is pure and synchronous; delivery runs on its own task so the
//! caller never waits for the surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::render::converter::{CommonMarkConverter, MarkdownConverter};
use crate::render::surface::{AssetMapping, DisplaySurface, ReadyWait};
use crate::render::template::HtmlTemplate;

/// Full HTML document produced from the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSnapshot {
    html: String,
}

impl RenderSnapshot {
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

/// Converts text and wraps it in the fixed template
#[derive(Debug, Clone)]
pub struct Renderer<C = CommonMarkConverter> {
    converter: C,
    template: HtmlTemplate,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(CommonMarkConverter::new(), HtmlTemplate::default())
    }
}

impl<C: MarkdownConverter> Renderer<C> {
    pub fn new(converter: C, template: HtmlTemplate) -> Self {
        Self {
            converter,
            template,
        }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Render markdown text into a full document
    pub fn render(&self, text: &str) -> Result<RenderSnapshot> {
        let fragment = self
            .converter
            .convert(text)
            .context("Failed to convert markdown")?;

        Ok(RenderSnapshot {
            html: self.template.wrap(&fragment),
        })
    }
}

/// Outcome of delivering one document to the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReport {
    Delivered { generation: u64 },
    Failed { generation: u64, message: String },
}

struct RenderJob {
    generation: u64,
    html: String,
}

/// Newest generations the delivery task finished with, either way
#[derive(Debug, Default)]
struct DeliveryLedger {
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Fire-and-forget handle to the delivery task
///
/// Documents submitted before the surface is ready wait for it. When several
/// documents are pending at once, only the newest is loaded.
pub struct RenderQueue {
    jobs: mpsc::UnboundedSender<RenderJob>,
    reports: Option<mpsc::UnboundedReceiver<DeliveryReport>>,
    ledger: Arc<DeliveryLedger>,
    next_generation: u64,
}

impl RenderQueue {
    /// Start the delivery task for `surface`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: DisplaySurface>(
        surface: S,
        ready: ReadyWait,
        mapping: Option<AssetMapping>,
    ) -> Self {
        let (jobs, jobs_rx) = mpsc::unbounded_channel();
        let (reports_tx, reports) = mpsc::unbounded_channel();
        let ledger = Arc::new(DeliveryLedger::default());

        tokio::spawn(deliver(
            surface,
            ready,
            mapping,
            jobs_rx,
            reports_tx,
            Arc::clone(&ledger),
        ));

        Self {
            jobs,
            reports: Some(reports),
            ledger,
            next_generation: 1,
        }
    }

    /// Queue a document for display and return its generation number
    pub fn submit(&mut self, snapshot: &RenderSnapshot) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;

        let job = RenderJob {
            generation,
            html: snapshot.html.clone(),
        };
        if self.jobs.send(job).is_err() {
            log::warn!("Preview delivery task has stopped; render {generation} dropped");
        }
        generation
    }

    /// Newest generation shown by the surface, 0 before the first
    pub fn last_delivered(&self) -> u64 {
        self.ledger.delivered.load(Ordering::Acquire)
    }

    /// Whether `generation` was the newest document to fail delivery
    ///
    /// A later successful delivery clears the failure.
    pub fn has_failed(&self, generation: u64) -> bool {
        self.ledger.failed.load(Ordering::Acquire) == generation
            && self.last_delivered() < generation
    }

    /// Take the stream of delivery reports; only the first call gets it
    pub fn take_reports(&mut self) -> Option<mpsc::UnboundedReceiver<DeliveryReport>> {
        self.reports.take()
    }
}

async fn deliver<S: DisplaySurface>(
    mut surface: S,
    mut ready: ReadyWait,
    mapping: Option<AssetMapping>,
    mut jobs: mpsc::UnboundedReceiver<RenderJob>,
    reports: mpsc::UnboundedSender<DeliveryReport>,
    ledger: Arc<DeliveryLedger>,
) {
    if !ready.wait().await {
        log::warn!("Display surface went away before it was ready; no preview will be shown");
        return;
    }

    if let Some(mapping) = &mapping
        && let Err(e) = surface.map_virtual_host(mapping)
    {
        log::warn!(
            "Failed to map virtual host '{}' to {}: {:#}",
            mapping.host,
            mapping.folder.display(),
            e
        );
    }

    while let Some(mut job) = jobs.recv().await {
        while let Ok(newer) = jobs.try_recv() {
            log::debug!("Render {} superseded by {}", job.generation, newer.generation);
            job = newer;
        }

        let generation = job.generation;
        let report = match surface.load_document(job.html).await {
            Ok(()) => {
                ledger.delivered.fetch_max(generation, Ordering::AcqRel);
                DeliveryReport::Delivered { generation }
            }
            Err(e) => {
                // The previous document stays on screen
                log::warn!("Render {generation} was not displayed: {e:#}");
                ledger.failed.fetch_max(generation, Ordering::AcqRel);
                DeliveryReport::Failed {
                    generation,
                    message: format!("{e:#}"),
                }
            }
        };
        let _ = reports.send(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::{ChannelSurface, surface_ready};
    use anyhow::anyhow;
    use std::future::{self, Future};

    struct FailingSurface;

    impl DisplaySurface for FailingSurface {
        fn load_document(&mut self, _html: String) -> impl Future<Output = Result<()>> + Send {
            future::ready(Err(anyhow!("navigation failed")))
        }
    }

    fn snapshot(text: &str) -> RenderSnapshot {
        Renderer::default().render(text).unwrap()
    }

    #[test]
    fn test_render_embeds_fragment() {
        let snapshot = snapshot("# Title\nbody text");
        assert!(snapshot.html().contains("<h1>Title</h1>\n<p>body text</p>"));
        assert!(snapshot.html().starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_render_is_byte_identical() {
        let renderer = Renderer::default();
        let text = "# Title\n\n| a |\n|---|\n| 1 |\n\n![x](y.png)";
        assert_eq!(renderer.render(text).unwrap(), renderer.render(text).unwrap());
    }

    #[tokio::test]
    async fn test_documents_wait_for_ready() {
        let (surface, mut documents) = ChannelSurface::new();
        let (signal, ready) = surface_ready();
        let mut queue = RenderQueue::spawn(surface, ready, None);
        let mut reports = queue.take_reports().unwrap();

        let generation = queue.submit(&snapshot("early"));
        tokio::task::yield_now().await;
        assert!(documents.try_recv().is_err());

        signal.mark_ready();
        let html = documents.recv().await.unwrap();
        assert!(html.contains("<p>early</p>"));
        assert_eq!(
            reports.recv().await,
            Some(DeliveryReport::Delivered { generation })
        );
        assert_eq!(queue.last_delivered(), generation);
        assert!(!queue.has_failed(generation));
    }

    #[tokio::test]
    async fn test_pending_documents_coalesce_to_newest() {
        let (surface, mut documents) = ChannelSurface::new();
        let (signal, ready) = surface_ready();
        let mut queue = RenderQueue::spawn(surface, ready, None);
        let mut reports = queue.take_reports().unwrap();

        queue.submit(&snapshot("first"));
        queue.submit(&snapshot("second"));
        let last = queue.submit(&snapshot("third"));
        signal.mark_ready();

        let html = documents.recv().await.unwrap();
        assert!(html.contains("<p>third</p>"));
        assert_eq!(
            reports.recv().await,
            Some(DeliveryReport::Delivered { generation: last })
        );
        assert!(documents.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_delivery_is_reported() {
        let (signal, ready) = surface_ready();
        signal.mark_ready();
        let mut queue = RenderQueue::spawn(FailingSurface, ready, None);
        let mut reports = queue.take_reports().unwrap();

        let generation = queue.submit(&snapshot("text"));
        assert!(!queue.has_failed(generation));
        match reports.recv().await {
            Some(DeliveryReport::Failed {
                generation: failed,
                message,
            }) => {
                assert_eq!(failed, generation);
                assert!(message.contains("navigation failed"));
            }
            other => panic!("Expected failure report, got {other:?}"),
        }
        assert!(queue.has_failed(generation));
        assert_eq!(queue.last_delivered(), 0);
    }

    #[tokio::test]
    async fn test_reports_taken_once() {
        let (surface, _documents) = ChannelSurface::new();
        let (_signal, ready) = surface_ready();
        let mut queue = RenderQueue::spawn(surface, ready, None);
        assert!(queue.take_reports().is_some());
        assert!(queue.take_reports().is_none());
    }
}
