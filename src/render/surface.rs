//! Display Surface Contract
//!
//! The preview widget is an external collaborator: it becomes ready once,
//! asynchronously, and then accepts whole documents.

use std::future::{self, Future};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tokio::sync::{mpsc, watch};

/// Local folder served to the preview under a virtual host name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMapping {
    pub host: String,
    pub folder: PathBuf,
}

/// A render target that shows full HTML documents
pub trait DisplaySurface: Send + 'static {
    /// Serve `mapping.folder` under `mapping.host`
    fn map_virtual_host(&mut self, mapping: &AssetMapping) -> Result<()> {
        let _ = mapping;
        Ok(())
    }

    /// Replace the displayed document; resolves once navigation completes
    fn load_document(&mut self, html: String) -> impl Future<Output = Result<()>> + Send;
}

/// Host side of the readiness signal
#[derive(Debug)]
pub struct ReadySignal(watch::Sender<bool>);

impl ReadySignal {
    /// Mark the surface as initialised
    pub fn mark_ready(&self) {
        self.0.send_replace(true);
    }
}

/// Render side of the readiness signal
#[derive(Debug, Clone)]
pub struct ReadyWait(watch::Receiver<bool>);

impl ReadyWait {
    pub fn is_ready(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait until the surface is ready
    ///
    /// Returns false if the signal was dropped without ever becoming ready.
    pub async fn wait(&mut self) -> bool {
        self.0.wait_for(|ready| *ready).await.is_ok()
    }
}

/// Create a readiness signal pair, initially not ready
pub fn surface_ready() -> (ReadySignal, ReadyWait) {
    let (tx, rx) = watch::channel(false);
    (ReadySignal(tx), ReadyWait(rx))
}

/// Surface that forwards every document into a channel
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    documents: mpsc::UnboundedSender<String>,
    mapping: Option<AssetMapping>,
}

impl ChannelSurface {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (documents, rx) = mpsc::unbounded_channel();
        (
            Self {
                documents,
                mapping: None,
            },
            rx,
        )
    }

    /// Mapping installed by the render queue, if any
    pub fn mapping(&self) -> Option<&AssetMapping> {
        self.mapping.as_ref()
    }
}

impl DisplaySurface for ChannelSurface {
    fn map_virtual_host(&mut self, mapping: &AssetMapping) -> Result<()> {
        self.mapping = Some(mapping.clone());
        Ok(())
    }

    fn load_document(&mut self, html: String) -> impl Future<Output = Result<()>> + Send {
        let result = self
            .documents
            .send(html)
            .map_err(|_| anyhow!("preview receiver closed"));
        future::ready(result)
    }
}
