//! Preview Rendering
//!
//! Markdown conversion, the fixed document template, and asynchronous
//! delivery of full documents to the display surface.

pub mod converter;
pub mod pipeline;
pub mod surface;
pub mod template;

pub use converter::{CommonMarkConverter, MarkdownConverter};
pub use pipeline::{DeliveryReport, RenderQueue, RenderSnapshot, Renderer};
pub use surface::{
    AssetMapping, ChannelSurface, DisplaySurface, ReadySignal, ReadyWait, surface_ready,
};
pub use template::{DEFAULT_VIRTUAL_HOST, HtmlTemplate};
