//! Markdown Live Preview
//!
//! The synchronization engine behind a two-pane markdown editor: an editable
//! text surface on one side, a rendered HTML preview on the other.
//!
//! This library provides:
//! - Line classification and syntax cue styling of the editor buffer
//! - Markdown rendering into a fixed, styled HTML document
//! - Bounded, per-pane zoom
//! - The edit-state controller sequencing all of the above
//! - Headless hosts (file output, file watching, JSON-lines over stdio)

pub mod config;
pub mod document;
pub mod host;
pub mod render;
pub mod session;
pub mod syntax;
pub mod zoom;

// Re-exports for clean public API
pub use config::Config;
pub use document::{Block, BlockStyle, DocumentBuffer};
pub use render::{DisplaySurface, MarkdownConverter, RenderQueue, Renderer};
pub use session::{EditController, EditSession, EditorError, Outcome, Trigger};
pub use syntax::{CueCategory, classify_line};
pub use zoom::{Pane, ZoomBounds, ZoomController, ZoomDirection};
