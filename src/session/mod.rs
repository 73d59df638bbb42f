//! Edit Session and Controller
//!
//! Session state, typed host triggers, file access and the state machine
//! that keeps the editor and the preview in step.

pub mod controller;
pub mod edit_session;
pub mod error;
pub mod files;
pub mod trigger;

pub use controller::{DEFAULT_MARKDOWN_EXTENSION, DispatchStats, EditController};
pub use edit_session::EditSession;
pub use error::{DropRejection, EditorError, NoticeSeverity};
pub use trigger::{Activity, Outcome, Status, Trigger};
