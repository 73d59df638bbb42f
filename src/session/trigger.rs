//! Typed triggers, controller status and dispatch outcomes.

use std::path::PathBuf;

use crate::session::error::EditorError;
use crate::zoom::{Pane, ZoomDirection};

/// Something the host asks the controller to handle
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// The editor content changed. `None` is a bare change notification
    /// without new content.
    TextChanged { content: Option<String> },
    /// Files were dropped onto the editor
    FilesDropped(Vec<PathBuf>),
    /// Wheel turned with the zoom modifier held
    Zoom { pane: Pane, direction: ZoomDirection },
    /// Save to the associated file
    Save,
    /// Save to a path picked by the host, and associate it
    SaveAs(PathBuf),
    /// Toggle simple-edit mode
    SetSimpleEdit(bool),
}

impl Trigger {
    /// Change notification without content, as echoed by the buffer
    pub fn echo() -> Self {
        Trigger::TextChanged { content: None }
    }
}

/// What the controller is doing while not idle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    ApplyingCues,
    Rendering,
    Zooming,
    Loading,
}

/// Re-entrancy guard of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Busy(Activity),
}

impl Status {
    pub fn is_idle(self) -> bool {
        self == Status::Idle
    }

    /// A programmatic edit is in progress: cue styling or a wholesale load
    pub fn programmatic_edit(self) -> bool {
        matches!(
            self,
            Status::Busy(Activity::ApplyingCues | Activity::Loading)
        )
    }

    pub fn zoom_in_progress(self) -> bool {
        self == Status::Busy(Activity::Zooming)
    }
}

/// Result of dispatching one trigger
#[derive(Debug)]
pub enum Outcome {
    /// Cues were applied and the preview rendered; `rendered` is false when
    /// the document matched the one already shown or pending
    Refreshed { rendered: bool },
    /// Cues were applied but the text could not be rendered. The previous
    /// preview stays.
    RenderFailed { message: String },
    /// Ignored by the re-entrancy guard
    Suppressed,
    Zoomed { pane: Pane, scale: f64 },
    ModeChanged { simple_edit: bool },
    Saved(PathBuf),
    /// Nothing to do, such as saving with no file associated
    Ignored,
    Failed(EditorError),
}

impl Outcome {
    pub fn error(&self) -> Option<&EditorError> {
        match self {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}
