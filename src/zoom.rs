//! Zoom control for the editor and preview panes.
//!
//! Scales move in fixed steps and are clamped to per-pane bounds. Editor zoom
//! reapplies the line height of every block; it is a presentation change only
//! and never touches cues or the rendered preview.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::document::DocumentBuffer;
use crate::session::EditSession;

/// Line height as a multiple of the font size
pub const DEFAULT_LINE_HEIGHT_MULTIPLIER: f64 = 1.5;

/// Pane being scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    Editor,
    Preview,
}

/// Direction of a zoom step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    Increase,
    Decrease,
}

impl ZoomDirection {
    /// Map a wheel delta to a direction; zero is no zoom
    pub fn from_wheel_delta(delta: i32) -> Option<Self> {
        match delta.signum() {
            1 => Some(ZoomDirection::Increase),
            -1 => Some(ZoomDirection::Decrease),
            _ => None,
        }
    }
}

/// Allowed scale range and step size of a pane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ZoomBounds {
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self> {
        let bounds = Self { min, max, step };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Editor pane defaults: 10 to 60 in steps of 2
    pub fn editor() -> Self {
        Self {
            min: 10.0,
            max: 60.0,
            step: 2.0,
        }
    }

    /// Preview pane defaults: 6 to 48 in steps of 2
    pub fn preview() -> Self {
        Self {
            min: 6.0,
            max: 48.0,
            step: 2.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite() && self.step.is_finite()) {
            bail!("zoom bounds must be finite numbers");
        }
        if self.min > self.max {
            bail!("zoom minimum {} exceeds maximum {}", self.min, self.max);
        }
        if self.step <= 0.0 {
            bail!("zoom step must be positive, got {}", self.step);
        }
        Ok(())
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

/// Applies zoom steps to the session and buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomController {
    editor: ZoomBounds,
    preview: ZoomBounds,
    line_height_multiplier: f64,
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(
            ZoomBounds::editor(),
            ZoomBounds::preview(),
            DEFAULT_LINE_HEIGHT_MULTIPLIER,
        )
    }
}

impl ZoomController {
    pub fn new(editor: ZoomBounds, preview: ZoomBounds, line_height_multiplier: f64) -> Self {
        Self {
            editor,
            preview,
            line_height_multiplier,
        }
    }

    pub fn bounds(&self, pane: Pane) -> ZoomBounds {
        match pane {
            Pane::Editor => self.editor,
            Pane::Preview => self.preview,
        }
    }

    pub fn line_height_multiplier(&self) -> f64 {
        self.line_height_multiplier
    }

    /// Scale after one step from `current`, clamped to the pane bounds
    pub fn next_scale(&self, pane: Pane, current: f64, direction: ZoomDirection) -> f64 {
        let bounds = self.bounds(pane);
        let next = match direction {
            ZoomDirection::Increase => current + bounds.step,
            ZoomDirection::Decrease => current - bounds.step,
        };
        bounds.clamp(next)
    }

    /// Apply one zoom step and return the new scale
    ///
    /// Editor zoom recomputes the line height of every block from the new
    /// font size. Preview zoom only records the new scale.
    pub fn apply(
        &self,
        session: &mut EditSession,
        buffer: &mut DocumentBuffer,
        pane: Pane,
        direction: ZoomDirection,
    ) -> f64 {
        match pane {
            Pane::Editor => {
                let scale = self.next_scale(pane, session.font_scale(), direction);
                session.set_font_scale(scale);
                buffer.set_line_height(session.line_height(self.line_height_multiplier));
                scale
            }
            Pane::Preview => {
                let scale = self.next_scale(pane, session.preview_scale(), direction);
                session.set_preview_scale(scale);
                scale
            }
        }
    }
}
