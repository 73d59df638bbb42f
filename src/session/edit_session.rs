//! Edit Session
//!
//! The one persistent editing session: file association, mode and scale.

use std::path::{Path, PathBuf};

use crate::config::Config;

/// State of the single editing session
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    file: Option<PathBuf>,
    edit_folder: PathBuf,
    dirty: bool,
    simple_edit: bool,
    font_scale: f64,
    preview_scale: f64,
}

impl EditSession {
    pub fn new(
        edit_folder: PathBuf,
        simple_edit: bool,
        font_scale: f64,
        preview_scale: f64,
    ) -> Self {
        Self {
            file: None,
            edit_folder,
            dirty: false,
            simple_edit,
            font_scale,
            preview_scale,
        }
    }

    /// Start a session with the configured defaults and no file
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.edit_folder.clone(),
            config.simple_edit,
            config.editor_zoom.initial,
            config.preview_zoom.initial,
        )
    }

    /// File the buffer is associated with, if any
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Folder used as the starting point for file operations
    pub fn edit_folder(&self) -> &Path {
        &self.edit_folder
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn simple_edit(&self) -> bool {
        self.simple_edit
    }

    /// Editor font size
    pub fn font_scale(&self) -> f64 {
        self.font_scale
    }

    /// Preview font size
    pub fn preview_scale(&self) -> f64 {
        self.preview_scale
    }

    /// Resolve a host-supplied path; relative paths are taken from the edit folder
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.edit_folder.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Line height for the current editor font size
    pub fn line_height(&self, multiplier: f64) -> f64 {
        self.font_scale * multiplier
    }

    /// Associate the buffer with a file and follow its folder
    pub(crate) fn associate(&mut self, path: PathBuf) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.edit_folder = parent.to_path_buf();
        }
        self.file = Some(path);
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub(crate) fn set_simple_edit(&mut self, simple_edit: bool) {
        self.simple_edit = simple_edit;
    }

    pub(crate) fn set_font_scale(&mut self, scale: f64) {
        self.font_scale = scale;
    }

    pub(crate) fn set_preview_scale(&mut self, scale: f64) {
        self.preview_scale = scale;
    }
}
