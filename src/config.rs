//! Configuration management for the live preview.
//!
//! Handles:
//! - Command-line argument parsing
//! - Optional TOML configuration file (explicit, project, then user-global)
//! - Zoom bounds per pane and preview asset mapping

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::render::{AssetMapping, DEFAULT_VIRTUAL_HOST};
use crate::session::DEFAULT_MARKDOWN_EXTENSION;
use crate::zoom::{DEFAULT_LINE_HEIGHT_MULTIPLIER, ZoomBounds};

/// Project-level configuration file name
pub const PROJECT_CONFIG_FILE: &str = ".mdlp.toml";

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "mdlp")]
#[command(about = "Live markdown preview engine")]
#[command(version)]
pub struct Args {
    /// Configuration file to use instead of the discovered one
    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Start with syntax cues disabled
    #[arg(long, help = "Start in simple-edit mode (no syntax cues)")]
    pub simple_edit: bool,

    /// Folder served to the preview under the virtual host
    #[arg(long, help = "Folder holding images and fonts referenced by documents")]
    pub asset_dir: Option<PathBuf>,

    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// What the binary should do
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Render a markdown file to a preview document once
    Render {
        file: PathBuf,
        /// Output HTML file; standard output when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-render a markdown file whenever it changes on disk
    Watch {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Drive the editor with JSON-line events on stdin
    Serve,
}

/// Zoom settings of one pane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomSettings {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Font size the pane starts with
    pub initial: f64,
}

impl ZoomSettings {
    fn from_bounds(bounds: ZoomBounds, initial: f64) -> Self {
        Self {
            min: bounds.min,
            max: bounds.max,
            step: bounds.step,
            initial,
        }
    }

    pub fn bounds(&self) -> ZoomBounds {
        ZoomBounds {
            min: self.min,
            max: self.max,
            step: self.step,
        }
    }

    fn merge(&mut self, file: &ZoomFile) {
        self.min = file.min.unwrap_or(self.min);
        self.max = file.max.unwrap_or(self.max);
        self.step = file.step.unwrap_or(self.step);
        self.initial = file.initial.unwrap_or(self.initial);
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub simple_edit: bool,
    /// Starting folder for file operations
    pub edit_folder: PathBuf,
    /// Extension accepted for dropped files
    pub markdown_extension: String,
    pub editor_zoom: ZoomSettings,
    pub preview_zoom: ZoomSettings,
    pub line_height_multiplier: f64,
    /// Host name relative preview URLs resolve against
    pub virtual_host: String,
    /// Folder mapped to the virtual host
    pub asset_dir: Option<PathBuf>,
    pub log_level: String,
    /// Configuration file that was loaded, if any
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simple_edit: false,
            edit_folder: dirs::document_dir().unwrap_or_else(std::env::temp_dir),
            markdown_extension: DEFAULT_MARKDOWN_EXTENSION.to_string(),
            editor_zoom: ZoomSettings::from_bounds(ZoomBounds::editor(), 14.0),
            preview_zoom: ZoomSettings::from_bounds(ZoomBounds::preview(), 16.0),
            line_height_multiplier: DEFAULT_LINE_HEIGHT_MULTIPLIER,
            virtual_host: DEFAULT_VIRTUAL_HOST.to_string(),
            asset_dir: None,
            log_level: "info".to_string(),
            config_path: None,
        }
    }
}

/// Configuration file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    editor: EditorFile,
    zoom: ZoomSection,
    preview: PreviewFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EditorFile {
    simple_edit: Option<bool>,
    edit_folder: Option<PathBuf>,
    markdown_extension: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ZoomSection {
    line_height_multiplier: Option<f64>,
    editor: ZoomFile,
    preview: ZoomFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ZoomFile {
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
    initial: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PreviewFile {
    virtual_host: Option<String>,
    asset_dir: Option<PathBuf>,
}

impl Config {
    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let mut config = match discover_config_file(args.config.as_deref()) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if args.simple_edit {
            config.simple_edit = true;
        }
        if let Some(asset_dir) = args.asset_dir {
            config.asset_dir = Some(asset_dir);
        }
        config.log_level = args.log_level;

        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML configuration on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(content).context("Failed to parse config TOML")?;

        let mut config = Self::default();
        config.simple_edit = file.editor.simple_edit.unwrap_or(config.simple_edit);
        if let Some(folder) = file.editor.edit_folder {
            config.edit_folder = folder;
        }
        if let Some(extension) = file.editor.markdown_extension {
            config.markdown_extension = extension.trim_start_matches('.').to_string();
        }

        config.editor_zoom.merge(&file.zoom.editor);
        config.preview_zoom.merge(&file.zoom.preview);
        config.line_height_multiplier = file
            .zoom
            .line_height_multiplier
            .unwrap_or(config.line_height_multiplier);

        if let Some(host) = file.preview.virtual_host {
            config.virtual_host = host;
        }
        config.asset_dir = file.preview.asset_dir;

        config.validate()?;
        Ok(config)
    }

    /// Check bounds and bring initial scales into range
    pub fn validate(&mut self) -> Result<()> {
        self.editor_zoom
            .bounds()
            .validate()
            .context("Invalid editor zoom")?;
        self.preview_zoom
            .bounds()
            .validate()
            .context("Invalid preview zoom")?;

        if !(self.line_height_multiplier.is_finite() && self.line_height_multiplier > 0.0) {
            anyhow::bail!(
                "line_height_multiplier must be positive, got {}",
                self.line_height_multiplier
            );
        }
        if self.markdown_extension.is_empty() {
            anyhow::bail!("markdown_extension must not be empty");
        }

        self.editor_zoom.initial = self.editor_zoom.bounds().clamp(self.editor_zoom.initial);
        self.preview_zoom.initial = self.preview_zoom.bounds().clamp(self.preview_zoom.initial);
        Ok(())
    }

    /// Virtual host mapping for the preview, when an asset folder is set
    pub fn asset_mapping(&self) -> Option<AssetMapping> {
        self.asset_dir.as_ref().map(|folder| AssetMapping {
            host: self.virtual_host.clone(),
            folder: folder.clone(),
        })
    }

    pub fn has_config_file(&self) -> bool {
        self.config_path.is_some()
    }
}

/// Pick the configuration file: explicit path, project file, then user file
fn discover_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let project = PathBuf::from(PROJECT_CONFIG_FILE);
    if project.is_file() {
        return Some(project);
    }

    dirs::config_dir()
        .map(|dir| dir.join("mdlp").join("config.toml"))
        .filter(|path| path.is_file())
}
