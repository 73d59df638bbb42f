//! User-facing error taxonomy.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Why a drop payload was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropRejection {
    #[error("nothing was dropped")]
    Empty,
    #[error("only one file can be opened at a time ({0} were dropped)")]
    MultipleFiles(usize),
    #[error("{} is not a markdown file", .0.display())]
    NotMarkdown(PathBuf),
}

/// How the host should present an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    /// Non-blocking feedback, such as a refused cursor
    Transient,
    /// Blocking message box with the underlying message
    Modal,
}

/// Recoverable failure of a single trigger
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("drop rejected: {0}")]
    DropRejected(#[from] DropRejection),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8 text", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EditorError {
    pub fn severity(&self) -> NoticeSeverity {
        match self {
            EditorError::DropRejected(_) => NoticeSeverity::Transient,
            EditorError::Read { .. } | EditorError::Encoding { .. } | EditorError::Write { .. } => {
                NoticeSeverity::Modal
            }
        }
    }
}
