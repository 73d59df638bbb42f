//! File access for the edit session.
//!
//! Reads open the file read-only without any lock, so files another program
//! holds open still load. Writes replace the whole file.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::session::error::{DropRejection, EditorError};

const UTF8_BOM: &str = "\u{feff}";

/// Check a drop payload and return the single markdown file in it
pub fn validate_drop(paths: &[PathBuf], extension: &str) -> Result<PathBuf, DropRejection> {
    let path = match paths {
        [] => return Err(DropRejection::Empty),
        [path] => path,
        _ => return Err(DropRejection::MultipleFiles(paths.len())),
    };

    if has_extension(path, extension) {
        Ok(path.clone())
    } else {
        Err(DropRejection::NotMarkdown(path.clone()))
    }
}

/// Case-insensitive extension check, with or without a leading dot
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

/// Read a text file as UTF-8, dropping a leading byte order mark
pub fn read_shared(path: &Path) -> Result<String, EditorError> {
    let read_error = |source| EditorError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut bytes))
        .map_err(read_error)?;

    let text = String::from_utf8(bytes).map_err(|source| EditorError::Encoding {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Overwrite a file with `text`
pub fn write_text(path: &Path, text: &str) -> Result<(), EditorError> {
    fs::write(path, text).map_err(|source| EditorError::Write {
        path: path.to_path_buf(),
        source,
    })
}
