//! Cue Applicator
//!
//! Walks the buffer and sets each block's cue from the classifier verdict.
//! Only cue fields are touched; text and line height never change here.

use crate::document::buffer::DocumentBuffer;
use crate::session::EditSession;
use crate::syntax::{CueCategory, classify_line};

/// Summary of one cue pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CuePass {
    /// Blocks classified
    pub visited: usize,
    /// Blocks whose cue changed
    pub changed: usize,
    /// True when simple-edit mode disabled classification
    pub skipped: bool,
}

/// Apply syntax cues to every block
///
/// In simple-edit mode classification is skipped entirely and existing cues
/// are left as they are; use [`clear_cues`] on mode entry.
pub fn apply_cues(buffer: &mut DocumentBuffer, session: &EditSession) -> CuePass {
    if session.simple_edit() {
        return CuePass {
            skipped: true,
            ..CuePass::default()
        };
    }

    let mut pass = CuePass::default();
    for index in 0..buffer.len() {
        let cue = classify_line(buffer.blocks()[index].text());
        if buffer.set_cue(index, cue) {
            pass.changed += 1;
        }
        pass.visited += 1;
    }

    log::trace!("cue pass: {} visited, {} changed", pass.visited, pass.changed);
    pass
}

/// Reset every block to the uncued style, returning how many changed
pub fn clear_cues(buffer: &mut DocumentBuffer) -> usize {
    (0..buffer.len())
        .filter(|&index| buffer.set_cue(index, CueCategory::None))
        .count()
}
