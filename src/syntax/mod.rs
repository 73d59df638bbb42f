//! Markdown Syntax Cues
//!
//! Line-level classification that drives editor highlighting.
//! Focused solely on recognising syntax; styling lives in `document`.

pub mod classifier;

pub use classifier::{CueCategory, classify_line};

/// Classify every line of a text, in order
pub fn classify_text(text: &str) -> Vec<CueCategory> {
    text.lines().map(classify_line).collect()
}
