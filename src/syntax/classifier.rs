//! Line Classifier
//!
//! Pure, ordered rule matching of a single line of markdown.
//! No editor state, no I/O: a line goes in, a cue category comes out.

use std::sync::LazyLock;

use regex::Regex;

/// Visual cue category assigned to a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CueCategory {
    /// Plain text, no highlight
    #[default]
    None,
    /// ATX heading of level 1 to 5
    Heading,
    /// Image link at the start of the line
    ImageRef,
}

impl CueCategory {
    /// Whether this category is drawn with the highlighted style
    pub fn is_highlighted(self) -> bool {
        !matches!(self, CueCategory::None)
    }
}

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,5}\s").expect("heading pattern compiles"));

static IMAGE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!\[.*?\]\(.*?\)").expect("image pattern compiles"));

/// Rules in evaluation order. First match wins.
static RULES: [(&LazyLock<Regex>, CueCategory); 2] = [
    (&HEADING, CueCategory::Heading),
    (&IMAGE_REF, CueCategory::ImageRef),
];

/// Classify a line of markdown
///
/// Leading whitespace is ignored, so indented headings still count.
pub fn classify_line(line: &str) -> CueCategory {
    let line = line.trim_start();

    RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(line))
        .map(|(_, category)| *category)
        .unwrap_or(CueCategory::None)
}
