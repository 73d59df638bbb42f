//! Document Buffer
//!
//! Ordered blocks of editor text with their derived presentation attributes.
//! The buffer is the single source of truth for both cue styling and rendering.

use crate::syntax::CueCategory;

/// Font weight of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

/// Render style tag of a block
///
/// Only ever obtained through [`BlockStyle::for_cue`], never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStyle {
    pub background: &'static str,
    pub foreground: &'static str,
    pub weight: FontWeight,
}

impl BlockStyle {
    /// Style for headings and image references
    pub const HIGHLIGHTED: BlockStyle = BlockStyle {
        background: "#F8F8FF",
        foreground: "#4682B4",
        weight: FontWeight::Bold,
    };

    /// Default style for uncued lines
    pub const PLAIN: BlockStyle = BlockStyle {
        background: "#FFFFFF",
        foreground: "#000000",
        weight: FontWeight::Normal,
    };

    pub fn for_cue(cue: CueCategory) -> Self {
        if cue.is_highlighted() {
            Self::HIGHLIGHTED
        } else {
            Self::PLAIN
        }
    }
}

/// One line of the buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    text: String,
    cue: CueCategory,
    line_height: f64,
}

impl Block {
    fn new(text: &str, line_height: f64) -> Self {
        Self {
            text: text.strip_suffix('\r').unwrap_or(text).to_string(),
            cue: CueCategory::None,
            line_height,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cue(&self) -> CueCategory {
        self.cue
    }

    pub fn style(&self) -> BlockStyle {
        BlockStyle::for_cue(self.cue)
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }
}

/// Line terminator written between blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Terminator of the first line break in `text`, if it has one
    pub fn detect(text: &str) -> Option<Self> {
        let end = text.find('\n')?;
        if text[..end].ends_with('\r') {
            Some(LineEnding::CrLf)
        } else {
            Some(LineEnding::Lf)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Editable document content, one block per line
///
/// Every effective block mutation records an echo: the change notification a
/// host text widget would fire for it. The controller drains echoes through
/// its re-entrancy guard.
///
/// The first line break of the text decides the line ending used to join
/// blocks back together, so mixed endings come out uniform.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentBuffer {
    blocks: Vec<Block>,
    line_height: f64,
    line_ending: LineEnding,
    echoes: usize,
}

impl DocumentBuffer {
    /// Create an empty buffer whose blocks will use `line_height`
    pub fn new(line_height: f64) -> Self {
        Self {
            blocks: Vec::new(),
            line_height,
            line_ending: LineEnding::default(),
            echoes: 0,
        }
    }

    /// Create a buffer holding `text`
    pub fn from_text(text: &str, line_height: f64) -> Self {
        let mut buffer = Self::new(line_height);
        buffer.blocks = split_blocks(text, line_height);
        buffer.line_ending = LineEnding::detect(text).unwrap_or_default();
        buffer
    }

    /// Replace the whole content
    ///
    /// Cues of the new blocks start out as none; line height is kept, and so
    /// is the line ending when `text` has no line break.
    pub fn replace_text(&mut self, text: &str) {
        self.blocks = split_blocks(text, self.line_height);
        if let Some(ending) = LineEnding::detect(text) {
            self.line_ending = ending;
        }
        self.echoes += 1;
    }

    /// Content as plain text, blocks joined by the buffer's line ending
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join(self.line_ending.as_str())
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Current line height applied to every block
    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    /// Set the cue of one block, returning whether it changed
    pub fn set_cue(&mut self, index: usize, cue: CueCategory) -> bool {
        match self.blocks.get_mut(index) {
            Some(block) if block.cue != cue => {
                block.cue = cue;
                self.echoes += 1;
                true
            }
            _ => false,
        }
    }

    /// Set the line height of every block, returning how many changed
    pub fn set_line_height(&mut self, line_height: f64) -> usize {
        self.line_height = line_height;

        let mut changed = 0;
        for block in &mut self.blocks {
            if block.line_height != line_height {
                block.line_height = line_height;
                changed += 1;
            }
        }
        self.echoes += changed;
        changed
    }

    /// Drain the number of change notifications recorded since the last call
    pub fn take_echoes(&mut self) -> usize {
        std::mem::take(&mut self.echoes)
    }
}

fn split_blocks(text: &str, line_height: f64) -> Vec<Block> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| Block::new(line, line_height))
        .collect()
}
