//! Editor Document
//!
//! The block buffer and the cue applicator that styles it.

pub mod buffer;
pub mod cues;

pub use buffer::{Block, BlockStyle, DocumentBuffer, FontWeight, LineEnding};
pub use cues::{CuePass, apply_cues, clear_cues};
