//! Markdown to HTML conversion.

use anyhow::Result;
use pulldown_cmark::{Options, Parser, html};

/// Converts markdown text into an HTML fragment
///
/// Implementations must be pure: the same input always yields the same output.
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, markdown: &str) -> Result<String>;
}

/// CommonMark converter with the usual extensions enabled
#[derive(Debug, Clone, Copy)]
pub struct CommonMarkConverter {
    options: Options,
}

impl Default for CommonMarkConverter {
    fn default() -> Self {
        Self::with_options(
            Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        )
    }
}

impl CommonMarkConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self { options }
    }
}

impl MarkdownConverter for CommonMarkConverter {
    fn convert(&self, markdown: &str) -> Result<String> {
        let parser = Parser::new_ext(markdown, self.options);
        let mut fragment = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut fragment, parser);
        Ok(fragment)
    }
}
