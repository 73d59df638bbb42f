//! Preview Document Template
//!
//! Fixed document chrome and stylesheet wrapped around every HTML fragment.
//! The fragment is inserted verbatim; it is never parsed again here.

/// Virtual host the preview resolves relative asset paths against
pub const DEFAULT_VIRTUAL_HOST: &str = "local.example";

const STYLESHEET: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
    font-size: 16px;
    line-height: 1.6;
    color: #24292e;
    background: #ffffff;
    padding: 20px;
}
h1, h2, h3, h4, h5, h6 {
    font-weight: 600;
    margin-top: 24px;
    margin-bottom: 16px;
    line-height: 1.25;
}
h1 { font-size: 2em; border-bottom: 1px solid #eaecef; padding-bottom: .3em; }
h2 { font-size: 1.5em; border-bottom: 1px solid #eaecef; padding-bottom: .3em; }
h3 { font-size: 1.25em; }
h4 { font-size: 1em; }
h5 { font-size: .875em; }
h6 { font-size: .85em; color: #6a737d; }
p { margin: 16px 0; }
a { color: #0366d6; text-decoration: none; }
a:hover { text-decoration: underline; }
ul, ol { padding-left: 2em; margin: 16px 0; }
li { margin: 4px 0; }
blockquote {
    padding: 0 1em;
    color: #6a737d;
    border-left: .25em solid #dfe2e5;
    margin: 16px 0;
}
code {
    background-color: rgba(27, 31, 35, .05);
    padding: .2em .4em;
    border-radius: 3px;
    font-family: SFMono-Regular, Consolas, "Liberation Mono", Menlo, monospace;
    font-size: 85%;
}
pre {
    background-color: #f6f8fa;
    padding: 16px;
    border-radius: 6px;
    overflow: auto;
}
pre code { background: none; padding: 0; font-size: 85%; }
table { border-collapse: collapse; width: 100%; margin: 16px 0; }
th, td { border: 1px solid #dfe2e5; padding: 6px 13px; }
th { background: #f6f8fa; font-weight: 600; }
tr:nth-child(even) { background: #fafbfc; }
hr { border: 0; border-top: 1px solid #eaecef; margin: 24px 0; }
img { max-width: 100%; height: auto; }
li > input[type="checkbox"] { margin-right: .5em; }
"#;

// Files dropped on the preview must not navigate away from it
const DROP_GUARD: &str = r#"
window.addEventListener('dragover', function (e) {
    e.preventDefault();
    e.dataTransfer.dropEffect = 'none';
}, false);
window.addEventListener('drop', function (e) {
    e.preventDefault();
}, false);
"#;

/// Static wrapper for rendered fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTemplate {
    head: String,
    tail: String,
}

impl Default for HtmlTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_VIRTUAL_HOST)
    }
}

impl HtmlTemplate {
    /// Build the template with relative URLs resolving against `virtual_host`
    pub fn new(virtual_host: &str) -> Self {
        let head = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <base href=\"{}\">\n<style>{STYLESHEET}</style>\n\
             <script>{DROP_GUARD}</script>\n</head>\n<body>\n<div id=\"content\">\n",
            base_href(virtual_host)
        );
        let tail = "</div>\n</body>\n</html>\n".to_string();

        Self { head, tail }
    }

    /// Embed an HTML fragment into the full document
    pub fn wrap(&self, fragment: &str) -> String {
        let mut document =
            String::with_capacity(self.head.len() + fragment.len() + self.tail.len());
        document.push_str(&self.head);
        document.push_str(fragment);
        document.push_str(&self.tail);
        document
    }
}

/// Base URL used for a virtual host
pub fn base_href(virtual_host: &str) -> String {
    format!("https://{virtual_host}/")
}
