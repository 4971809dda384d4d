use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language};
use quick_xml::escape::escape;

/// Code block highlighter for markdown pages (tree-sitter via autumnus).
///
/// Output uses CSS classes rather than inline styles, so the site's own
/// stylesheet picks the colors.
#[derive(Debug, Clone, Default)]
pub struct SyntaxHighlighter;

impl SyntaxHighlighter {
    /// Highlight code and return a `<pre>` block.
    ///
    /// Falls back to a plain, escaped `<pre><code>` block when the language is
    /// not recognized or the formatter fails.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        let lang = Language::guess(language, code);

        if matches!(lang, Language::PlainText)
            && !language.is_empty()
            && language != "plaintext"
            && language != "text"
        {
            return plain_code_block(code, language);
        }

        let Ok(formatter) = HtmlLinkedBuilder::new().source(code).lang(lang).build() else {
            return plain_code_block(code, language);
        };

        let mut output: Vec<u8> = Vec::new();
        if formatter.format(&mut output).is_err() {
            return plain_code_block(code, language);
        }
        String::from_utf8(output).unwrap_or_else(|_| plain_code_block(code, language))
    }
}

fn plain_code_block(code: &str, language: &str) -> String {
    let escaped = escape(code);
    if language.is_empty() {
        format!("<pre><code>{escaped}</code></pre>")
    } else {
        format!("<pre><code class=\"language-{}\">{escaped}</code></pre>", escape(language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust() {
        let result = SyntaxHighlighter.highlight("fn main() {}", "rust");

        assert!(result.contains("<pre"));
        assert!(result.contains("</pre>"));
    }

    #[test]
    fn test_highlight_unknown_language() {
        let result = SyntaxHighlighter.highlight("a < b", "unknown_lang_xyz");

        assert_eq!(
            result,
            "<pre><code class=\"language-unknown_lang_xyz\">a &lt; b</code></pre>"
        );
    }
}
