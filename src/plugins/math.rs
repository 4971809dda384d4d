//! Formula rendering in built pages.
//!
//! Elements such as `<math-inline>x^2</math-inline>` are replaced by a
//! `<span>` holding the markup a [`FormulaRenderer`] produces for their text.
//! Tag names and renderer options come from the `math` configuration key:
//!
//! ```yaml
//! math:
//!   inline: math-inline
//!   display: math-display
//!   options:
//!     class: katex
//! ```

use std::ops::Range;
use std::sync::Arc;

use quick_xml::escape::{escape, unescape};
use serde::Deserialize;
use serde_json::Value;

use crate::site::{Plugin, PluginError, Site};

/// Configuration key read by the math plugin.
pub const MATH_KEY: &str = "math";

/// Settings under the `math` configuration key.
#[derive(Debug, Clone, Deserialize)]
pub struct MathConfig {
    /// Tag name of inline formulas
    #[serde(default = "default_inline_tag")]
    pub inline: String,
    /// Tag name of display (block) formulas
    #[serde(default = "default_display_tag")]
    pub display: String,
    /// Passed to the renderer unchanged (plus `displayMode` for display formulas)
    #[serde(default = "default_options")]
    pub options: Value,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            inline: default_inline_tag(),
            display: default_display_tag(),
            options: default_options(),
        }
    }
}

fn default_inline_tag() -> String {
    "math-inline".to_string()
}

fn default_display_tag() -> String {
    "math-display".to_string()
}

fn default_options() -> Value {
    Value::Object(serde_json::Map::new())
}

impl MathConfig {
    fn display_options(&self) -> Value {
        let mut options = match &self.options {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        options.insert("displayMode".to_string(), Value::Bool(true));
        Value::Object(options)
    }
}

/// Produces markup for a single formula.
pub trait FormulaRenderer: Send + Sync {
    fn render(&self, tex: &str, options: &Value) -> Result<String, PluginError>;
}

/// Emits escaped TeX between `\(...\)` or `\[...\]` delimiters, ready for a
/// client-side typesetter.
///
/// Reads `displayMode` (bool) and `class` (string) from the options.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterRenderer;

impl FormulaRenderer for DelimiterRenderer {
    fn render(&self, tex: &str, options: &Value) -> Result<String, PluginError> {
        let display = options
            .get("displayMode")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let (open, close, mode) = if display {
            ("\\[", "\\]", "math-display")
        } else {
            ("\\(", "\\)", "math-inline")
        };
        let class = match options.get("class").and_then(Value::as_str) {
            Some(class) => format!("{} {mode}", escape(class)),
            None => mode.to_string(),
        };

        Ok(format!(
            "<span class=\"{class}\">{open}{}{close}</span>",
            escape(tex.trim())
        ))
    }
}

/// Renders formula elements in every output entry.
#[derive(Clone)]
pub struct MathPlugin {
    renderer: Arc<dyn FormulaRenderer>,
}

impl MathPlugin {
    pub fn new<R: FormulaRenderer + 'static>(renderer: R) -> Self {
        Self {
            renderer: Arc::new(renderer),
        }
    }
}

impl Default for MathPlugin {
    fn default() -> Self {
        Self::new(DelimiterRenderer)
    }
}

impl Plugin for MathPlugin {
    fn name(&self) -> &'static str {
        "math"
    }

    fn apply(&self, site: &mut Site) -> Result<(), PluginError> {
        let config = match site.data.get(MATH_KEY) {
            None | Some(Value::Null) => MathConfig::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| PluginError::config(MATH_KEY, e.to_string()))?,
        };

        for (key, text) in site.output.iter_mut() {
            *text = render_formulas(key, text, &config, self.renderer.as_ref())?;
        }

        Ok(())
    }
}

/// Elements whose content is raw text and never holds formulas.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Rewrite one document, replacing formula elements with rendered markup.
///
/// The document is scanned as HTML rather than XML: bare `&` and unclosed
/// tags are fine, tag names match case-insensitively, and comments and
/// `<script>`/`<style>` bodies are skipped. Everything outside a formula
/// element is copied unchanged.
fn render_formulas(
    path: &str,
    html: &str,
    config: &MathConfig,
    renderer: &dyn FormulaRenderer,
) -> Result<String, PluginError> {
    let display_options = config.display_options();
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let lt = pos + offset;
        if html[lt..].starts_with("<!--") {
            pos = html[lt..].find("-->").map_or(html.len(), |i| lt + i + 3);
            continue;
        }
        let Some(tag) = start_tag_at(html, lt) else {
            pos = lt + 1;
            continue;
        };
        let name = &html[tag.name.clone()];

        if RAW_TEXT_ELEMENTS
            .iter()
            .any(|raw| name.eq_ignore_ascii_case(raw))
        {
            pos = if tag.self_closing {
                tag.end
            } else {
                find_end_tag(html, tag.end, name.as_bytes(), false)
                    .map_or(html.len(), |(_, after)| after)
            };
            continue;
        }

        let options = if name.eq_ignore_ascii_case(&config.inline) {
            &config.options
        } else if name.eq_ignore_ascii_case(&config.display) {
            &display_options
        } else {
            pos = tag.end;
            continue;
        };

        let (tex, after) = if tag.self_closing {
            (String::new(), tag.end)
        } else {
            let (close, after) = find_end_tag(html, tag.end, name.as_bytes(), true)
                .ok_or_else(|| PluginError::Markup {
                    path: path.to_string(),
                    message: format!("unclosed <{name}> element"),
                })?;
            (inner_text(&html[tag.end..close]), after)
        };

        let rendered = renderer.render(&tex, options)?;
        out.push_str(&html[copied..lt]);
        out.push_str("<span>");
        out.push_str(&rendered);
        out.push_str("</span>");
        copied = after;
        pos = after;
    }

    out.push_str(&html[copied..]);
    Ok(out)
}

/// A start tag: the byte range of its name and the offset just past its `>`.
struct StartTag {
    name: Range<usize>,
    end: usize,
    self_closing: bool,
}

/// Parse the start tag beginning at `lt`, if there is one.
fn start_tag_at(html: &str, lt: usize) -> Option<StartTag> {
    let bytes = html.as_bytes();
    let name_start = lt + 1;
    if !bytes.get(name_start)?.is_ascii_alphabetic() {
        return None;
    }
    let name_end = bytes[name_start..]
        .iter()
        .position(|&b| b.is_ascii_whitespace() || b == b'/' || b == b'>')
        .map_or(bytes.len(), |i| name_start + i);

    // Attribute values may contain `>`
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(name_end) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => {
                return Some(StartTag {
                    name: name_start..name_end,
                    end: i + 1,
                    self_closing: bytes[i - 1] == b'/',
                });
            }
            None => {}
        }
    }
    None
}

/// If an end tag for `name` begins at `lt`, the offset just past its `>`.
fn end_tag_at(html: &str, lt: usize, name: &[u8]) -> Option<usize> {
    let bytes = html.as_bytes();
    let name_start = lt + 2;
    let name_end = name_start + name.len();
    if bytes.get(lt + 1) != Some(&b'/') || !bytes.get(name_start..name_end)?.eq_ignore_ascii_case(name) {
        return None;
    }
    match bytes.get(name_end) {
        Some(b'>') => Some(name_end + 1),
        Some(b) if b.is_ascii_whitespace() => bytes[name_end..]
            .iter()
            .position(|&b| b == b'>')
            .map(|i| name_end + i + 1),
        _ => None,
    }
}

/// Find the end tag closing an element whose content starts at `from`,
/// returning the offsets of its `<` and just past its `>`.
///
/// With `nested`, same-named elements opened in between must close first.
fn find_end_tag(html: &str, from: usize, name: &[u8], nested: bool) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut pos = from;

    while let Some(offset) = html[pos..].find('<') {
        let lt = pos + offset;
        if let Some(after) = end_tag_at(html, lt, name) {
            if depth == 0 {
                return Some((lt, after));
            }
            depth -= 1;
            pos = after;
        } else if nested
            && let Some(tag) = start_tag_at(html, lt)
            && html.as_bytes()[tag.name.clone()].eq_ignore_ascii_case(name)
        {
            if !tag.self_closing {
                depth += 1;
            }
            pos = tag.end;
        } else {
            pos = lt + 1;
        }
    }
    None
}

/// Text content of a formula element: nested tags and comments dropped,
/// character references decoded.
fn inner_text(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut pos = 0;

    while let Some(offset) = markup[pos..].find('<') {
        let lt = pos + offset;
        text.push_str(&markup[pos..lt]);
        pos = match markup_end(markup, lt) {
            Some(end) => end,
            None => {
                text.push('<');
                lt + 1
            }
        };
    }
    text.push_str(&markup[pos..]);

    decode_references(&text)
}

/// End offset of the tag or comment beginning at `lt`. `None` when the `<`
/// is plain text, as in `a < b`.
fn markup_end(html: &str, lt: usize) -> Option<usize> {
    if let Some(tag) = start_tag_at(html, lt) {
        return Some(tag.end);
    }
    let rest = &html[lt..];
    if rest.starts_with("<!--") {
        return rest.find("-->").map(|i| lt + i + 3);
    }
    let bytes = rest.as_bytes();
    if bytes.get(1) == Some(&b'/') && bytes.get(2).is_some_and(u8::is_ascii_alphabetic) {
        return rest.find('>').map(|i| lt + i + 1);
    }
    None
}

/// Decode each character reference on its own. Unknown names and `&`s that
/// start no reference are kept literally.
fn decode_references(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let reference = rest.find(';').map(|semi| &rest[..=semi]).filter(|r| {
            r.len() > 2
                && r[1..r.len() - 1]
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'#')
        });
        if let Some(reference) = reference
            && let Ok(value) = unescape(reference)
        {
            decoded.push_str(&value);
            rest = &rest[reference.len()..];
        } else {
            decoded.push('&');
            rest = &rest[1..];
        }
    }
    decoded.push_str(rest);
    decoded
}
