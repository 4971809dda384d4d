//! Markdown content: front matter extraction and HTML rendering.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as CmarkParser, Tag, TagEnd, html};
use serde::Deserialize;
use serde_json::Value;

use super::highlight::SyntaxHighlighter;
use crate::site::{ContentFile, Metadata, Page, ParseError, Parser, Plugin, PluginError, Site};

/// Configuration key read by the markdown plugin.
pub const MARKDOWN_KEY: &str = "markdown";

/// Settings under the `markdown` configuration key.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
    /// Syntax-highlight fenced code blocks
    #[serde(default = "default_highlight")]
    pub highlight: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
            highlight: default_highlight(),
        }
    }
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

fn default_highlight() -> bool {
    true
}

impl MarkdownConfig {
    /// Map extension names to pulldown-cmark options.
    pub fn options(&self) -> Result<Options, PluginError> {
        let mut options = Options::empty();
        for extension in &self.extensions {
            match extension.as_str() {
                "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
                "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
                "gfm" => options.insert(Options::ENABLE_GFM),
                "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
                "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
                "tables" => options.insert(Options::ENABLE_TABLES),
                "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
                other => {
                    return Err(PluginError::config(
                        format!("{MARKDOWN_KEY}.extensions"),
                        format!("invalid markdown extension: {other}"),
                    ));
                }
            }
        }
        Ok(options)
    }
}

/// Registers the `.md` parser, configured from the `markdown` key.
pub struct MarkdownPlugin;

impl Plugin for MarkdownPlugin {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn apply(&self, site: &mut Site) -> Result<(), PluginError> {
        let config = match site.data.get(MARKDOWN_KEY) {
            None | Some(Value::Null) => MarkdownConfig::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| PluginError::config(MARKDOWN_KEY, e.to_string()))?,
        };

        let parser = MarkdownParser {
            options: config.options()?,
            highlighter: config.highlight.then(SyntaxHighlighter::default),
        };
        site.parsers.register(".md", parser)?;
        Ok(())
    }
}

/// Parses markdown files with optional YAML front matter.
pub struct MarkdownParser {
    options: Options,
    highlighter: Option<SyntaxHighlighter>,
}

impl Parser for MarkdownParser {
    fn parse(&self, file: &ContentFile) -> Result<Page, ParseError> {
        let parsed = parse_front_matter(&file.text);
        let output = render_markdown(&parsed.content, self.options, self.highlighter.as_ref());

        let mut data = file.meta.to_data();
        data.insert("toc".to_string(), serde_json::to_value(&output.toc).unwrap_or_default());
        data.extend(parsed.front_matter);

        Ok(Page::new(output.html, data))
    }
}

/// Result of splitting front matter from markdown content.
#[derive(Debug)]
pub struct ParsedContent {
    /// The front matter fields (empty if none found or unparseable)
    pub front_matter: Metadata,
    /// The markdown content without the front matter block
    pub content: String,
}

/// Split a YAML front matter block delimited by `---` from markdown content.
///
/// ```markdown
/// ---
/// title: My Page
/// tags: [rust]
/// ---
///
/// # Content starts here
/// ```
///
/// Both delimiters must be lines of exactly `---`. A block that is not a
/// YAML mapping is not front matter, and the whole text is kept as content.
pub fn parse_front_matter(content: &str) -> ParsedContent {
    let no_front_matter = || ParsedContent {
        front_matter: Metadata::new(),
        content: content.to_string(),
    };

    let mut lines = content.trim_start().split_inclusive('\n');
    if lines.next().map(str::trim_end) != Some("---") {
        return no_front_matter();
    }

    let mut yaml_content = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == "---" {
            closed = true;
            break;
        }
        yaml_content.push_str(line);
    }
    if !closed {
        return no_front_matter();
    }
    let rest: String = lines.collect();

    let front_matter = if yaml_content.trim().is_empty() {
        Metadata::new()
    } else {
        match serde_yaml::from_str::<Metadata>(&yaml_content) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::debug!(error = %e, "leading block is not front matter");
                return no_front_matter();
            }
        }
    };

    ParsedContent {
        front_matter,
        content: rest.trim_start_matches(['\r', '\n']).to_string(),
    }
}

/// A heading collected while rendering.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TocEntry {
    /// The heading text
    pub text: String,
    /// The heading id (for anchor links)
    pub id: String,
    /// The heading level (1-6)
    pub level: u8,
}

/// Rendered HTML plus the headings it contains.
pub struct MarkdownOutput {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Render markdown to HTML, adding heading ids and highlighting code blocks.
pub fn render_markdown(
    markdown: &str,
    options: Options,
    highlighter: Option<&SyntaxHighlighter>,
) -> MarkdownOutput {
    let parser = CmarkParser::new_ext(markdown, options);

    let mut in_code_block = false;
    let mut code_language = String::new();
    let mut code_content = String::new();

    struct HeadingState {
        level: pulldown_cmark::HeadingLevel,
        classes: Vec<String>,
    }
    let mut in_heading: Option<HeadingState> = None;
    let mut used_heading_ids = std::collections::HashSet::new();
    let mut heading_html = String::new();
    let mut heading_text = String::new();
    let mut toc: Vec<TocEntry> = Vec::new();

    let events: Vec<Event> = parser
        .flat_map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                ref id,
                ref classes,
                ..
            }) => {
                if let Some(existing_id) = id {
                    used_heading_ids.insert(existing_id.to_string());
                    return vec![event];
                }
                in_heading = Some(HeadingState {
                    level,
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                });
                heading_html.clear();
                heading_text.clear();
                vec![]
            }
            Event::End(TagEnd::Heading(_)) if in_heading.is_some() => {
                let Some(state) = in_heading.take() else {
                    return vec![];
                };

                let base_id = slugify(&heading_text);
                let mut id = base_id.clone();
                let mut suffix = 1;
                while used_heading_ids.contains(&id) {
                    id = format!("{}-{}", base_id, suffix);
                    suffix += 1;
                }
                used_heading_ids.insert(id.clone());

                toc.push(TocEntry {
                    text: heading_text.clone(),
                    id: id.clone(),
                    level: state.level as u8,
                });

                let class_attr = if state.classes.is_empty() {
                    String::new()
                } else {
                    format!(" class=\"{}\"", state.classes.join(" "))
                };

                vec![Event::Html(
                    format!(
                        "<h{level} id=\"{id}\"{class_attr}>{heading_html}</h{level}>\n",
                        level = state.level as usize,
                    )
                    .into(),
                )]
            }
            Event::Start(Tag::CodeBlock(kind)) if highlighter.is_some() => {
                in_code_block = true;
                code_language = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code_content.clear();
                vec![]
            }
            Event::End(TagEnd::CodeBlock) if in_code_block => {
                in_code_block = false;
                match highlighter {
                    Some(highlighter) => {
                        vec![Event::Html(highlighter.highlight(&code_content, &code_language).into())]
                    }
                    None => vec![],
                }
            }
            Event::Text(text) if in_code_block => {
                code_content.push_str(&text);
                vec![]
            }
            inner if in_heading.is_some() => {
                if let Event::Text(text) | Event::Code(text) = &inner {
                    heading_text.push_str(text);
                }
                html::push_html(&mut heading_html, std::iter::once(inner));
                vec![]
            }
            _ => vec![event],
        })
        .collect();

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    MarkdownOutput {
        html: html_output,
        toc,
    }
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-', "")
}
