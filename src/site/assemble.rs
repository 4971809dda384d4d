//! Page assembly: content records into pages, pages into output.

use super::error::BuildError;
use super::paths::{extension, output_key};
use super::state::Site;

impl Site {
    /// Parse every content record into a page stored under the same key.
    ///
    /// Existing pages with the same key are replaced. A record whose parser
    /// was removed after loading is skipped.
    pub fn parse(&mut self) -> Result<(), BuildError> {
        for (key, file) in &self.content {
            let Some(parser) = self.parsers.resolve(extension(key)) else {
                tracing::warn!(path = %key, "no parser registered anymore, skipping");
                continue;
            };

            let page = parser.parse(file).map_err(|source| BuildError::Parse {
                path: key.clone(),
                source,
            })?;
            self.pages.insert(key.clone(), page);
        }

        tracing::info!(pages = self.pages.len(), "parsed content");
        Ok(())
    }

    /// Render every page with its template into the output map.
    ///
    /// Pages are processed in order. If a page has no template, or its
    /// template fails, the build stops there: outputs of earlier pages stay,
    /// later pages are never rendered.
    pub fn build(&mut self) -> Result<(), BuildError> {
        let keys: Vec<String> = self.pages.keys().cloned().collect();

        for key in keys {
            let (template_key, template) = self.templates.resolve(&key)?;

            let Some(page) = self.pages.get(&key) else {
                continue;
            };
            let html = template
                .render(self, page)
                .map_err(|source| BuildError::Render {
                    path: key.clone(),
                    source,
                })?;

            let out = output_key(&key);
            tracing::debug!(page = %key, template = %template_key, output = %out, "rendered page");
            self.output.insert(out, html);
        }

        tracing::info!(outputs = self.output.len(), "built pages");
        Ok(())
    }
}
