//! Directory-style URLs: `/a/b.html` becomes `/a/b/index.html`.

use crate::site::paths::{INDEX_FILE, OUTPUT_EXT};
use crate::site::{OutputMap, Plugin, PluginError, Site};

/// Moves every output entry to a directory index so it is served at `/a/b/`.
///
/// Must run after any postbuild plugin that still expects the original keys.
pub struct PrettyLinksPlugin;

impl Plugin for PrettyLinksPlugin {
    fn name(&self) -> &'static str {
        "pretty-links"
    }

    fn apply(&self, site: &mut Site) -> Result<(), PluginError> {
        prettify_links(&mut site.output);
        Ok(())
    }
}

/// Rewrite output keys in place. Entries already named `index.html` are left
/// alone, so applying this twice changes nothing.
pub fn prettify_links(output: &mut OutputMap) {
    let index_suffix = format!("/{INDEX_FILE}");
    let keys: Vec<String> = output
        .keys()
        .filter(|key| !key.ends_with(&index_suffix))
        .cloned()
        .collect();

    for key in keys {
        let Some(text) = output.shift_remove(&key) else {
            continue;
        };
        let base = key.strip_suffix(OUTPUT_EXT).unwrap_or(&key);
        output.insert(format!("{base}{index_suffix}"), text);
    }
}
