//! The site state and the staged build pipeline that runs over it.
//!
//! A build threads a single [`Site`] through a fixed sequence:
//!
//! 1. `preload` plugins
//! 2. load (content files + template modules)
//! 3. `preparse` plugins
//! 4. parse (content records -> pages)
//! 5. `prebuild` plugins
//! 6. build (pages -> output via templates)
//! 7. `postbuild` plugins
//!
//! Plugins receive `&mut Site` and may rewrite any part of it.

mod assemble;
mod content;
mod error;
mod hooks;
mod parser;
pub mod paths;
mod state;
mod template;
mod walk;

pub use content::ContentFile;
pub use hooks::{Plugin, PluginError};
pub use parser::{Metadata, Page, ParseError, Parser};
pub use state::{OutputMap, Site};
pub use walk::walk_files;
