mod highlight;
mod markdown;
mod math;
mod pretty_links;

pub use markdown::MarkdownPlugin;
pub use math::MathPlugin;
pub use pretty_links::PrettyLinksPlugin;
