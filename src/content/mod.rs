//! Content model: identities, slugs, parsing, filtering and the parse cache.

mod document;
mod filter;
mod identity;
mod parser;
mod slug;
mod store;

pub use document::{inlines, Block, Document, Frontmatter, Inline, Link, ParsedContent};
pub use filter::{filter_content, filters_from_names, ContentFilter, ExplicitPublish, RemoveDrafts};
pub use identity::{absolutize, normalize_path, FileIdentity};
pub use parser::{ContentParser, MarkdownParser};
pub use slug::{slug_for_link, Slug};
pub use store::ContentStore;
