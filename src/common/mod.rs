mod directory;
pub mod fallback;
mod frontmatter;

pub use directory::{SKIPPED_FILES, is_markdown, is_skipped_file, markdown_files, relative_path};
pub use fallback::{first_some, first_some_concurrent, first_some_sync};
pub use frontmatter::{Frontmatter, parse_frontmatter, read_frontmatter};
