//! First-party content kinds.
//!
//! - [`copy`] - files and directory trees copied verbatim
//! - [`page`] - template-rendered pages
//! - [`markdown`] - Markdown pages with frontmatter
//! - [`feed`] - RSS and Atom feeds of a collection

pub mod copy;
pub mod feed;
pub mod markdown;
pub mod page;

use std::path::{Path, PathBuf};

pub use copy::{DirectoryCopy, FileCopy, copy, copy_in};
pub use feed::{AtomFeed, RssFeed};
use lightsite_core::{Result, Site};
pub use markdown::{MarkdownPage, PREVIEW_MARKER, RenderedMarkdown};
pub use page::{CtxFn, Prop, TemplatePage};

/// Registering copies of existing files on a [`Site`].
pub trait IncludeCopy {
    /// Copy the file or directory at `location`, relative to `cwd`, to the
    /// same location in the output.
    fn include_copy(&mut self, location: &str, cwd: &Path) -> Result<()>;

    /// Copy `source`, relative to `cwd`, to `location`.
    fn include_copy_from(&mut self, location: &str, source: impl Into<PathBuf>, cwd: &Path) -> Result<()>;
}

impl IncludeCopy for Site {
    fn include_copy(&mut self, location: &str, cwd: &Path) -> Result<()> {
        self.include_copy_from(location, location.trim_start_matches('/'), cwd)
    }

    fn include_copy_from(&mut self, location: &str, source: impl Into<PathBuf>, cwd: &Path) -> Result<()> {
        let content = copy_in(cwd, source)?;
        self.include_shared(location, content, cwd)
    }
}
