//! The content capability.

use std::{fmt, path::Path};

use chrono::{DateTime, Utc};

use crate::{context::GenContext, error::Result, path::GenPath};

/// Anything that can write itself to a generation path.
///
/// `write` is invoked exactly once per task, after every task of the run has
/// been built, so an implementation may look up any other output through
/// [`GenContext::tasks`]. Writes of the same directory group run concurrently:
/// never assume a sibling file already exists on disk.
pub trait Content: Send + Sync + fmt::Debug {
    /// Write the content at `path`.
    fn write(&self, path: &GenPath, ctx: &GenContext) -> Result<()>;

    /// Descriptive data for feed and table-of-contents consumers.
    fn entry(&self) -> Option<EntryInfo> {
        None
    }

    /// The source file this content was created from, if any.
    fn source(&self) -> Option<&Path> {
        None
    }
}

/// Metadata of a syndicated entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry title.
    pub title: Option<String>,

    /// Short summary.
    pub summary: Option<String>,

    /// Publication date.
    pub created: Option<DateTime<Utc>>,

    /// Last update date.
    pub updated: Option<DateTime<Utc>>,
}
