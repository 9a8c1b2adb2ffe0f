//! Lightsite Generator Library
//!
//! Writes a [`lightsite_core::Site`] to disk.
//!
//! # Modules
//!
//! - [`template`] - HTML template system with variable interpolation
//! - [`content`] - first-party content: copies, pages, Markdown, feeds
//! - [`schedule`] - group-by-directory task execution on a worker pool
//! - [`loader`] - sites declared in `lightsite.toml`
//! - [`build`] - Build orchestration

pub mod build;
pub mod content;
pub mod loader;
pub mod schedule;
pub mod template;

pub use build::{BuildError, BuildStats, Builder};
pub use content::{
    AtomFeed, DirectoryCopy, FileCopy, IncludeCopy, MarkdownPage, Prop, RssFeed, TemplatePage,
    copy,
};
pub use loader::SiteLoader;
pub use schedule::{ExecutionReport, Scheduler, TaskFailure};
pub use template::{Template, TemplateContext, TemplateError, TemplateSource};
