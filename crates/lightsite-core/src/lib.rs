//! Lightsite Core Library
//!
//! The generation model of the Lightsite static site generator: paths,
//! the content registry, sites and collections, the two-phase generation
//! context, configuration, and error handling.

pub mod collection;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod frontmatter;
pub mod included;
pub mod path;
pub mod site;

pub use collection::{Author, CollectionInfo, ContentAtPath, ContentCollection};
pub use config::{Config, IncludeConfig, IncludeKind};
pub use content::{Content, EntryInfo};
pub use context::{GenContext, GenTask, Phase};
pub use error::{CoreError, Result};
pub use frontmatter::Frontmatter;
pub use included::{Included, IncludedContent, Includes};
pub use path::{GenPath, UrlFactory};
pub use site::Site;
