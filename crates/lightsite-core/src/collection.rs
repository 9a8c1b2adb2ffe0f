//! Hierarchical views over included content.
//!
//! ```
//! # use lightsite_core::{ContentCollection, Site};
//! let site = Site::new("https://example.org/").unwrap().with_title("Blog");
//! // site.include("posts/1.html", ...) and friends
//! assert!(site.at("posts").is_err());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    content::{Content, EntryInfo},
    error::{CoreError, Result},
    included::{Included, Includes, join_location, normalize_location},
};

/// An author of a site or collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    /// Display name.
    pub name: Option<String>,

    /// Contact email.
    pub email: Option<String>,
}

impl Author {
    /// Create an author from a name and an optional email.
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            name: Some(name.into()),
            email,
        }
    }
}

/// Descriptive fields shared by sites and collections; feeds read these.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionInfo {
    /// Public URL of the collection root.
    pub url: String,

    /// Icon URL.
    pub icon_url: Option<String>,

    /// Title.
    pub title: Option<String>,

    /// Description.
    pub description: Option<String>,

    /// Primary author.
    pub author: Option<Author>,

    /// Language code.
    pub language: Option<String>,

    /// Full copyright notice.
    pub copyright: Option<String>,

    /// Last update time.
    pub updated: Option<DateTime<Utc>>,
}

/// A queryable collection of included content.
pub trait ContentCollection {
    /// The included content, with locations relative to [`Self::relative_root`].
    fn content(&self) -> &Includes;

    /// Descriptive fields.
    fn info(&self) -> &CollectionInfo;

    /// URL of the site the collection belongs to.
    fn base_url(&self) -> &Url;

    /// Location of the collection root within the site; empty for a site.
    fn relative_root(&self) -> &str;

    /// Public URL of the collection.
    fn url(&self) -> &str {
        &self.info().url
    }

    /// The sub-collection included below `path`.
    ///
    /// Fails with [`CoreError::NotFound`] when nothing is included there.
    fn at(&self, path: &str) -> Result<ContentAtPath> {
        ContentAtPath::derive(self, path)
    }

    /// `(location, included)` pairs in insertion order.
    fn items(&self) -> impl Iterator<Item = (&str, &Included)> {
        self.content().items()
    }

    /// Site-relative location of an item of this collection.
    fn full_location(&self, location: &str) -> String {
        join_location(self.relative_root(), location)
    }

    /// Items exposing entry info, keyed by their site-relative location.
    fn entries(&self) -> Vec<(String, EntryInfo)> {
        self.content()
            .iter()
            .filter_map(|entry| {
                let info = entry.content().and_then(|c| c.entry())?;
                Some((self.full_location(entry.location()), info))
            })
            .collect()
    }

    /// Whether `content` is one of the items.
    fn contains_content(&self, content: &dyn Content) -> bool {
        self.content().iter().any(|entry| {
            entry.content().is_some_and(|c| {
                std::ptr::addr_eq(std::sync::Arc::as_ptr(c), content as *const dyn Content)
            })
        })
    }
}

/// Content of a collection found below a path, with rewritten locations.
///
/// Descriptive fields are inherited from the parent collection, except the
/// URL and description which are derived from the new root.
#[derive(Debug, Clone)]
pub struct ContentAtPath {
    base_url: Url,
    relative_root: String,
    info: CollectionInfo,
    content: Includes,
}

impl ContentAtPath {
    fn derive<C>(parent: &C, path: &str) -> Result<Self>
    where
        C: ContentCollection + ?Sized,
    {
        let path = normalize_location(path.trim_matches('/'))?;
        let relative_root = join_location(parent.relative_root(), &path);
        let content = parent.content().slice(&path).map_err(|err| match err {
            CoreError::NotFound { .. } => CoreError::not_found(relative_root.clone()),
            other => other,
        })?;

        let url = parent.base_url().join(&relative_root)?.to_string();
        let parent_info = parent.info();
        let description = match &parent_info.title {
            Some(title) => format!("{title} | {relative_root}"),
            None => url.clone(),
        };

        Ok(Self {
            base_url: parent.base_url().clone(),
            relative_root,
            info: CollectionInfo {
                url,
                description: Some(description),
                ..parent_info.clone()
            },
            content,
        })
    }
}

impl ContentCollection for ContentAtPath {
    fn content(&self) -> &Includes {
        &self.content
    }

    fn info(&self) -> &CollectionInfo {
        &self.info
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn relative_root(&self) -> &str {
        &self.relative_root
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::{context::GenContext, path::GenPath, site::Site};

    #[derive(Debug)]
    struct Post(&'static str);

    impl Content for Post {
        fn write(&self, _path: &GenPath, _ctx: &GenContext) -> Result<()> {
            Ok(())
        }

        fn entry(&self) -> Option<EntryInfo> {
            Some(EntryInfo {
                title: Some(self.0.to_string()),
                ..EntryInfo::default()
            })
        }
    }

    fn blog() -> Site {
        let mut site = Site::new("https://example.org/")
            .unwrap()
            .with_title("Blog")
            .with_language("en")
            .with_copyright("(c) Blog")
            .with_author(Author::new("Jane", Some("jane@example.org".into())))
            .with_updated(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        site.include_in("index.html", Post("index"), "/src").unwrap();
        site.include_in("posts/dev/1.html", Post("one"), "/src").unwrap();
        site.include_in("posts/dev/2.html", Post("two"), "/src").unwrap();
        site.include_in("posts/other/3.html", Post("three"), "/src").unwrap();
        site.include_in("static/app.js", Post("js"), "/src").unwrap();
        site
    }

    #[test]
    fn test_at_rewrites_locations_and_url() {
        let site = blog();
        let posts = site.at("posts").unwrap();
        let locations: Vec<_> = posts.items().map(|(loc, _)| loc).collect();
        assert_eq!(locations, vec!["dev/1.html", "dev/2.html", "other/3.html"]);
        assert_eq!(posts.url(), "https://example.org/posts");
        assert_eq!(posts.relative_root(), "posts");
    }

    #[test]
    fn test_metadata_inherited_except_url_and_description() {
        let site = blog();
        let posts = site.at("posts").unwrap();
        let info = posts.info();
        assert_eq!(info.title.as_deref(), Some("Blog"));
        assert_eq!(info.language.as_deref(), Some("en"));
        assert_eq!(info.copyright.as_deref(), Some("(c) Blog"));
        assert_eq!(info.updated, site.info().updated);
        assert_eq!(info.author, site.info().author);
        assert_eq!(info.description.as_deref(), Some("Blog | posts"));
    }

    #[test]
    fn test_nested_slices() {
        let site = blog();
        let dev = site.at("posts").unwrap().at("dev").unwrap();
        assert_eq!(dev.url(), "https://example.org/posts/dev");
        assert_eq!(dev.relative_root(), "posts/dev");
        assert_eq!(dev.content().len(), 2);
        assert_eq!(dev.full_location("1.html"), "posts/dev/1.html");
        assert_eq!(dev.info().description.as_deref(), Some("Blog | posts/dev"));
    }

    #[test]
    fn test_description_falls_back_to_url() {
        let mut site = Site::new("https://example.org/").unwrap();
        site.include_in("posts/1.html", Post("one"), "/src").unwrap();
        let posts = site.at("posts").unwrap();
        assert_eq!(posts.info().description.as_deref(), Some("https://example.org/posts"));
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let site = blog();
        assert!(matches!(site.at("drafts"), Err(CoreError::NotFound { .. })));
        let err = site.at("posts").unwrap().at("missing").unwrap_err();
        assert_eq!(err.to_string(), "There is no content at path \"posts/missing\"");
    }

    #[test]
    fn test_entries_and_contains() {
        let site = blog();
        let dev = site.at("posts/dev").unwrap();
        let entries = dev.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "posts/dev/1.html");
        assert_eq!(entries[0].1.title.as_deref(), Some("one"));

        let index = site.content().get("index.html").unwrap().content().unwrap();
        assert!(site.contains_content(index.as_ref()));
        assert!(!dev.contains_content(index.as_ref()));
        let one = Arc::clone(dev.content().get("1.html").unwrap().content().unwrap());
        assert!(dev.contains_content(one.as_ref()));
    }
}
