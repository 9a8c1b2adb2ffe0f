//! The site: a URL, descriptive metadata and the content registry.

use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use crate::{
    collection::{Author, CollectionInfo, ContentCollection},
    content::Content,
    error::{CoreError, Result},
    included::{Included, Includes},
    path::UrlFactory,
};

/// A static site for generation.
///
/// The site is the root [`ContentCollection`]: nothing is written until a
/// generator freezes its includes into tasks.
#[derive(Debug, Clone)]
pub struct Site {
    url: Url,
    info: CollectionInfo,
    logo_url: Option<String>,
    authors: Vec<Author>,
    content: Includes,
}

impl Site {
    /// Create a site served at `url`.
    ///
    /// The URL needs a scheme and must end with `/`.
    pub fn new(url: &str) -> Result<Self> {
        let invalid = |message: String| CoreError::InvalidUrl {
            url: url.to_string(),
            message,
        };
        let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".to_string()));
        }
        if !url.ends_with('/') {
            return Err(invalid("site URL must end with a forward slash (/)".to_string()));
        }

        Ok(Self {
            info: CollectionInfo {
                url: parsed.to_string(),
                ..CollectionInfo::default()
            },
            url: parsed,
            logo_url: None,
            authors: Vec::new(),
            content: Includes::new(),
        })
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.info.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.info.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_icon_url(mut self, icon_url: impl Into<String>) -> Self {
        self.info.icon_url = Some(icon_url.into());
        self
    }

    #[must_use]
    pub fn with_logo_url(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = Some(logo_url.into());
        self
    }

    /// Add an author. The first one is the primary author used by feeds.
    #[must_use]
    pub fn with_author(mut self, author: Author) -> Self {
        if self.info.author.is_none() {
            self.info.author = Some(author.clone());
        }
        if !self.authors.contains(&author) {
            self.authors.push(author);
        }
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.info.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.info.copyright = Some(copyright.into());
        self
    }

    #[must_use]
    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.info.updated = Some(updated);
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.info.title.as_deref()
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// URL of a location at the site; `/foo` and `foo` both resolve under the
    /// site root.
    pub fn url_for(&self, location: &str) -> String {
        join_url(&self.url, location)
    }

    /// Factory used by generation paths of this site.
    pub fn url_factory(&self) -> UrlFactory {
        let base = self.url.clone();
        Arc::new(move |location: &str| join_url(&base, location))
    }

    /// Include content, recording the process working directory as its `cwd`.
    pub fn include(&mut self, location: &str, content: impl Content + 'static) -> Result<()> {
        let cwd = std::env::current_dir()?;
        self.include_shared(location, Arc::new(content), cwd)
    }

    /// Include content resolving its resources against `cwd`.
    pub fn include_in(
        &mut self,
        location: &str,
        content: impl Content + 'static,
        cwd: impl Into<PathBuf>,
    ) -> Result<()> {
        self.include_shared(location, Arc::new(content), cwd)
    }

    /// Include already shared content.
    pub fn include_shared(
        &mut self,
        location: &str,
        content: Arc<dyn Content>,
        cwd: impl Into<PathBuf>,
    ) -> Result<()> {
        let cwd = cwd.into();
        self.content
            .add(location, Included::Content(content), &cwd)?;
        debug!(location, cwd = %cwd.display(), "included content");
        Ok(())
    }

    /// Include a child site under `location`.
    ///
    /// Each of the child's includes becomes a task of this site, with its
    /// location prefixed by `location`. An empty location merges the child
    /// into the root.
    pub fn include_site(&mut self, location: &str, site: Site) -> Result<()> {
        let cwd = std::env::current_dir()?;
        self.content
            .add(location, Included::Site(Arc::new(site)), cwd)?;
        debug!(location, "included subsite");
        Ok(())
    }
}

impl ContentCollection for Site {
    fn content(&self) -> &Includes {
        &self.content
    }

    fn info(&self) -> &CollectionInfo {
        &self.info
    }

    fn base_url(&self) -> &Url {
        &self.url
    }

    fn relative_root(&self) -> &str {
        ""
    }
}

fn join_url(base: &Url, location: &str) -> String {
    let location = location.trim_start_matches('/');
    match base.join(location) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{base}{location}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::GenContext, path::GenPath};

    #[derive(Debug)]
    struct Noop;

    impl Content for Noop {
        fn write(&self, _path: &GenPath, _ctx: &GenContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_url_validation() {
        assert!(Site::new("https://example.org/").is_ok());
        assert!(Site::new("https://example.org/blog/").is_ok());
        assert!(matches!(
            Site::new("https://example.org/blog"),
            Err(CoreError::InvalidUrl { .. })
        ));
        assert!(matches!(Site::new("example.org/"), Err(CoreError::InvalidUrl { .. })));
        assert!(Site::new("mailto:me@example.org/").is_err());
    }

    #[test]
    fn test_url_for() {
        let site = Site::new("https://example.org/blog/").unwrap();
        assert_eq!(site.url_for("posts/1"), "https://example.org/blog/posts/1");
        assert_eq!(site.url_for("/posts/1"), "https://example.org/blog/posts/1");
        assert_eq!(site.url_for(""), "https://example.org/blog/");
        assert_eq!((site.url_factory())("style.css"), "https://example.org/blog/style.css");
    }

    #[test]
    fn test_metadata_setters() {
        let jane = Author::new("Jane", Some("jane@example.org".into()));
        let site = Site::new("https://example.org/")
            .unwrap()
            .with_title("Example")
            .with_description("An example")
            .with_icon_url("https://example.org/favicon.ico")
            .with_logo_url("https://example.org/logo.svg")
            .with_author(jane.clone())
            .with_author(Author::new("John", None))
            .with_author(jane.clone());

        assert_eq!(site.title(), Some("Example"));
        assert_eq!(site.info().description.as_deref(), Some("An example"));
        assert_eq!(site.logo_url(), Some("https://example.org/logo.svg"));
        assert_eq!(site.info().author.as_ref(), Some(&jane));
        assert_eq!(site.authors().len(), 2);
        assert_eq!(site.url(), "https://example.org/");
    }

    #[test]
    fn test_include_records_cwd() {
        let mut site = Site::new("https://example.org/").unwrap();
        site.include("index.html", Noop).unwrap();
        let entry = site.content().get("index.html").unwrap();
        assert_eq!(entry.cwd(), std::env::current_dir().unwrap());

        assert!(matches!(
            site.include("/index.html", Noop),
            Err(CoreError::AbsoluteLocation { .. })
        ));
        assert!(matches!(
            site.include("index.html", Noop),
            Err(CoreError::DuplicateLocation { .. })
        ));
        assert_eq!(site.content().len(), 1);
    }
}
