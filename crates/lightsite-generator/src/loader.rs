//! Sites declared in `lightsite.toml`.
//!
//! Every `[[include]]` entry becomes one include of the site, in file order,
//! with the configuration directory as its `cwd`. Feeds slice their
//! collection when loaded, so a feed entry must follow the entries it lists.

use std::path::PathBuf;

use lightsite_core::{Config, ContentCollection, IncludeConfig, IncludeKind, Result, Site};
use tracing::{debug, info};

use crate::content::{AtomFeed, IncludeCopy, MarkdownPage, RssFeed, TemplatePage};

/// Builds a [`Site`] from a [`Config`].
#[derive(Debug)]
pub struct SiteLoader<'a> {
    config: &'a Config,
    drafts: bool,
}

impl<'a> SiteLoader<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            drafts: config.build.drafts,
        }
    }

    /// Override whether Markdown drafts are included.
    #[must_use]
    pub fn with_drafts(mut self, drafts: bool) -> Self {
        self.drafts = drafts;
        self
    }

    /// Create the site and register every include.
    pub fn load(&self) -> Result<Site> {
        let mut site = self.config.site()?;
        let mut skipped = 0usize;

        for include in &self.config.includes {
            if !self.add(&mut site, include)? {
                skipped += 1;
            }
        }

        info!(
            includes = site.content().len(),
            skipped,
            base = %self.config.base_dir.display(),
            "loaded site"
        );
        Ok(site)
    }

    /// Register one entry; `false` when it was skipped.
    fn add(&self, site: &mut Site, include: &IncludeConfig) -> Result<bool> {
        let base = &self.config.base_dir;
        let location = include.location.as_str();

        match include.kind {
            IncludeKind::Copy => match &include.source {
                Some(source) => site.include_copy_from(location, source, base)?,
                None => site.include_copy(location, base)?,
            },
            IncludeKind::Page => {
                let template = include.template.as_deref().unwrap_or_default();
                let mut page = TemplatePage::new(PathBuf::from(template));
                if let Some(toc) = &include.toc {
                    page = page.with_toc(toc);
                }
                for (key, value) in &include.props {
                    page = page.with_prop(key, value.as_str());
                }
                site.include_in(location, page, base)?;
            }
            IncludeKind::Markdown => {
                let source = include.source.as_deref().unwrap_or_default();
                let mut page = MarkdownPage::open_in(base, source)?;
                if page.is_draft() && !self.drafts {
                    debug!(location, source, "skipping draft");
                    return Ok(false);
                }
                if let Some(template) = &include.template {
                    page = page.with_template(PathBuf::from(template));
                }
                for (key, value) in &include.props {
                    page = page.with_prop(key, value.as_str());
                }
                site.include_in(location, page, base)?;
            }
            IncludeKind::Rss => {
                let collection = site.at(include.collection.as_deref().unwrap_or_default())?;
                site.include_in(location, RssFeed::new(&collection), base)?;
            }
            IncludeKind::Atom => {
                let collection = site.at(include.collection.as_deref().unwrap_or_default())?;
                site.include_in(location, AtomFeed::new(&collection), base)?;
            }
        }

        debug!(location, kind = ?include.kind, "registered include");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use lightsite_core::CoreError;

    use super::*;

    fn project(includes: &str) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/style.css"), "body {}").unwrap();
        fs::write(dir.path().join("index.html"), "{{ toc }}").unwrap();
        fs::write(dir.path().join("posts/1.md"), "---\ntitle: One\n---\nfirst").unwrap();
        fs::write(
            dir.path().join("posts/2.md"),
            "---\ntitle: Two\ndraft: true\n---\nsecond",
        )
        .unwrap();

        let toml = format!("[site]\nurl = \"https://example.org/\"\ntitle = \"Blog\"\n\n{includes}");
        let path = dir.path().join("lightsite.toml");
        fs::write(&path, toml).unwrap();
        let config = Config::load(&path).unwrap();
        (dir, config)
    }

    const INCLUDES: &str = r#"
[[include]]
location = "index.html"
kind = "page"
template = "index.html"
toc = "posts"

[[include]]
location = "static"
kind = "copy"

[[include]]
location = "posts/1.html"
kind = "markdown"
source = "posts/1.md"

[[include]]
location = "posts/2.html"
kind = "markdown"
source = "posts/2.md"

[[include]]
location = "feed.xml"
kind = "rss"
collection = "posts"
"#;

    #[test]
    fn test_load_registers_in_order() {
        let (dir, config) = project(INCLUDES);
        let site = SiteLoader::new(&config).load().unwrap();

        let locations: Vec<_> = site.items().map(|(location, _)| location).collect();
        assert_eq!(locations, vec!["index.html", "static", "posts/1.html", "feed.xml"]);
        assert!(site.content().iter().all(|entry| entry.cwd() == config.base_dir));
        assert_eq!(config.base_dir, std::path::absolute(dir.path()).unwrap());
    }

    #[test]
    fn test_drafts_override() {
        let (_dir, config) = project(INCLUDES);
        let site = SiteLoader::new(&config).with_drafts(true).load().unwrap();
        assert!(site.content().contains("posts/2.html"));
    }

    #[test]
    fn test_feed_before_collection_is_not_found() {
        let (_dir, config) = project(
            r#"
[[include]]
location = "feed.xml"
kind = "atom"
collection = "posts"
"#,
        );
        let err = SiteLoader::new(&config).load().unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_missing_source() {
        let (_dir, config) = project(
            r#"
[[include]]
location = "gone.html"
kind = "markdown"
source = "posts/gone.md"
"#,
        );
        assert!(matches!(
            SiteLoader::new(&config).load(),
            Err(CoreError::SourceNotFound(_))
        ));
    }
}
