//! Site configuration management.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    collection::Author,
    error::{CoreError, Result},
    site::Site,
};

/// Main configuration structure, read from `lightsite.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Content to include, in order.
    #[serde(default, rename = "include")]
    pub includes: Vec<IncludeConfig>,

    /// Directory containing the configuration file. Relative sources and
    /// templates of every include resolve against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public URL of the site, ending with `/`.
    pub url: String,

    /// Site title.
    #[serde(default)]
    pub title: Option<String>,

    /// Site description.
    #[serde(default)]
    pub description: Option<String>,

    /// Icon URL.
    #[serde(default)]
    pub icon_url: Option<String>,

    /// Logo URL.
    #[serde(default)]
    pub logo_url: Option<String>,

    /// Author name.
    #[serde(default)]
    pub author: Option<String>,

    /// Author email.
    #[serde(default)]
    pub author_email: Option<String>,

    /// Language code.
    #[serde(default)]
    pub language: Option<String>,

    /// Copyright notice.
    #[serde(default)]
    pub copyright: Option<String>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Concurrent writes per group; 0 uses the available parallelism.
    #[serde(default)]
    pub workers: usize,

    /// Whether to include Markdown drafts.
    #[serde(default)]
    pub drafts: bool,
}

/// Kinds of content an include entry can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeKind {
    /// Copy a file or a directory.
    Copy,
    /// Render a template.
    Page,
    /// Render a Markdown file through a template.
    Markdown,
    /// RSS feed of a collection.
    Rss,
    /// Atom feed of a collection.
    Atom,
}

/// One `[[include]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludeConfig {
    /// Output location relative to the output directory.
    pub location: String,

    /// Content kind.
    pub kind: IncludeKind,

    /// Source file or directory (copy, markdown).
    #[serde(default)]
    pub source: Option<String>,

    /// Template file (page, markdown).
    #[serde(default)]
    pub template: Option<String>,

    /// Collection path feeding a feed (rss, atom).
    #[serde(default)]
    pub collection: Option<String>,

    /// Collection path listed as a table of contents (page).
    #[serde(default)]
    pub toc: Option<String>,

    /// Extra template variables.
    #[serde(default)]
    pub props: BTreeMap<String, String>,
}

fn default_output_dir() -> String {
    "out".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            workers: 0,
            drafts: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.base_dir = base_dir_of(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration layered with `LIGHTSITE__` environment variables,
    /// e.g. `LIGHTSITE__BUILD__OUTPUT_DIR=dist`.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("LIGHTSITE").separator("__"))
            .build()?;

        let mut config: Config = settings.try_deserialize()?;
        config.base_dir = base_dir_of(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.site.url).map_err(|e| {
            CoreError::config_with_source(format!("site.url is invalid: {}", self.site.url), e)
        })?;
        if url.cannot_be_a_base() || !self.site.url.ends_with('/') {
            return Err(CoreError::config("site.url must be absolute and end with '/'"));
        }

        if self.build.output_dir.is_empty() {
            return Err(CoreError::config("build.output_dir cannot be empty"));
        }

        for include in &self.includes {
            include.validate()?;
        }

        Ok(())
    }

    /// Output directory, resolved against the configuration directory.
    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.build.output_dir)
    }

    /// A site carrying the configured URL and metadata, with nothing included.
    pub fn site(&self) -> Result<Site> {
        let cfg = &self.site;
        let mut site = Site::new(&cfg.url)?;
        if let Some(title) = &cfg.title {
            site = site.with_title(title);
        }
        if let Some(description) = &cfg.description {
            site = site.with_description(description);
        }
        if let Some(icon_url) = &cfg.icon_url {
            site = site.with_icon_url(icon_url);
        }
        if let Some(logo_url) = &cfg.logo_url {
            site = site.with_logo_url(logo_url);
        }
        if cfg.author.is_some() || cfg.author_email.is_some() {
            site = site.with_author(Author {
                name: cfg.author.clone(),
                email: cfg.author_email.clone(),
            });
        }
        if let Some(language) = &cfg.language {
            site = site.with_language(language);
        }
        if let Some(copyright) = &cfg.copyright {
            site = site.with_copyright(copyright);
        }
        Ok(site)
    }
}

impl IncludeConfig {
    fn validate(&self) -> Result<()> {
        let missing = |field: &str| {
            CoreError::config(format!(
                "include \"{}\" of kind {:?} requires `{field}`",
                self.location, self.kind
            ))
        };
        match self.kind {
            IncludeKind::Copy => {}
            IncludeKind::Page if self.template.is_none() => return Err(missing("template")),
            IncludeKind::Markdown if self.source.is_none() => return Err(missing("source")),
            IncludeKind::Rss | IncludeKind::Atom if self.collection.is_none() => {
                return Err(missing("collection"));
            }
            _ => {}
        }
        Ok(())
    }
}

fn base_dir_of(path: &Path) -> Result<PathBuf> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok(std::path::absolute(dir)?)
}
