//! HTML template system for pages.
//!
//! A lightweight template system using string interpolation rather than a
//! full template engine. Variables are written `{{ name }}`; `{{ name? }}`
//! renders an empty string when the variable is missing.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use lightsite_core::{ContentCollection, GenContext, GenPath};
use thiserror::Error;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Template file not found.
    #[error("template not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),

    /// Template file could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables every page can use: `site_title`, `site_url`, `url`,
    /// `location`, `path`, `generated_at` and `version`.
    ///
    /// `location` follows the URL rule (`posts/a.html` is `posts/a`) while
    /// `path` is the output path relative to the output root.
    pub fn for_page(path: &GenPath, ctx: &GenContext) -> Self {
        let site = ctx.site();
        let mut vars = Self::new()
            .with_var("site_url", site.url())
            .with_var("url", path.url())
            .with_var("location", path.location())
            .with_var("path", path.to_string())
            .with_var("generated_at", ctx.generated_at().to_rfc3339())
            .with_var("version", ctx.tool_version());
        if let Some(title) = site.title() {
            vars.insert("site_title", title);
        }
        vars
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create context with initial variables.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Check if a variable exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }
}

/// A simple template that supports variable interpolation.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    /// Create a new template with the given name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a template file; the file path becomes its name.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TemplateError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), content))
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with the given context.
    ///
    /// Substituted values are not scanned for placeholders again.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut result = self.content.clone();
        let mut pos = 0;

        while let Some(start) = result[pos..].find("{{") {
            let start = pos + start;
            let end = result[start..]
                .find("}}")
                .ok_or_else(|| TemplateError::InvalidSyntax("unclosed {{ delimiter".to_string()))?;
            let end = start + end + 2;

            let var_name = result[start + 2..end - 2].trim();
            let (var_name, optional) = match var_name.strip_suffix('?') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (var_name, false),
            };

            let value = match context.get(var_name) {
                Some(v) => v.to_string(),
                None if optional => String::new(),
                None => return Err(TemplateError::MissingVariable(var_name.to_string())),
            };

            result.replace_range(start..end, &value);
            pos = start + value.len();
        }

        Ok(result)
    }
}

/// Where a page finds its template.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// A file, resolved against the directory of the including group.
    File(PathBuf),
    /// A template held in memory.
    Inline(Template),
}

impl TemplateSource {
    /// Load the template for a write running in `ctx`.
    pub fn load(&self, ctx: &GenContext) -> Result<Template> {
        match self {
            Self::File(path) => Template::load(&ctx.resolve(path)),
            Self::Inline(template) => Ok(template.clone()),
        }
    }
}

impl From<Template> for TemplateSource {
    fn from(template: Template) -> Self {
        Self::Inline(template)
    }
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&str> for TemplateSource {
    fn from(path: &str) -> Self {
        Self::File(PathBuf::from(path))
    }
}

/// An HTML list linking every item of the collection at `collection`.
///
/// Item URLs come from the frozen task list; titles from entry info, falling
/// back to the location. Subsites are skipped.
pub fn toc_html(ctx: &GenContext, collection: &str) -> lightsite_core::Result<String> {
    let collection = ctx.site().at(collection)?;
    let mut html = String::from("<ul class=\"toc\">\n");
    for entry in collection.content() {
        let Some(content) = entry.content() else {
            continue;
        };
        let location = collection.full_location(entry.location());
        let url = ctx
            .find_task(&location)
            .map(|task| task.url())
            .unwrap_or_else(|| ctx.site().url_for(&location));
        let title = content
            .entry()
            .and_then(|info| info.title)
            .unwrap_or_else(|| entry.location().to_string());
        html.push_str(&format!(
            "    <li><a href=\"{}\">{}</a></li>\n",
            escape_html(&url),
            escape_html(&title)
        ));
    }
    html.push_str("</ul>");
    Ok(html)
}

/// Escape special HTML characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Default template for Markdown pages.
pub const DEFAULT_MARKDOWN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ lang? }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title? }}</title>
    <meta name="description" content="{{ summary? }}">
    <link rel="canonical" href="{{ url }}">
    <meta name="generator" content="lightsite {{ version }}">
</head>
<body>
    <header><a href="{{ site_url }}">{{ site_title? }}</a></header>
    <main>
        <article>
            <h1>{{ title? }}</h1>
            <time datetime="{{ created? }}">{{ created? }}</time>
            {{ content }}
        </article>
    </main>
</body>
</html>
"#;
