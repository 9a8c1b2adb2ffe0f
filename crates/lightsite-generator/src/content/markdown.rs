//! Markdown pages.
//!
//! A Markdown file with optional YAML or TOML frontmatter, rendered with
//! pulldown-cmark and placed into a template. Relative links to other
//! included Markdown sources are rewritten to the URL of the page generated
//! from them, so `[next](2.md)` works in the sources and on the site.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use lightsite_core::{
    Content, ContentCollection, CoreError, EntryInfo, Frontmatter, GenContext, GenPath, Result,
    frontmatter::parse_frontmatter, path::clean,
};
use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use tracing::{debug, trace};
use url::Url;

use super::page::{Prop, apply_props};
use crate::template::{
    DEFAULT_MARKDOWN_TEMPLATE, Template, TemplateContext, TemplateSource, escape_html,
};

/// Marks the end of the preview part of a document.
pub const PREVIEW_MARKER: &str = "<!--preview-->";

/// A page generated from a Markdown file.
#[derive(Debug, Clone)]
pub struct MarkdownPage {
    source: PathBuf,
    frontmatter: Frontmatter,
    body: String,
    template: Option<TemplateSource>,
    props: BTreeMap<String, Prop>,
}

/// Markdown rendered to HTML.
#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    /// The document body.
    pub html: String,

    /// Everything before the preview marker, if the document has one.
    pub preview_html: Option<String>,

    /// Headings down to level 3, as `(level, slug, text)`.
    pub toc: Vec<(u8, String, String)>,
}

impl MarkdownPage {
    /// Read a Markdown file relative to the process working directory.
    pub fn open(source: impl Into<PathBuf>) -> Result<Self> {
        let base = std::env::current_dir()?;
        Self::open_in(&base, source)
    }

    /// Read a Markdown file relative to `base`.
    ///
    /// `source` is kept as given; links and template lookups resolve against
    /// the including directory, which should be `base`.
    pub fn open_in(base: &Path, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let full = base.join(&source);
        if !full.is_file() {
            return Err(CoreError::SourceNotFound(full));
        }
        let text = std::fs::read_to_string(&full)?;
        Self::parse(source, &text)
    }

    /// Parse Markdown text read from `source`.
    pub fn parse(source: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let source = source.into();
        let (frontmatter, body) = parse_frontmatter(text, &source)?;
        let template = frontmatter
            .template
            .as_deref()
            .map(|t| TemplateSource::File(PathBuf::from(t)));
        Ok(Self {
            source,
            frontmatter,
            body,
            template,
            props: BTreeMap::new(),
        })
    }

    /// Render through `template` instead of the built-in one.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<TemplateSource>) -> Self {
        self.template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.props.insert(key.into(), prop.into());
        self
    }

    pub fn frontmatter(&self) -> &Frontmatter {
        &self.frontmatter
    }

    pub fn is_draft(&self) -> bool {
        self.frontmatter.draft
    }

    /// Render the body, rewriting links against the tasks of `ctx`.
    pub fn render(&self, ctx: &GenContext) -> RenderedMarkdown {
        let own_dir = ctx
            .resolve(&self.source)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let events: Vec<Event<'_>> = Parser::new_ext(&self.body, options()).collect();
        let headings = collect_headings(&events);
        let mut slugs = headings.iter().map(|(_, slug, _)| slug.clone());

        let events = events.into_iter().map(|event| match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = match rewrite_link(&dest_url, &own_dir, ctx) {
                    Some(url) => {
                        trace!(from = %dest_url, to = %url, "rewrote link");
                        CowStr::from(url)
                    }
                    None => dest_url,
                };
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                })
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let slug = slugs.next();
                Event::Start(Tag::Heading {
                    level,
                    id: id.or_else(|| slug.map(CowStr::from)),
                    classes,
                    attrs,
                })
            }
            other => other,
        });

        let mut body = String::new();
        html::push_html(&mut body, events);

        let preview_html = body
            .split_once(PREVIEW_MARKER)
            .map(|(preview, _)| preview.to_string());
        let toc = headings
            .into_iter()
            .filter(|(level, _, _)| *level <= 3)
            .collect();

        RenderedMarkdown {
            html: body,
            preview_html,
            toc,
        }
    }

    fn template_vars(&self, path: &GenPath, ctx: &GenContext, rendered: &RenderedMarkdown) -> TemplateContext {
        let fm = &self.frontmatter;
        let mut vars = TemplateContext::for_page(path, ctx);

        for (key, value) in &fm.extra {
            if let Some(value) = scalar_string(value) {
                vars.insert(key.clone(), value);
            }
        }
        if let Some(language) = &ctx.site().info().language {
            vars.insert("lang", language.clone());
        }
        if let Some(title) = &fm.title {
            vars.insert("title", title.clone());
        }
        if let Some(summary) = &fm.summary {
            vars.insert("summary", summary.clone());
        }
        if let Some(created) = fm.created {
            vars.insert("created", created.to_rfc3339());
        }
        if let Some(updated) = fm.updated {
            vars.insert("updated", updated.to_rfc3339());
        }
        if !fm.tags.is_empty() {
            vars.insert("tags", fm.tags.join(", "));
        }
        if let Some(preview) = &rendered.preview_html {
            vars.insert("preview", preview.clone());
        }
        if !rendered.toc.is_empty() {
            vars.insert("toc", toc_list(&rendered.toc));
        }
        vars.insert("content", rendered.html.clone());
        vars
    }
}

impl Content for MarkdownPage {
    fn write(&self, path: &GenPath, ctx: &GenContext) -> Result<()> {
        let render_err = |e: crate::template::TemplateError| CoreError::render(path.to_string(), e.to_string());
        let template = match &self.template {
            Some(source) => source.load(ctx).map_err(render_err)?,
            None => Template::new("markdown", DEFAULT_MARKDOWN_TEMPLATE),
        };

        let rendered = self.render(ctx);
        let mut vars = self.template_vars(path, ctx, &rendered);
        apply_props(&mut vars, &self.props, ctx);

        let html = template.render(&vars).map_err(render_err)?;
        path.create(html)?;
        debug!(location = %path, source = %self.source.display(), "rendered markdown");
        Ok(())
    }

    fn entry(&self) -> Option<EntryInfo> {
        Some(self.frontmatter.entry())
    }

    fn source(&self) -> Option<&Path> {
        Some(&self.source)
    }
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// The URL a relative link points to once generated, if it targets a task.
fn rewrite_link(dest: &str, own_dir: &Path, ctx: &GenContext) -> Option<String> {
    if dest.is_empty() || dest.starts_with('#') || dest.starts_with('/') || Url::parse(dest).is_ok() {
        return None;
    }
    let (target, fragment) = match dest.split_once('#') {
        Some((target, fragment)) => (target, Some(fragment)),
        None => (dest, None),
    };

    let url = if target.ends_with(".md") {
        ctx.task_by_source(clean(&own_dir.join(target)))?.url()
    } else {
        ctx.find_task(target)?.url()
    };
    Some(match fragment {
        Some(fragment) => format!("{url}#{fragment}"),
        None => url,
    })
}

/// Headings in document order with unique slugs. An explicit `{#id}`
/// attribute is kept as the heading's slug.
fn collect_headings(events: &[Event<'_>]) -> Vec<(u8, String, String)> {
    let mut headings = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<(HeadingLevel, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((*level, id.as_ref().map(|id| id.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, heading)) = current.as_mut() {
                    heading.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, id, text)) = current.take() {
                    let slug = match id {
                        Some(id) => {
                            *seen.entry(id.clone()).or_insert(0) += 1;
                            id
                        }
                        None => {
                            let base = slug_from_str(&text);
                            let count = seen.entry(base.clone()).or_insert(0);
                            let slug = if *count == 0 {
                                base
                            } else {
                                format!("{base}-{count}")
                            };
                            *count += 1;
                            slug
                        }
                    };
                    headings.push((level as u8, slug, text));
                }
            }
            _ => {}
        }
    }
    headings
}

/// Generate a URL-safe slug from a string.
fn slug_from_str(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn toc_list(toc: &[(u8, String, String)]) -> String {
    let mut html = String::from("<ul id=\"table-of-contents\">\n");
    for (level, slug, text) in toc {
        html.push_str(&format!(
            "    <li class=\"toc-h{level}\"><a href=\"#{slug}\">{}</a></li>\n",
            escape_html(text)
        ));
    }
    html.push_str("</ul>");
    html
}

fn scalar_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
