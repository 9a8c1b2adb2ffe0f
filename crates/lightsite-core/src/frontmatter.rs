//! Frontmatter parsing for Markdown sources.

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    content::EntryInfo,
    error::{CoreError, Result},
};

/// Frontmatter metadata of a Markdown file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,

    /// Short summary, used by feeds.
    #[serde(default, alias = "description")]
    pub summary: Option<String>,

    /// Publication date.
    #[serde(default, alias = "date", deserialize_with = "de_datetime")]
    pub created: Option<DateTime<Utc>>,

    /// Last update; falls back to `created`.
    #[serde(default, deserialize_with = "de_datetime")]
    pub updated: Option<DateTime<Utc>>,

    /// Whether this is a draft.
    #[serde(default)]
    pub draft: bool,

    /// Tags for the page.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Template to render with, relative to the including directory.
    #[serde(default)]
    pub template: Option<String>,

    /// Remaining fields, exposed to templates.
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// Delimiter types for frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML frontmatter delimited by `---`.
    Yaml,
    /// TOML frontmatter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split content into frontmatter and body.
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.trim_start();

    let format = if content.starts_with("---") {
        FrontmatterFormat::Yaml
    } else if content.starts_with("+++") {
        FrontmatterFormat::Toml
    } else {
        return None;
    };

    let delimiter = format.delimiter();
    let after_first = &content[delimiter.len()..];
    let closing_pos = after_first.find(delimiter)?;

    let frontmatter = after_first[..closing_pos].trim();
    let body = after_first[closing_pos + delimiter.len()..].trim_start();

    Some((format, frontmatter, body))
}

/// Parse frontmatter from a string, returning it with the remaining body.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let Some((format, fm_str, body)) = split_frontmatter(content) else {
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let mut frontmatter: Frontmatter = match format {
        FrontmatterFormat::Yaml if fm_str.is_empty() => Frontmatter::default(),
        FrontmatterFormat::Yaml => {
            serde_yaml::from_str(fm_str).map_err(|e| CoreError::frontmatter(path, e.to_string()))?
        }
        FrontmatterFormat::Toml => {
            toml::from_str(fm_str).map_err(|e| CoreError::frontmatter(path, e.to_string()))?
        }
    };
    if frontmatter.updated.is_none() {
        frontmatter.updated = frontmatter.created;
    }

    Ok((frontmatter, body.to_string()))
}

impl Frontmatter {
    /// Feed entry data described by this frontmatter.
    pub fn entry(&self) -> EntryInfo {
        EntryInfo {
            title: self.title.clone(),
            summary: self.summary.clone(),
            created: self.created,
            updated: self.updated,
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`; naive values are UTC.
fn de_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_datetime(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {raw}")))
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_split_yaml_frontmatter() {
        let content = r#"---
title: "Hello World"
created: 2024-01-14
---

This is the body content."#;

        let (format, fm, body) = split_frontmatter(content).expect("split");
        assert_eq!(format, FrontmatterFormat::Yaml);
        assert!(fm.contains("title:"));
        assert!(body.starts_with("This is the body"));
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "Just some content without frontmatter.";
        assert!(split_frontmatter(content).is_none());
        let (fm, body) = parse_frontmatter(content, Path::new("a.md")).expect("parse");
        assert!(fm.title.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: "Test Post"
summary: A short one.
created: 2024-01-14 10:00:00
draft: false
tags:
  - rust
  - test
---

Content here."#;

        let (fm, body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");

        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert_eq!(fm.summary.as_deref(), Some("A short one."));
        assert_eq!(
            fm.created,
            Some(Utc.with_ymd_and_hms(2024, 1, 14, 10, 0, 0).unwrap())
        );
        assert_eq!(fm.updated, fm.created);
        assert!(!fm.draft);
        assert_eq!(fm.tags, vec!["rust", "test"]);
        assert_eq!(body, "Content here.");
    }

    #[test]
    fn test_parse_toml_frontmatter() {
        let content = r#"+++
title = "Test Post"
date = "2024-01-14"
updated = "2024-02-01T08:30:00Z"
draft = true
+++

Content here."#;

        let (fm, body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");

        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert!(fm.draft);
        assert_eq!(
            fm.created,
            Some(Utc.with_ymd_and_hms(2024, 1, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(
            fm.updated,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(body, "Content here.");
    }

    #[test]
    fn test_invalid_date_is_frontmatter_error() {
        let content = "---\ntitle: x\ncreated: yesterday\n---\nbody";
        let err = parse_frontmatter(content, Path::new("posts/x.md")).unwrap_err();
        assert!(matches!(err, CoreError::Frontmatter { .. }));
        assert!(err.to_string().contains("posts/x.md"));
    }

    #[test]
    fn test_extra_fields_and_entry() {
        let content = r#"---
title: "Test"
description: "Described"
custom_field: "custom value"
---

Body"#;

        let (fm, _body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");

        assert!(fm.extra.contains_key("custom_field"));
        let entry = fm.entry();
        assert_eq!(entry.title.as_deref(), Some("Test"));
        assert_eq!(entry.summary.as_deref(), Some("Described"));
        assert!(entry.created.is_none());
    }
}
