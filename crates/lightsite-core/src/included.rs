//! The content registry.
//!
//! [`Includes`] keeps every `(location, content, cwd)` triple in insertion
//! order, indexed by location for duplicate detection.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::trace;

use crate::{
    collection::ContentCollection,
    content::Content,
    context::{GenContext, GenTask},
    error::{CoreError, Result},
    path::{normalize, to_slash},
    site::Site,
};

/// What a registry entry holds.
#[derive(Clone)]
pub enum Included {
    /// Content written as a single task.
    Content(Arc<dyn Content>),

    /// A child site expanded into one task per included content, re-rooted
    /// under the entry's location.
    Site(Arc<Site>),
}

impl Included {
    /// The content, unless this is a subsite.
    pub fn content(&self) -> Option<&Arc<dyn Content>> {
        match self {
            Self::Content(content) => Some(content),
            Self::Site(_) => None,
        }
    }
}

impl fmt::Debug for Included {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(content) => f.debug_tuple("Content").field(content).finish(),
            Self::Site(site) => f.debug_tuple("Site").field(&site.url()).finish(),
        }
    }
}

/// Content included by a site at a location.
///
/// The location never starts with a slash. `cwd` is the directory that was
/// current when the content was included; relative resources of the content
/// resolve against it during generation.
#[derive(Debug, Clone)]
pub struct IncludedContent {
    location: String,
    included: Included,
    cwd: PathBuf,
}

impl IncludedContent {
    /// Create an entry, validating and normalizing the location.
    pub fn new(location: &str, included: Included, cwd: impl Into<PathBuf>) -> Result<Self> {
        let normalized = normalize_location(location)?;
        if normalized.is_empty() && matches!(included, Included::Content(_)) {
            return Err(CoreError::invalid_path(location, "content needs a file location"));
        }
        Ok(Self {
            location: normalized,
            included,
            cwd: cwd.into(),
        })
    }

    /// The output location relative to the output root.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The included content or subsite.
    pub fn included(&self) -> &Included {
        &self.included
    }

    /// The content, unless this entry is a subsite.
    pub fn content(&self) -> Option<&Arc<dyn Content>> {
        self.included.content()
    }

    /// The directory that was current at inclusion.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// A copy of this entry at another location.
    fn relocated(&self, location: String) -> Self {
        Self {
            location,
            included: self.included.clone(),
            cwd: self.cwd.clone(),
        }
    }

    /// Convert the entry into generation tasks.
    ///
    /// Content yields exactly one task. A subsite yields the tasks of all of
    /// its entries, recursively, with locations prefixed by this location.
    pub fn make_tasks(&self, ctx: &GenContext) -> Result<Vec<GenTask>> {
        match &self.included {
            Included::Content(content) => Ok(vec![GenTask::new(
                ctx.path(&self.location)?,
                Arc::clone(content),
                self.cwd.clone(),
            )]),
            Included::Site(site) => {
                let mut tasks = Vec::new();
                for child in site.content().iter() {
                    let location = join_location(&self.location, &child.location);
                    trace!(subsite = %self.location, location = %location, "expanding subsite entry");
                    tasks.extend(child.relocated(location).make_tasks(ctx)?);
                }
                Ok(tasks)
            }
        }
    }
}

/// An insertion-ordered collection of included content.
#[derive(Debug, Clone, Default)]
pub struct Includes {
    entries: Vec<IncludedContent>,
    by_location: HashMap<String, usize>,
}

impl Includes {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Include content at a location.
    ///
    /// Fails with [`CoreError::AbsoluteLocation`] for a leading `/` and with
    /// [`CoreError::DuplicateLocation`] when the location is taken. A rejected
    /// add leaves the registry unchanged.
    pub fn add(&mut self, location: &str, included: Included, cwd: impl Into<PathBuf>) -> Result<()> {
        self.add_entry(IncludedContent::new(location, included, cwd)?)
    }

    /// Insert a pre-built entry.
    pub fn add_entry(&mut self, entry: IncludedContent) -> Result<()> {
        if self.by_location.contains_key(&entry.location) {
            return Err(CoreError::duplicate(entry.location));
        }
        self.by_location
            .insert(entry.location.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Whether content is included at the location.
    pub fn contains(&self, location: &str) -> bool {
        self.by_location.contains_key(location)
    }

    /// The entry at an exact location.
    pub fn get(&self, location: &str) -> Result<&IncludedContent> {
        let key = normalize_location(location.trim_start_matches('/'))?;
        self.by_location
            .get(&key)
            .map(|&index| &self.entries[index])
            .ok_or_else(|| CoreError::not_found(location))
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, IncludedContent> {
        self.entries.iter()
    }

    /// `(location, included)` pairs in insertion order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &Included)> {
        self.entries
            .iter()
            .map(|entry| (entry.location.as_str(), &entry.included))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was included.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by their `cwd`, groups in first-encounter order.
    pub fn group_by_cwd(&self) -> Vec<(&Path, Vec<&IncludedContent>)> {
        group_ordered(&self.entries, |entry| entry.cwd.as_path())
    }

    /// Entries strictly below `prefix`, with locations rewritten relative to it.
    ///
    /// Matching is by whole path segments: `post` does not match `posts/x`.
    /// An empty result is reported as [`CoreError::NotFound`].
    pub fn slice(&self, prefix: &str) -> Result<Includes> {
        let prefix_norm = normalize_location(prefix.trim_matches('/'))?;
        let prefix_parts = segments(&prefix_norm);

        let mut sliced = Includes::new();
        for entry in &self.entries {
            let parts = segments(&entry.location);
            if parts.len() > prefix_parts.len() && parts[..prefix_parts.len()] == prefix_parts[..] {
                let rewritten = parts[prefix_parts.len()..].join("/");
                sliced.add_entry(entry.relocated(rewritten))?;
            }
        }

        if sliced.is_empty() {
            return Err(CoreError::not_found(prefix));
        }
        Ok(sliced)
    }
}

impl<'a> IntoIterator for &'a Includes {
    type Item = &'a IncludedContent;
    type IntoIter = std::slice::Iter<'a, IncludedContent>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Validate a location and normalize it to slash-separated segments.
pub fn normalize_location(location: &str) -> Result<String> {
    if location.starts_with('/') {
        return Err(CoreError::AbsoluteLocation {
            location: location.to_string(),
        });
    }
    Ok(to_slash(&normalize(Path::new(location))?))
}

/// Join two locations, either of which may be empty.
pub fn join_location(prefix: &str, location: &str) -> String {
    match (prefix.is_empty(), location.is_empty()) {
        (true, _) => location.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}/{location}"),
    }
}

fn segments(location: &str) -> Vec<&str> {
    location.split('/').filter(|s| !s.is_empty()).collect()
}

/// Group items by a directory key, preserving first-encounter order of the
/// groups and insertion order within each group.
pub(crate) fn group_ordered<'a, T>(
    items: &'a [T],
    key: impl Fn(&'a T) -> &'a Path,
) -> Vec<(&'a Path, Vec<&'a T>)> {
    let mut index: HashMap<&Path, usize> = HashMap::new();
    let mut groups: Vec<(&Path, Vec<&T>)> = Vec::new();
    for item in items {
        let dir = key(item);
        match index.get(dir) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(dir, groups.len());
                groups.push((dir, vec![item]));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::GenPath;

    #[derive(Debug)]
    struct Noop;

    impl Content for Noop {
        fn write(&self, _path: &GenPath, _ctx: &GenContext) -> Result<()> {
            Ok(())
        }
    }

    fn noop() -> Included {
        Included::Content(Arc::new(Noop))
    }

    fn registry(locations: &[&str]) -> Includes {
        let mut includes = Includes::new();
        for location in locations {
            includes.add(location, noop(), "/src").unwrap();
        }
        includes
    }

    #[test]
    fn test_duplicate_rejected_and_registry_unchanged() {
        let mut includes = registry(&["index.html", "posts/1.html"]);
        let err = includes.add("posts/1.html", noop(), "/elsewhere").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateLocation { ref location } if location == "posts/1.html"));
        assert_eq!(includes.len(), 2);
        assert_eq!(includes.get("posts/1.html").unwrap().cwd(), Path::new("/src"));

        // Normalized spellings collide too.
        assert!(includes.add("./posts//1.html", noop(), "/src").is_err());
        assert_eq!(includes.len(), 2);
    }

    #[test]
    fn test_absolute_location_rejected() {
        let mut includes = Includes::new();
        let err = includes.add("/etc", noop(), "/src").unwrap_err();
        assert!(matches!(err, CoreError::AbsoluteLocation { .. }));
        assert!(includes.is_empty());
    }

    #[test]
    fn test_escaping_location_rejected() {
        let mut includes = Includes::new();
        assert!(matches!(
            includes.add("../outside.html", noop(), "/src"),
            Err(CoreError::PathEscape { .. })
        ));
        assert!(includes.add("", noop(), "/src").is_err());
    }

    #[test]
    fn test_contains_and_insertion_order() {
        let includes = registry(&["b.html", "a.html", "c/d.css"]);
        assert!(includes.contains("a.html"));
        assert!(!includes.contains("d.css"));
        let order: Vec<_> = includes.iter().map(IncludedContent::location).collect();
        assert_eq!(order, vec!["b.html", "a.html", "c/d.css"]);
    }

    #[test]
    fn test_slice_by_segments() {
        let includes = registry(&["a/x", "a/y", "b/z"]);

        let sliced = includes.slice("a").unwrap();
        let locations: Vec<_> = sliced.items().map(|(loc, _)| loc).collect();
        assert_eq!(locations, vec!["x", "y"]);

        assert!(matches!(includes.slice("ab"), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn test_slice_is_not_string_prefix() {
        let includes = registry(&["posts/x.html", "post.html"]);
        assert!(matches!(includes.slice("post"), Err(CoreError::NotFound { .. })));
        assert_eq!(includes.slice("posts").unwrap().len(), 1);
    }

    #[test]
    fn test_slice_excludes_entry_at_prefix() {
        let includes = registry(&["posts", "posts/dev/1.html"]);
        let sliced = includes.slice("posts/").unwrap();
        let locations: Vec<_> = sliced.items().map(|(loc, _)| loc).collect();
        assert_eq!(locations, vec!["dev/1.html"]);

        assert_eq!(includes.slice("posts/dev").unwrap().len(), 1);
    }

    #[test]
    fn test_get_not_found() {
        let includes = registry(&["index.html"]);
        assert!(includes.get("index.html").is_ok());
        assert!(includes.get("/index.html").is_ok());
        assert!(matches!(includes.get("missing.html"), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn test_group_by_cwd_keeps_encounter_order() {
        let mut includes = Includes::new();
        includes.add("1", noop(), "/b").unwrap();
        includes.add("2", noop(), "/a").unwrap();
        includes.add("3", noop(), "/b").unwrap();

        let groups = includes.group_by_cwd();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Path::new("/b"));
        let first: Vec<_> = groups[0].1.iter().map(|e| e.location()).collect();
        assert_eq!(first, vec!["1", "3"]);
        assert_eq!(groups[1].0, Path::new("/a"));
    }

    #[test]
    fn test_join_location() {
        assert_eq!(join_location("", "a.html"), "a.html");
        assert_eq!(join_location("blog", ""), "blog");
        assert_eq!(join_location("blog", "a.html"), "blog/a.html");
    }
}
