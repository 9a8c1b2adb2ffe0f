//! Generation paths.
//!
//! A [`GenPath`] pairs the relative location of an output (as passed to
//! `site.include`) with the output root it is written under and a factory that
//! turns its location into a public URL.
//!
//! ```
//! use std::sync::Arc;
//!
//! use lightsite_core::GenPath;
//!
//! let factory = Arc::new(|location: &str| format!("https://example.org/{location}"));
//! let resources = GenPath::new("resources", "/tmp/out", factory).unwrap();
//! let teapot = resources.join("teapot.txt").unwrap();
//!
//! assert_eq!(teapot.to_string(), "resources/teapot.txt");
//! assert_eq!(teapot.url(), "https://example.org/resources/teapot.txt");
//! ```

use std::{
    fmt,
    fs,
    hash::{Hash, Hasher},
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use crate::error::{CoreError, Result};

/// Builds a full URL from an output location.
pub type UrlFactory = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A path for writing generated content.
///
/// File system operations act on [`GenPath::real_path`]; everything else
/// (display, equality, URL derivation) uses the relative path.
#[derive(Clone)]
pub struct GenPath {
    relative_path: PathBuf,
    out_root: PathBuf,
    url_factory: UrlFactory,
}

impl GenPath {
    /// Create a generation path under `out_root`.
    ///
    /// Fails with [`CoreError::PathEscape`] when the relative path is absolute
    /// or climbs above the root with `..`.
    pub fn new(
        relative_path: impl AsRef<Path>,
        out_root: impl Into<PathBuf>,
        url_factory: UrlFactory,
    ) -> Result<Self> {
        let out_root = out_root.into();
        let out_root = if out_root.is_absolute() {
            out_root
        } else {
            std::path::absolute(&out_root)?
        };
        Ok(Self {
            relative_path: normalize(relative_path.as_ref())?,
            out_root,
            url_factory,
        })
    }

    fn with_relative(&self, relative_path: PathBuf) -> Self {
        Self {
            relative_path,
            out_root: self.out_root.clone(),
            url_factory: Arc::clone(&self.url_factory),
        }
    }

    /// The relative path, free of `.`, `..` and root components.
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// The output directory this path is anchored in.
    pub fn out_root(&self) -> &Path {
        &self.out_root
    }

    /// The absolute file system target.
    pub fn real_path(&self) -> PathBuf {
        self.out_root.join(&self.relative_path)
    }

    /// The file name, empty for the root.
    pub fn name(&self) -> &str {
        self.relative_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Path segments.
    pub fn parts(&self) -> Vec<&str> {
        self.relative_path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect()
    }

    /// The final extension including its dot (`.html`), or an empty string.
    pub fn suffix(&self) -> String {
        match self.relative_path.extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => format!(".{ext}"),
            _ => String::new(),
        }
    }

    /// The parent directory. The root is its own parent.
    pub fn parent(&self) -> GenPath {
        let parent = self
            .relative_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.with_relative(parent)
    }

    /// Append a relative path.
    pub fn join(&self, other: impl AsRef<Path>) -> Result<GenPath> {
        let joined = normalize(&self.relative_path.join(other.as_ref()))?;
        Ok(self.with_relative(joined))
    }

    /// Append the relative part of another generation path.
    pub fn join_path(&self, other: &GenPath) -> Result<GenPath> {
        self.join(&other.relative_path)
    }

    /// Replace the file name.
    pub fn with_name(&self, name: &str) -> Result<GenPath> {
        if self.relative_path.as_os_str().is_empty() {
            return Err(CoreError::invalid_path(self.to_string(), "root has no name"));
        }
        if !is_plain_name(name) {
            return Err(CoreError::invalid_path(
                self.to_string(),
                format!("invalid file name {name:?}"),
            ));
        }
        Ok(self.with_relative(self.relative_path.with_file_name(name)))
    }

    /// Replace the extension; an empty suffix strips it.
    pub fn with_suffix(&self, suffix: &str) -> Result<GenPath> {
        let Some(stem) = self.relative_path.file_stem().and_then(|s| s.to_str()) else {
            return Err(CoreError::invalid_path(self.to_string(), "root has no suffix"));
        };
        let valid = suffix.is_empty()
            || (suffix.len() > 1 && suffix.starts_with('.') && is_plain_name(suffix));
        if !valid {
            return Err(CoreError::invalid_path(
                self.to_string(),
                format!("invalid suffix {suffix:?}"),
            ));
        }
        let name = format!("{stem}{suffix}");
        Ok(self.with_relative(self.relative_path.with_file_name(name)))
    }

    /// The extension-normalized location used for URLs.
    ///
    /// - `posts/index.html` becomes `posts`;
    /// - `about.html` becomes `about`;
    /// - `css/style.css` stays the same;
    /// - the root `index.html` becomes an empty string.
    pub fn location(&self) -> String {
        let loc = if self.name() == "index.html" {
            self.parent()
        } else if self.suffix() == ".html" {
            let stem = self.relative_path.file_stem().map(PathBuf::from);
            let parent = self.relative_path.parent().unwrap_or(Path::new(""));
            self.with_relative(stem.map(|s| parent.join(s)).unwrap_or_default())
        } else {
            self.clone()
        };
        to_slash(&loc.relative_path)
    }

    /// The public URL of this path.
    pub fn url(&self) -> String {
        (self.url_factory)(&self.location())
    }

    /// Whether a file or directory exists at the real path.
    pub fn exists(&self) -> bool {
        self.real_path().exists()
    }

    /// Create the directory at this path along with its parents.
    pub fn create_dir_all(&self) -> Result<()> {
        fs::create_dir_all(self.real_path())?;
        Ok(())
    }

    /// Write `contents` to the real path, creating parent directories and
    /// overwriting any existing file.
    pub fn create(&self, contents: impl AsRef<[u8]>) -> Result<()> {
        self.parent().create_dir_all()?;
        fs::write(self.real_path(), contents)?;
        Ok(())
    }
}

impl fmt::Display for GenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relative_path.as_os_str().is_empty() {
            f.write_str(".")
        } else {
            f.write_str(&to_slash(&self.relative_path))
        }
    }
}

impl fmt::Debug for GenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenPath")
            .field("relative_path", &self.relative_path)
            .field("out_root", &self.out_root)
            .finish_non_exhaustive()
    }
}

impl PartialEq for GenPath {
    fn eq(&self, other: &Self) -> bool {
        self.relative_path == other.relative_path
    }
}

impl Eq for GenPath {}

impl Hash for GenPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relative_path.hash(state);
    }
}

/// Lexically normalize a relative path, rejecting anything that leaves the root.
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => normalized.push(part),
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(CoreError::PathEscape {
                        path: path.display().to_string(),
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(CoreError::PathEscape {
                    path: path.display().to_string(),
                });
            }
        }
    }
    Ok(normalized)
}

/// Lexically clean any path, absolute or not, without touching the disk.
///
/// `..` at the root is dropped.
pub fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if cleaned.file_name().is_some() {
                    cleaned.pop();
                } else if !cleaned.has_root() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// Join path segments with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
