//! File and directory copies.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use lightsite_core::{Content, CoreError, GenContext, GenPath, Result};
use tracing::debug;
use walkdir::WalkDir;

/// Copies a single file to the output location.
#[derive(Debug, Clone)]
pub struct FileCopy {
    source: PathBuf,
}

impl FileCopy {
    /// Copy `source`, resolved against the including directory at write time.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }
}

impl Content for FileCopy {
    fn write(&self, path: &GenPath, ctx: &GenContext) -> Result<()> {
        let source = ctx.resolve(&self.source);
        if !source.is_file() {
            return Err(CoreError::SourceNotFound(source));
        }
        path.parent().create_dir_all()?;
        fs::copy(&source, path.real_path())?;
        debug!(from = %source.display(), to = %path, "copied file");
        Ok(())
    }
}

/// Copies a directory tree to the output location.
#[derive(Debug, Clone)]
pub struct DirectoryCopy {
    source: PathBuf,
}

impl DirectoryCopy {
    /// Copy the tree at `source`, resolved against the including directory
    /// at write time.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }
}

impl Content for DirectoryCopy {
    fn write(&self, path: &GenPath, ctx: &GenContext) -> Result<()> {
        let source = ctx.resolve(&self.source);
        if !source.is_dir() {
            return Err(CoreError::SourceNotFound(source));
        }

        path.create_dir_all()?;
        let mut copied = 0usize;
        for entry in WalkDir::new(&source).follow_links(true) {
            let entry = entry.map_err(|e| CoreError::Io(e.into()))?;
            let relative = entry
                .path()
                .strip_prefix(&source)
                .map_err(|_| CoreError::invalid_path(entry.path().display().to_string(), "outside copied tree"))?;
            if relative.as_os_str().is_empty() {
                continue;
            }

            let target = path.join(relative)?;
            if entry.file_type().is_dir() {
                target.create_dir_all()?;
            } else {
                fs::copy(entry.path(), target.real_path())?;
                copied += 1;
            }
        }

        debug!(from = %source.display(), to = %path, files = copied, "copied directory");
        Ok(())
    }
}

/// A copy of whatever is at `source`: a [`FileCopy`] for a file, a
/// [`DirectoryCopy`] for a directory.
///
/// The source is checked against the process working directory now and
/// resolved against the including directory when written.
pub fn copy(source: impl Into<PathBuf>) -> Result<Arc<dyn Content>> {
    let base = std::env::current_dir()?;
    copy_in(&base, source)
}

/// Like [`copy`], checking the source against `base`.
pub fn copy_in(base: &Path, source: impl Into<PathBuf>) -> Result<Arc<dyn Content>> {
    let source = source.into();
    let resolved = base.join(&source);
    if resolved.is_file() {
        Ok(Arc::new(FileCopy::new(source)))
    } else if resolved.is_dir() {
        Ok(Arc::new(DirectoryCopy::new(source)))
    } else {
        Err(CoreError::SourceNotFound(resolved))
    }
}
