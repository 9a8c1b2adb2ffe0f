//! Error types for the Lightsite core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::context::Phase;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for Lightsite.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Two includes target the same output location.
    #[error("Site cannot include duplicates. Content at \"{location}\" already present")]
    DuplicateLocation { location: String },

    /// A location starting with `/` was included.
    #[error("Absolute location cannot be included: {location}")]
    AbsoluteLocation { location: String },

    /// A slice or exact-location lookup matched nothing.
    #[error("There is no content at path \"{path}\"")]
    NotFound { path: String },

    /// An include was attempted after the task list was frozen.
    #[error("Cannot include \"{location}\" after generation tasks were frozen")]
    LateRegistration { location: String },

    /// A relative path resolves outside of the output root.
    #[error("Path escapes the output root: {path}")]
    PathEscape { path: String },

    /// A path operation that has no meaning for the given path.
    #[error("Invalid path operation on \"{path}\": {message}")]
    InvalidPath { path: String, message: String },

    /// Site URL rejected at construction.
    #[error("Invalid site URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// A copy or markdown source is missing.
    #[error("Source does not exist: {0}")]
    SourceNotFound(PathBuf),

    /// Generation context used out of order.
    #[error("Generation context is {actual:?}, expected {expected:?}")]
    PhaseViolation { expected: Phase, actual: Phase },

    /// Configuration loading or parsing error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Frontmatter parsing error.
    #[error("Frontmatter error in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },

    /// Content failed to render itself.
    #[error("Render error at \"{location}\": {message}")]
    Render { location: String, message: String },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic configuration crate error.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl CoreError {
    /// Create a duplicate location error.
    pub fn duplicate(location: impl Into<String>) -> Self {
        Self::DuplicateLocation {
            location: location.into(),
        }
    }

    /// Create a not-found error for a lookup path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new frontmatter error.
    pub fn frontmatter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a render error attributed to an output location.
    pub fn render(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised while registering content.
    ///
    /// These abort generation before the output directory is touched.
    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateLocation { .. }
                | Self::AbsoluteLocation { .. }
                | Self::LateRegistration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_error() {
        let err = CoreError::duplicate("posts/a.html");
        assert!(err.to_string().contains("duplicates"));
        assert!(err.to_string().contains("posts/a.html"));
        assert!(err.is_registration());
    }

    #[test]
    fn test_not_found_is_not_registration() {
        let err = CoreError::not_found("posts");
        assert_eq!(err.to_string(), "There is no content at path \"posts\"");
        assert!(!err.is_registration());
    }

    #[test]
    fn test_config_error() {
        let err = CoreError::config("missing field");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_phase_violation_message() {
        let err = CoreError::PhaseViolation {
            expected: Phase::Building,
            actual: Phase::Executing,
        };
        assert!(err.to_string().contains("Executing"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
