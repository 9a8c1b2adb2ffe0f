//! Lightsite CLI Library
//!
//! Command implementations for the Lightsite binary, exposed as a library so
//! they can be tested and reused.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, check)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use lightsite::cmd;
//!
//! // Build the site declared in lightsite.toml
//! cmd::build::run(Path::new("lightsite.toml"), None, None, false).unwrap();
//! ```

pub mod cmd;

// Re-export core types for convenience
pub use lightsite_core::{Config, Site};
pub use lightsite_generator::{BuildStats, Builder, SiteLoader};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level(verbose).into()))
        .init();
}

fn level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level(0), tracing::Level::WARN);
        assert_eq!(level(1), tracing::Level::INFO);
        assert_eq!(level(2), tracing::Level::DEBUG);
        assert_eq!(level(7), tracing::Level::TRACE);
    }
}
