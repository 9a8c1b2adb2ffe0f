//! CLI command implementations.

pub mod build;
pub mod check;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use lightsite_core::{Config, Site};
use lightsite_generator::SiteLoader;

/// Load the configuration and register every include of the site.
pub(crate) fn load_site(config_path: &Path, drafts: bool) -> Result<(Config, Site)> {
    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    let site = SiteLoader::new(&config)
        .with_drafts(drafts || config.build.drafts)
        .load()
        .wrap_err("Failed to register site content")?;
    Ok((config, site))
}
