//! Build command - generates the static site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr, bail};
use lightsite_generator::{BuildError, Builder};

use super::load_site;

/// Run the build command.
///
/// `output` and `workers` override the configured values.
pub fn run(config_path: &Path, output: Option<&Path>, workers: Option<usize>, drafts: bool) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, ?workers, drafts, "Starting build");

    let (config, site) = load_site(config_path, drafts)?;
    let output = output.map_or_else(|| config.output_dir(), Path::to_path_buf);
    let workers = workers.unwrap_or(config.build.workers);

    let builder = Builder::new(site, &output).with_workers(workers);
    let stats = match builder.build() {
        Ok(stats) => stats,
        Err(BuildError::TasksFailed { failures, stats }) => {
            println!();
            println!("  Build failed: {} of {} tasks", stats.failed, stats.tasks);
            println!();
            for failure in &failures {
                println!("  ✗ {failure}");
            }
            println!();
            bail!("{} task(s) failed", failures.len());
        }
        Err(e) => return Err(e).wrap_err("Build failed"),
    };

    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Tasks:      {}", stats.tasks);
    println!("  Groups:     {}", stats.groups);
    println!();
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", output.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}
