//! Build orchestration.
//!
//! Freezes the task list of a site, cleans the output directory and runs
//! every task through the [`Scheduler`].

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use lightsite_core::{ContentCollection, CoreError, GenContext, Phase, Site};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::schedule::{Scheduler, TaskFailure};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Registration, configuration or planning error. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// IO error while preparing the output directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool could not be created.
    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// Every group ran, but some writes failed.
    #[error("{} of {} tasks failed", failures.len(), stats.tasks)]
    TasksFailed {
        failures: Vec<TaskFailure>,
        stats: BuildStats,
    },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of tasks planned.
    pub tasks: usize,

    /// Number of directory groups executed.
    pub groups: usize,

    /// Number of tasks written.
    pub written: usize,

    /// Number of failed tasks.
    pub failed: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    site: Arc<Site>,
    output_dir: PathBuf,
    workers: usize,
}

impl Builder {
    /// Create a new builder.
    #[must_use]
    pub fn new(site: impl Into<Arc<Site>>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            site: site.into(),
            output_dir: output_dir.into(),
            workers: 0,
        }
    }

    /// Limit concurrent writes; zero uses the available parallelism.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn site(&self) -> &Arc<Site> {
        &self.site
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// A fresh context, still accepting includes.
    pub fn context(&self) -> Result<GenContext> {
        Ok(GenContext::new(&self.output_dir, Arc::clone(&self.site))?)
    }

    /// A context with its task list frozen, without writing anything.
    pub fn plan(&self) -> Result<GenContext> {
        let ctx = self.context()?;
        ctx.freeze_tasks()?;
        Ok(ctx)
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildStats> {
        self.build_context(self.context()?)
    }

    /// Build with a prepared context.
    ///
    /// A context still building is frozen first. Planning errors return
    /// before the output directory is touched.
    pub fn build_context(&self, ctx: GenContext) -> Result<BuildStats> {
        let start = Instant::now();

        info!(
            output = %ctx.out_root().display(),
            includes = self.site.content().len(),
            "starting build"
        );

        if ctx.phase() == Phase::Building {
            ctx.freeze_tasks()?;
        }

        self.clean_output(ctx.out_root())?;

        let scheduler = Scheduler::new(self.workers)?;
        let report = scheduler.execute(&ctx)?;
        let phase = ctx.finish(!report.is_success())?;

        let stats = BuildStats {
            tasks: ctx.tasks().len(),
            groups: report.groups,
            written: report.written,
            failed: report.failures.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if phase == Phase::Failed {
            warn!(failed = stats.failed, tasks = stats.tasks, "build finished with failures");
            return Err(BuildError::TasksFailed {
                failures: report.failures,
                stats,
            });
        }

        info!(
            tasks = stats.tasks,
            groups = stats.groups,
            duration_ms = stats.duration_ms,
            "build complete"
        );
        Ok(stats)
    }

    /// Clean the output directory.
    fn clean_output(&self, dir: &Path) -> Result<()> {
        if dir.exists() {
            debug!(dir = %dir.display(), "cleaning output directory");
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        Ok(())
    }
}
