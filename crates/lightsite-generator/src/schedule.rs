//! Task execution.
//!
//! Frozen tasks are partitioned by the directory they were included from.
//! Groups run one after another in encounter order; the writes of one group
//! run concurrently on a bounded rayon pool. A group starts only after every
//! write of the previous group has returned.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    time::Instant,
};

use lightsite_core::{CoreError, GenContext, GenTask, Phase};
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

/// A write that failed, attributed to its task.
#[derive(Debug)]
pub struct TaskFailure {
    /// Include location of the task.
    pub location: String,

    /// Directory the task ran in.
    pub cwd: PathBuf,

    /// What went wrong.
    pub error: CoreError,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (from {}): {}", self.location, self.cwd.display(), self.error)
    }
}

/// Outcome of executing every group.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Number of groups executed.
    pub groups: usize,

    /// Tasks that wrote successfully.
    pub written: usize,

    /// Tasks that failed, in group order.
    pub failures: Vec<TaskFailure>,

    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionReport {
    /// Whether every task succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs frozen tasks group by group on a worker pool.
#[derive(Debug)]
pub struct Scheduler {
    pool: rayon::ThreadPool,
}

impl Scheduler {
    /// Create a scheduler running at most `workers` writes at a time.
    /// Zero uses the available parallelism.
    pub fn new(workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lightsite-write-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Execute every task of an executing context.
    ///
    /// Failures are collected, never propagated: every group runs.
    pub fn execute(&self, ctx: &GenContext) -> lightsite_core::Result<ExecutionReport> {
        if ctx.phase() != Phase::Executing {
            return Err(CoreError::PhaseViolation {
                expected: Phase::Executing,
                actual: ctx.phase(),
            });
        }

        let start = Instant::now();
        let groups = ctx.tasks_by_cwd();
        let mut report = ExecutionReport {
            groups: groups.len(),
            ..ExecutionReport::default()
        };

        info!(
            tasks = ctx.tasks().len(),
            groups = groups.len(),
            workers = self.workers(),
            "executing generation tasks"
        );

        for (index, (dir, tasks)) in groups.into_iter().enumerate() {
            ctx.enter_dir(dir);
            debug!(group = index, dir = %dir.display(), tasks = tasks.len(), "running group");

            let results: Vec<_> = self.pool.install(|| {
                tasks
                    .par_iter()
                    .map(|task| (*task, run_task(task, ctx)))
                    .collect()
            });

            for (task, result) in results {
                match result {
                    Ok(()) => report.written += 1,
                    Err(error) => {
                        warn!(location = %task.location(), error = %error, "task failed");
                        report.failures.push(TaskFailure {
                            location: task.location(),
                            cwd: task.cwd.clone(),
                            error,
                        });
                    }
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            written = report.written,
            failed = report.failures.len(),
            duration_ms = report.duration_ms,
            "generation tasks finished"
        );
        Ok(report)
    }
}

fn run_task(task: &GenTask, ctx: &GenContext) -> lightsite_core::Result<()> {
    trace!(location = %task.location(), "writing");
    match panic::catch_unwind(AssertUnwindSafe(|| task.run(ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(CoreError::render(task.location(), format!("write panicked: {message}")))
        }
    }
}
