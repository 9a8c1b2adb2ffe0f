//! Generation context and tasks.
//!
//! A run goes through two phases. While [`Phase::Building`], the site's
//! includes are converted into [`GenTask`]s; [`GenContext::freeze_tasks`]
//! stores them once and moves the context to [`Phase::Executing`]. From then
//! on every write sees the same, complete task list.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    collection::ContentCollection,
    content::Content,
    error::{CoreError, Result},
    included::{Included, IncludedContent, group_ordered, normalize_location},
    path::{GenPath, clean},
    site::Site,
};

/// Version string recorded in every context.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// State of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Tasks are being collected.
    Building,
    /// Tasks are frozen, writes are in flight.
    Executing,
    /// Every task succeeded.
    Done,
    /// At least one task failed.
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Building => "building",
            Self::Executing => "executing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One unit of work: write `content` at `path`, resolving relative
/// resources against `cwd`.
#[derive(Debug, Clone)]
pub struct GenTask {
    /// Output path.
    pub path: GenPath,

    /// Content to write.
    pub content: Arc<dyn Content>,

    /// Directory the content was included from.
    pub cwd: PathBuf,
}

impl GenTask {
    /// Create a task.
    pub fn new(path: GenPath, content: Arc<dyn Content>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            path,
            content,
            cwd: cwd.into(),
        }
    }

    /// The include location, e.g. `posts/1.html`.
    pub fn location(&self) -> String {
        self.path.to_string()
    }

    /// Public URL of the output.
    pub fn url(&self) -> String {
        self.path.url()
    }

    /// Absolute path of the content's source file, if it has one.
    pub fn source(&self) -> Option<PathBuf> {
        self.content
            .source()
            .map(|source| clean(&self.cwd.join(source)))
    }

    /// Write the content.
    pub fn run(&self, ctx: &GenContext) -> Result<()> {
        self.content.write(&self.path, ctx)
    }
}

/// The task list with its lookup indexes, built once at freeze.
#[derive(Debug)]
struct FrozenTasks {
    tasks: Vec<GenTask>,
    by_location: HashMap<String, usize>,
    by_source: HashMap<PathBuf, usize>,
}

impl FrozenTasks {
    fn new(tasks: Vec<GenTask>) -> Self {
        let mut by_location = HashMap::with_capacity(tasks.len());
        let mut by_source = HashMap::new();
        for (index, task) in tasks.iter().enumerate() {
            by_location.insert(task.location(), index);
            if let Some(source) = task.source() {
                by_source.entry(source).or_insert(index);
            }
        }
        Self {
            tasks,
            by_location,
            by_source,
        }
    }
}

/// Per-run generation state shared with every content write.
#[derive(Debug)]
pub struct GenContext {
    out_root: PathBuf,
    site: Arc<Site>,
    tasks: OnceLock<FrozenTasks>,
    phase: RwLock<Phase>,
    base_dir: RwLock<PathBuf>,
    pending: Mutex<Vec<IncludedContent>>,
    generated_at: DateTime<Utc>,
    tool_version: &'static str,
}

impl GenContext {
    /// Create a context writing under `out_root`.
    pub fn new(out_root: impl Into<PathBuf>, site: Arc<Site>) -> Result<Self> {
        let out_root = std::path::absolute(out_root.into())?;
        let base_dir = std::env::current_dir()?;
        Ok(Self {
            out_root,
            site,
            tasks: OnceLock::new(),
            phase: RwLock::new(Phase::Building),
            base_dir: RwLock::new(base_dir),
            pending: Mutex::new(Vec::new()),
            generated_at: Utc::now(),
            tool_version: TOOL_VERSION,
        })
    }

    /// Output root of the run.
    pub fn out_root(&self) -> &Path {
        &self.out_root
    }

    /// The site being generated.
    pub fn site(&self) -> &Arc<Site> {
        &self.site
    }

    /// Time the context was created.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Version of the generator.
    pub fn tool_version(&self) -> &str {
        self.tool_version
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// A generation path under the output root, with the site's URL factory.
    pub fn path(&self, relative_path: impl AsRef<Path>) -> Result<GenPath> {
        GenPath::new(relative_path, &self.out_root, self.site.url_factory())
    }

    /// Register extra content for this run.
    ///
    /// Accepted only while building; the entry becomes a task when the task
    /// list is frozen. Afterwards this fails with
    /// [`CoreError::LateRegistration`].
    pub fn include(
        &self,
        location: &str,
        content: Arc<dyn Content>,
        cwd: impl Into<PathBuf>,
    ) -> Result<()> {
        let phase = self.phase.read().unwrap_or_else(PoisonError::into_inner);
        if *phase != Phase::Building {
            return Err(CoreError::LateRegistration {
                location: location.to_string(),
            });
        }
        let entry = IncludedContent::new(location, Included::Content(content), cwd)?;
        debug!(location = %entry.location(), "queued late include");
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }

    /// Convert every include into tasks and store them.
    ///
    /// Runs exactly once per context. Subsites expand into one task per
    /// entry; a location produced twice fails with
    /// [`CoreError::DuplicateLocation`] and leaves the context building.
    pub fn freeze_tasks(&self) -> Result<&[GenTask]> {
        let mut phase = self.phase.write().unwrap_or_else(PoisonError::into_inner);
        if *phase != Phase::Building {
            return Err(CoreError::PhaseViolation {
                expected: Phase::Building,
                actual: *phase,
            });
        }

        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let mut tasks = Vec::with_capacity(self.site.content().len() + pending.len());
        let mut seen = HashSet::new();
        for entry in self.site.content().iter().chain(pending.iter()) {
            for task in entry.make_tasks(self)? {
                if !seen.insert(task.path.relative_path().to_path_buf()) {
                    return Err(CoreError::duplicate(task.location()));
                }
                tasks.push(task);
            }
        }
        drop(pending);

        let count = tasks.len();
        if self.tasks.set(FrozenTasks::new(tasks)).is_err() {
            return Err(CoreError::PhaseViolation {
                expected: Phase::Building,
                actual: Phase::Executing,
            });
        }
        *phase = Phase::Executing;
        info!(tasks = count, out = %self.out_root.display(), "generation tasks frozen");
        Ok(self.tasks())
    }

    /// The frozen task list in include order; empty while building.
    pub fn tasks(&self) -> &[GenTask] {
        self.tasks
            .get()
            .map(|frozen| frozen.tasks.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks grouped by `cwd`, groups in first-encounter order.
    pub fn tasks_by_cwd(&self) -> Vec<(&Path, Vec<&GenTask>)> {
        group_ordered(self.tasks(), |task| task.cwd.as_path())
    }

    /// The task writing the given include location.
    pub fn find_task(&self, location: &str) -> Option<&GenTask> {
        let location = normalize_location(location.trim_start_matches('/')).ok()?;
        let frozen = self.tasks.get()?;
        frozen
            .by_location
            .get(&location)
            .map(|&index| &frozen.tasks[index])
    }

    /// The task whose content was created from `source`.
    ///
    /// Relative sources resolve against the current group directory.
    pub fn task_by_source(&self, source: impl AsRef<Path>) -> Option<&GenTask> {
        let source = clean(&self.resolve(source));
        let frozen = self.tasks.get()?;
        frozen
            .by_source
            .get(&source)
            .map(|&index| &frozen.tasks[index])
    }

    /// Directory relative resources currently resolve against.
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve a resource path against [`Self::base_dir`].
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    /// Switch the base directory to a task group's `cwd`.
    ///
    /// Only the scheduler calls this, between groups, while no write runs.
    pub fn enter_dir(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        debug!(dir = %dir.display(), "entering group directory");
        *self.base_dir.write().unwrap_or_else(PoisonError::into_inner) = dir;
    }

    /// Move an executing context to its terminal phase.
    pub fn finish(&self, failed: bool) -> Result<Phase> {
        let mut phase = self.phase.write().unwrap_or_else(PoisonError::into_inner);
        if *phase != Phase::Executing {
            return Err(CoreError::PhaseViolation {
                expected: Phase::Executing,
                actual: *phase,
            });
        }
        *phase = if failed { Phase::Failed } else { Phase::Done };
        Ok(*phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Author;

    #[derive(Debug)]
    struct Page {
        source: Option<PathBuf>,
    }

    impl Content for Page {
        fn write(&self, path: &GenPath, _ctx: &GenContext) -> Result<()> {
            path.create("page")
        }

        fn source(&self) -> Option<&Path> {
            self.source.as_deref()
        }
    }

    fn page() -> Page {
        Page { source: None }
    }

    fn site() -> Site {
        let mut site = Site::new("https://example.org/")
            .unwrap()
            .with_author(Author::new("Jane", None));
        site.include_in("index.html", page(), "/a").unwrap();
        site.include_in("posts/1.html", page(), "/b").unwrap();
        site.include_in("posts/2.html", page(), "/a").unwrap();
        site
    }

    fn context(site: Site) -> GenContext {
        GenContext::new("/tmp/lightsite-out", Arc::new(site)).unwrap()
    }

    #[test]
    fn test_tasks_empty_until_frozen() {
        let ctx = context(site());
        assert_eq!(ctx.phase(), Phase::Building);
        assert!(ctx.tasks().is_empty());

        let tasks = ctx.freeze_tasks().unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(ctx.phase(), Phase::Executing);

        let locations: Vec<_> = ctx.tasks().iter().map(GenTask::location).collect();
        assert_eq!(locations, vec!["index.html", "posts/1.html", "posts/2.html"]);
    }

    #[test]
    fn test_freeze_only_once() {
        let ctx = context(site());
        ctx.freeze_tasks().unwrap();
        assert!(matches!(
            ctx.freeze_tasks(),
            Err(CoreError::PhaseViolation { actual: Phase::Executing, .. })
        ));
    }

    #[test]
    fn test_include_while_building_becomes_task() {
        let ctx = context(site());
        ctx.include("extra.html", Arc::new(page()), "/c").unwrap();
        ctx.freeze_tasks().unwrap();
        let extra = ctx.find_task("extra.html").unwrap();
        assert_eq!(extra.cwd, PathBuf::from("/c"));
        assert_eq!(extra.url(), "https://example.org/extra");
    }

    #[test]
    fn test_include_after_freeze_is_late() {
        let ctx = context(site());
        ctx.freeze_tasks().unwrap();
        let err = ctx.include("late.html", Arc::new(page()), "/c").unwrap_err();
        assert!(matches!(err, CoreError::LateRegistration { .. }));
        assert!(ctx.find_task("late.html").is_none());
        assert_eq!(ctx.tasks().len(), 3);
    }

    #[test]
    fn test_pending_duplicate_rejected_at_freeze() {
        let ctx = context(site());
        ctx.include("posts/1.html", Arc::new(page()), "/c").unwrap();
        assert!(matches!(ctx.freeze_tasks(), Err(CoreError::DuplicateLocation { .. })));
        assert_eq!(ctx.phase(), Phase::Building);
        assert!(ctx.tasks().is_empty());
    }

    #[test]
    fn test_subsite_expansion() {
        let mut child = Site::new("https://example.org/docs/").unwrap();
        child.include_in("index.html", page(), "/docs").unwrap();
        child.include_in("guide/intro.html", page(), "/docs").unwrap();

        let mut parent = site();
        parent.include_site("docs", child).unwrap();

        let ctx = context(parent);
        ctx.freeze_tasks().unwrap();
        let intro = ctx.find_task("docs/guide/intro.html").unwrap();
        assert_eq!(intro.url(), "https://example.org/docs/guide/intro");
        assert_eq!(intro.cwd, PathBuf::from("/docs"));
        assert!(ctx.find_task("/docs/index.html").is_some());
        assert_eq!(ctx.tasks().len(), 5);
    }

    #[test]
    fn test_subsite_collision_rejected() {
        let mut child = Site::new("https://example.org/").unwrap();
        child.include_in("1.html", page(), "/x").unwrap();

        let mut parent = site();
        parent.include_site("posts", child).unwrap();

        let ctx = context(parent);
        let err = ctx.freeze_tasks().unwrap_err();
        assert!(matches!(err, CoreError::DuplicateLocation { ref location } if location == "posts/1.html"));
    }

    #[test]
    fn test_tasks_by_cwd() {
        let ctx = context(site());
        ctx.freeze_tasks().unwrap();
        let groups = ctx.tasks_by_cwd();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Path::new("/a"));
        let first: Vec<_> = groups[0].1.iter().map(|t| t.location()).collect();
        assert_eq!(first, vec!["index.html", "posts/2.html"]);
        assert_eq!(groups[1].0, Path::new("/b"));
    }

    #[test]
    fn test_resolve_and_task_by_source() {
        let mut site = Site::new("https://example.org/").unwrap();
        site.include_in(
            "posts/hello.html",
            Page {
                source: Some(PathBuf::from("posts/hello.md")),
            },
            "/blog",
        )
        .unwrap();
        let ctx = context(site);
        ctx.freeze_tasks().unwrap();

        ctx.enter_dir("/blog");
        assert_eq!(ctx.resolve("templates/page.html"), PathBuf::from("/blog/templates/page.html"));
        assert_eq!(ctx.resolve("/etc/hosts"), PathBuf::from("/etc/hosts"));

        let task = ctx.task_by_source("posts/../posts/hello.md").unwrap();
        assert_eq!(task.location(), "posts/hello.html");
        assert!(ctx.task_by_source("/elsewhere/hello.md").is_none());
    }

    #[test]
    fn test_task_lookups_after_freeze() {
        let mut site = site();
        let shared = PathBuf::from("shared.md");
        site.include_in("a.html", Page { source: Some(shared.clone()) }, "/src")
            .unwrap();
        site.include_in("b.html", Page { source: Some(shared) }, "/src")
            .unwrap();
        let ctx = context(site);
        assert!(ctx.find_task("index.html").is_none());

        ctx.freeze_tasks().unwrap();
        assert_eq!(ctx.find_task("/posts/1.html").unwrap().cwd, Path::new("/b"));
        assert_eq!(ctx.find_task("./posts/2.html").unwrap().location(), "posts/2.html");
        assert!(ctx.find_task("posts/3.html").is_none());
        assert_eq!(ctx.task_by_source("/src/shared.md").unwrap().location(), "a.html");
    }

    #[test]
    fn test_finish() {
        let ctx = context(site());
        assert!(ctx.finish(false).is_err());
        ctx.freeze_tasks().unwrap();
        assert_eq!(ctx.finish(true).unwrap(), Phase::Failed);
        assert_eq!(ctx.phase(), Phase::Failed);
        assert!(ctx.finish(false).is_err());
    }

    #[test]
    fn test_metadata() {
        let ctx = context(site());
        assert_eq!(ctx.tool_version(), TOOL_VERSION);
        assert!(ctx.out_root().is_absolute());
        assert!(ctx.generated_at() <= Utc::now());
        assert_eq!(ctx.path("a/b.css").unwrap().url(), "https://example.org/a/b.css");
    }
}
