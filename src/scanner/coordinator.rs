use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Local;
use rayon::prelude::*;
use rayon::ThreadPool;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{ScanError, ScanResult};
use crate::models::{
    sort_newest_first, CommitRecord, RepositoryHandle, ResolvedFilter, ScanFilter, ScanOutcome,
    ScanState, ScanStats,
};
use crate::scanner::{
    AuthorSink, CollectOutcome, CommandRunner, CommitCollector, NoopAuthors, NoopProgress, PreFilter,
    ProgressSink, RepositoryDetector, RepositoryWalker,
};

// 各阶段在总进度中的位置
const DISCOVERY_START: u8 = 5;
const DISCOVERY_END: u8 = 20;
const PREFILTER_END: u8 = 35;
const COLLECT_END: u8 = 95;

/// 扫描流水线的参数
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 工作线程数，发现和收集两个阶段共用
    pub workers: usize,

    /// 最大遍历深度
    pub max_depth: Option<usize>,

    /// 是否跟随符号链接
    pub follow_symlinks: bool,

    /// 有过滤条件时是否先做预过滤
    pub prefilter: bool,

    /// `.git` 为文件时是否调用 git 确认
    pub verify_gitlinks: bool,

    /// 单个仓库单次查询的提交上限
    pub max_commits: usize,

    /// 遍历时不进入的目录名
    pub ignore_dirs: HashSet<String>,
}

/// 默认工作线程数：CPU 核心数减一，至少为一
pub fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_depth: None,
            follow_symlinks: false,
            prefilter: true,
            verify_gitlinks: true,
            max_commits: crate::scanner::git_query::DEFAULT_MAX_COMMITS,
            ignore_dirs: HashSet::new(),
        }
    }
}

impl From<&Config> for ScanOptions {
    fn from(config: &Config) -> Self {
        Self {
            workers: config.scan.workers.filter(|w| *w > 0).unwrap_or_else(default_workers),
            max_depth: config.scan.max_depth,
            follow_symlinks: config.scan.follow_symlinks,
            prefilter: config.scan.prefilter,
            verify_gitlinks: config.scan.verify_gitlinks,
            max_commits: config.scan.max_commits,
            ignore_dirs: config.ignore.directories.clone(),
        }
    }
}

/// 扫描协调器 - 串联 遍历 -> 去重 -> 预过滤 -> 收集 -> 合并 -> 排序
pub struct ScanCoordinator {
    pipeline: Pipeline,
    state: Arc<Mutex<ScanState>>,
}

/// 在阻塞线程中执行的扫描流水线
#[derive(Clone)]
struct Pipeline {
    pool: Arc<ThreadPool>,
    walker: Arc<RepositoryWalker>,
    pre_filter: PreFilter,
    collector: CommitCollector,
    prefilter_enabled: bool,
    progress: Arc<dyn ProgressSink>,
    authors: Arc<dyn AuthorSink>,
}

/// 收集阶段的汇总
#[derive(Default)]
struct Collected {
    commits: Vec<CommitRecord>,
    scanned: usize,
    failed: usize,
    truncated: Vec<String>,
}

impl ScanCoordinator {
    /// 创建协调器，工作线程池只创建一次，后续每次扫描复用
    pub fn new(options: ScanOptions, runner: Arc<dyn CommandRunner>) -> ScanResult<Self> {
        let workers = options.workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("scan-worker-{}", i))
            .build()
            .map_err(|e| ScanError::WorkerPool(e.to_string()))?;
        let pool = Arc::new(pool);

        let detector = if options.verify_gitlinks {
            RepositoryDetector::with_fallback(runner.clone())
        } else {
            RepositoryDetector::new()
        };

        let walker = RepositoryWalker::new(detector, pool.clone())
            .with_ignore_dirs(options.ignore_dirs)
            .with_follow_symlinks(options.follow_symlinks)
            .with_max_depth(options.max_depth);

        tracing::debug!("扫描线程池大小: {}", workers);

        Ok(Self {
            pipeline: Pipeline {
                pool,
                walker: Arc::new(walker),
                pre_filter: PreFilter::new(runner.clone()),
                collector: CommitCollector::new(runner).with_max_commits(options.max_commits),
                prefilter_enabled: options.prefilter,
                progress: Arc::new(NoopProgress),
                authors: Arc::new(NoopAuthors),
            },
            state: Arc::new(Mutex::new(ScanState::Idle)),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.pipeline.progress = progress;
        self
    }

    pub fn with_authors(mut self, authors: Arc<dyn AuthorSink>) -> Self {
        self.pipeline.authors = authors;
        self
    }

    /// 当前状态
    pub fn state(&self) -> ScanState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(ScanState::Failed)
    }

    /// 扫描结束后回到空闲状态
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.is_terminal() {
                *state = ScanState::Idle;
            }
        }
    }

    /// 执行一次扫描，返回按日期降序排列的提交
    ///
    /// 整个流水线在一个阻塞任务中运行，不占用调用方的异步线程。
    /// `cancel` 被取消后不再派发新工作，返回已完整处理的仓库的结果。
    /// 返回前 future 被丢弃时，后台流水线随之取消，状态记为 `Cancelled`。
    pub async fn execute_scan(
        &self,
        roots: Vec<PathBuf>,
        filter: ScanFilter,
        cancel: CancellationToken,
    ) -> ScanResult<ScanOutcome> {
        // 子令牌：放弃扫描时只停止本次流水线，不影响调用方的令牌
        let cancel = cancel.child_token();
        let guard = self.begin(cancel.clone())?;

        let roots: Vec<PathBuf> = roots
            .into_iter()
            .filter(|root| !root.as_os_str().is_empty())
            .collect();
        if roots.is_empty() {
            tracing::error!("没有提供任何扫描路径");
            guard.finish(ScanState::Failed);
            return Err(ScanError::NoRootPaths);
        }

        let pipeline = self.pipeline.clone();
        let task = tokio::task::spawn_blocking(move || pipeline.run(&roots, &filter, &cancel));

        match task.await {
            Ok(outcome) => {
                guard.finish(outcome.state);
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!("扫描任务异常中断: {}", err);
                guard.finish(ScanState::Failed);
                Err(ScanError::Interrupted(err.to_string()))
            }
        }
    }

    /// 只执行发现和去重
    pub async fn discover(
        &self,
        roots: Vec<PathBuf>,
        cancel: CancellationToken,
    ) -> ScanResult<Vec<RepositoryHandle>> {
        if roots.iter().all(|root| root.as_os_str().is_empty()) {
            return Err(ScanError::NoRootPaths);
        }

        let walker = self.pipeline.walker.clone();
        tokio::task::spawn_blocking(move || dedupe_repositories(walker.find_all(&roots, &cancel)))
            .await
            .map_err(|e| ScanError::Interrupted(e.to_string()))
    }

    /// 并行查询每个仓库的首次提交日期
    pub async fn first_commit_dates(
        &self,
        repositories: Vec<RepositoryHandle>,
    ) -> ScanResult<Vec<(RepositoryHandle, Option<String>)>> {
        let pool = self.pipeline.pool.clone();
        let collector = self.pipeline.collector.clone();

        tokio::task::spawn_blocking(move || {
            pool.install(|| {
                repositories
                    .into_par_iter()
                    .map(|repo| {
                        let date = collector.first_commit_date(&repo);
                        (repo, date)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .await
        .map_err(|e| ScanError::Interrupted(e.to_string()))
    }

    fn begin(&self, cancel: CancellationToken) -> ScanResult<RunningGuard<'_>> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| ScanError::Interrupted(e.to_string()))?;
        if *state == ScanState::Running {
            return Err(ScanError::AlreadyRunning);
        }
        *state = ScanState::Running;
        Ok(RunningGuard {
            state: &self.state,
            cancel,
            finished: false,
        })
    }
}

/// 持有 `Running` 状态；未正常结束就被释放时取消流水线并记为 `Cancelled`
struct RunningGuard<'a> {
    state: &'a Mutex<ScanState>,
    cancel: CancellationToken,
    finished: bool,
}

impl RunningGuard<'_> {
    fn finish(mut self, terminal: ScanState) {
        set_state(self.state, terminal);
        self.finished = true;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("扫描在完成前被放弃");
            self.cancel.cancel();
            set_state(self.state, ScanState::Cancelled);
        }
    }
}

fn set_state(state: &Mutex<ScanState>, value: ScanState) {
    if let Ok(mut state) = state.lock() {
        *state = value;
    }
}

impl Pipeline {
    fn run(&self, roots: &[PathBuf], filter: &ScanFilter, cancel: &CancellationToken) -> ScanOutcome {
        let started = Instant::now();
        let filter = filter.resolve(Local::now().date_naive());
        let mut stats = ScanStats::default();

        self.progress.report(0, "准备扫描");

        // 阶段1：发现仓库
        self.progress.report(DISCOVERY_START, "查找仓库");
        let discovery = self.walker.walk(roots, cancel);
        stats.directories_scanned = discovery.directories_scanned;
        stats.unreadable_directories = discovery.unreadable_directories;

        let repositories = dedupe_repositories(discovery.repositories);
        stats.repositories_found = repositories.len();
        tracing::info!("发现 {} 个仓库", repositories.len());
        self.progress
            .report(DISCOVERY_END, &format!("发现 {} 个仓库", repositories.len()));

        if repositories.is_empty() {
            let state = terminal_state(cancel);
            stats.scan_duration = Some(started.elapsed());
            self.progress.report(100, "没有发现仓库");
            return ScanOutcome { commits: Vec::new(), state, stats };
        }

        // 阶段2：预过滤
        let repositories = if self.prefilter_enabled && filter.has_history_constraints() {
            self.prefilter(repositories, &filter, cancel)
        } else {
            repositories
        };

        // 阶段3：并行收集
        let collected = self.collect(&repositories, &filter, cancel);
        stats.repositories_scanned = collected.scanned;
        stats.repositories_failed = collected.failed;
        stats.truncated_repositories = collected.truncated;

        // 阶段4：全局排序
        let mut commits = collected.commits;
        sort_newest_first(&mut commits);
        stats.record_commits(&commits);
        stats.scan_duration = Some(started.elapsed());

        self.report_authors(&stats, &filter);

        let state = terminal_state(cancel);
        match state {
            ScanState::Cancelled => {
                tracing::warn!("扫描已取消，返回 {} 条已收集的提交", commits.len());
                self.progress.report(100, "已取消");
            }
            _ => {
                tracing::info!(
                    "扫描完成：{} 个仓库，{} 条提交",
                    stats.repositories_scanned,
                    commits.len()
                );
                self.progress.report(100, "完成");
            }
        }

        ScanOutcome { commits, state, stats }
    }

    fn prefilter(
        &self,
        repositories: Vec<RepositoryHandle>,
        filter: &ResolvedFilter,
        cancel: &CancellationToken,
    ) -> Vec<RepositoryHandle> {
        let total = repositories.len();
        let done = AtomicUsize::new(0);

        let kept: Vec<RepositoryHandle> = self.pool.install(|| {
            repositories
                .into_par_iter()
                .filter(|repo| {
                    // 取消后不再探测，保留给收集阶段统一跳过
                    if cancel.is_cancelled() {
                        return true;
                    }
                    let keep = self.pre_filter.likely_has_matching_commit(repo, filter);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    self.progress.report(
                        phase_percent(DISCOVERY_END, PREFILTER_END, finished, total),
                        &repo.name,
                    );
                    keep
                })
                .collect()
        });

        tracing::debug!("预过滤后剩余 {}/{} 个仓库", kept.len(), total);
        kept
    }

    fn collect(
        &self,
        repositories: &[RepositoryHandle],
        filter: &ResolvedFilter,
        cancel: &CancellationToken,
    ) -> Collected {
        let total = repositories.len();
        let done = AtomicUsize::new(0);

        let outcomes: Vec<(&RepositoryHandle, CollectOutcome)> = self.pool.install(|| {
            repositories
                .par_iter()
                .map(|repo| {
                    // 取消后不再启动新的仓库
                    if cancel.is_cancelled() {
                        return (repo, CollectOutcome::Cancelled);
                    }
                    let outcome = self.collector.collect(repo, filter, cancel);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    self.progress.report(
                        phase_percent(PREFILTER_END, COLLECT_END, finished, total),
                        &repo.name,
                    );
                    (repo, outcome)
                })
                .collect()
        });

        let mut collected = Collected::default();
        for (repo, outcome) in outcomes {
            match outcome {
                CollectOutcome::Collected { commits, truncated } => {
                    collected.scanned += 1;
                    if truncated {
                        collected.truncated.push(repo.path.display().to_string());
                    }
                    collected.commits.extend(commits);
                }
                CollectOutcome::Failed(_) => {
                    collected.scanned += 1;
                    collected.failed += 1;
                }
                CollectOutcome::Cancelled => {}
            }
        }
        collected
    }

    fn report_authors(&self, stats: &ScanStats, filter: &ResolvedFilter) {
        let authors: Vec<String> = stats.commits_by_author.keys().cloned().collect();
        if !authors.is_empty() {
            self.authors.authors_seen(&authors);
        }
        if let Some(author) = &filter.author {
            self.authors.filter_author(author);
        }
    }
}

/// 按规范化路径去重，每组保留一个；结果按路径排序
pub fn dedupe_repositories(repositories: Vec<RepositoryHandle>) -> Vec<RepositoryHandle> {
    let mut unique: BTreeMap<String, RepositoryHandle> = BTreeMap::new();
    for repo in repositories {
        unique.entry(repo.dedup_key()).or_insert(repo);
    }
    unique.into_values().collect()
}

fn terminal_state(cancel: &CancellationToken) -> ScanState {
    if cancel.is_cancelled() {
        ScanState::Cancelled
    } else {
        ScanState::Completed
    }
}

fn phase_percent(start: u8, end: u8, finished: usize, total: usize) -> u8 {
    if total == 0 {
        return end;
    }
    let span = (end - start) as usize;
    start + (span * finished.min(total) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GitError, GitResult};
    use crate::scanner::{ChannelProgress, MemoryAuthors};
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    /// 按仓库目录名返回预设输出的执行器
    struct ScriptedRunner {
        logs: HashMap<String, Result<Vec<String>, String>>,
        /// 对这个仓库执行 log 时触发取消
        cancel_on: Option<(String, CancellationToken)>,
        /// 模拟慢速 git 进程
        delay: Option<Duration>,
        probes: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new() -> Self {
            Self {
                logs: HashMap::new(),
                cancel_on: None,
                delay: None,
                probes: AtomicUsize::new(0),
            }
        }

        fn log(mut self, repo: &str, lines: &[&str]) -> Self {
            self.logs
                .insert(repo.to_string(), Ok(lines.iter().map(|l| l.to_string()).collect()));
            self
        }

        fn failing(mut self, repo: &str) -> Self {
            self.logs.insert(repo.to_string(), Err("fatal: broken".to_string()));
            self
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, working_dir: &Path, args: &[String]) -> GitResult<Vec<String>> {
            let name = working_dir.file_name().unwrap().to_string_lossy().to_string();

            if args.iter().any(|a| a == "-n1") {
                self.probes.fetch_add(1, Ordering::SeqCst);
            }
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if let Some((target, token)) = &self.cancel_on {
                if *target == name {
                    token.cancel();
                }
            }

            match self.logs.get(&name) {
                Some(Ok(lines)) => Ok(lines.clone()),
                Some(Err(stderr)) => Err(GitError::ExitStatus {
                    args: args.join(" "),
                    working_dir: working_dir.to_path_buf(),
                    code: Some(128),
                    stderr: stderr.clone(),
                }),
                None => Ok(Vec::new()),
            }
        }
    }

    fn options(workers: usize) -> ScanOptions {
        ScanOptions {
            workers,
            verify_gitlinks: false,
            ..Default::default()
        }
    }

    fn make_repos(root: &Path, names: &[&str]) {
        for name in names {
            fs::create_dir_all(root.join(name).join(".git")).unwrap();
        }
    }

    #[tokio::test]
    async fn test_end_to_end_ordering() {
        let temp_dir = tempdir().unwrap();
        make_repos(temp_dir.path(), &["X", "Y"]);

        let runner = ScriptedRunner::new()
            .log("X", &["x1|alice|2024-01-01 12:00:00|first", "x2|alice|2024-01-03 12:00:00|third"])
            .log("Y", &["y1|bob|2024-01-02 12:00:00|second"]);
        let coordinator = ScanCoordinator::new(options(2), Arc::new(runner)).unwrap();

        let outcome = coordinator
            .execute_scan(vec![temp_dir.path().to_path_buf()], ScanFilter::default(), CancellationToken::new())
            .await
            .unwrap();

        let order: Vec<(&str, &str)> = outcome
            .commits
            .iter()
            .map(|c| (c.repository_name.as_str(), c.date.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("X", "2024-01-03 12:00:00"),
                ("Y", "2024-01-02 12:00:00"),
                ("X", "2024-01-01 12:00:00"),
            ]
        );
        assert_eq!(outcome.state, ScanState::Completed);
        assert_eq!(coordinator.state(), ScanState::Completed);
        assert_eq!(outcome.stats.repositories_found, 2);
        assert_eq!(outcome.stats.total_commits, 3);
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let temp_dir = tempdir().unwrap();
        make_repos(temp_dir.path(), &["good1", "bad", "good2"]);

        let runner = ScriptedRunner::new()
            .log("good1", &["a|alice|2024-01-01 00:00:00|a", "b|alice|2024-01-02 00:00:00|b"])
            .log("good2", &["c|bob|2024-01-03 00:00:00|c"])
            .failing("bad");
        let coordinator = ScanCoordinator::new(options(3), Arc::new(runner)).unwrap();

        let outcome = coordinator
            .execute_scan(vec![temp_dir.path().to_path_buf()], ScanFilter::default(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.commits.len(), 3);
        assert!(outcome.commits.iter().all(|c| c.repository_name != "bad"));
        assert_eq!(outcome.stats.repositories_failed, 1);
        assert_eq!(outcome.state, ScanState::Completed);
    }

    #[tokio::test]
    async fn test_cancellation_mid_collection() {
        let temp_dir = tempdir().unwrap();
        make_repos(temp_dir.path(), &["r1", "r2", "r3"]);

        let cancel = CancellationToken::new();
        let mut runner = ScriptedRunner::new()
            .log("r1", &["a|alice|2024-01-01 00:00:00|a", "b|alice|2024-01-02 00:00:00|b"])
            .log("r2", &["c|bob|2024-01-03 00:00:00|c", "d|bob|2024-01-04 00:00:00|d"])
            .log("r3", &["e|carol|2024-01-05 00:00:00|e", "f|carol|2024-01-06 00:00:00|f"]);
        runner.cancel_on = Some(("r2".to_string(), cancel.clone()));

        let coordinator = ScanCoordinator::new(options(1), Arc::new(runner)).unwrap();
        let outcome = coordinator
            .execute_scan(vec![temp_dir.path().to_path_buf()], ScanFilter::default(), cancel)
            .await
            .unwrap();

        assert_eq!(outcome.state, ScanState::Cancelled);
        assert_eq!(coordinator.state(), ScanState::Cancelled);

        // 单线程下按路径顺序处理：r1 已完整收集，r2 触发取消被丢弃，r3 不再启动
        let count = |name: &str| outcome.commits.iter().filter(|c| c.repository_name == name).count();
        assert_eq!(count("r1"), 2);
        assert_eq!(count("r2"), 0);
        assert_eq!(count("r3"), 0);
    }

    #[tokio::test]
    async fn test_cancellation_during_prefilter_keeps_stats_consistent() {
        let temp_dir = tempdir().unwrap();
        make_repos(temp_dir.path(), &["a", "b", "c"]);

        let cancel = CancellationToken::new();
        let mut runner = ScriptedRunner::new()
            .log("a", &["1|alice|2024-01-01 00:00:00|a"])
            .log("b", &["2|alice|2024-01-02 00:00:00|b"])
            .log("c", &["3|alice|2024-01-03 00:00:00|c"]);
        runner.cancel_on = Some(("b".to_string(), cancel.clone()));
        let runner = Arc::new(runner);

        let filter = ScanFilter {
            author: Some("alice".to_string()),
            ..Default::default()
        };
        let coordinator = ScanCoordinator::new(options(1), runner.clone()).unwrap();
        let outcome = coordinator
            .execute_scan(vec![temp_dir.path().to_path_buf()], filter, cancel)
            .await
            .unwrap();

        // c 在取消后不再探测，收集阶段也不再启动任何查询
        assert_eq!(runner.probes.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.state, ScanState::Cancelled);
        assert_eq!(outcome.stats.repositories_found, 3);
        assert_eq!(outcome.stats.repositories_scanned, 0);
        assert!(outcome.commits.is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_scan_does_not_stay_running() {
        let temp_dir = tempdir().unwrap();
        make_repos(temp_dir.path(), &["slow"]);

        let mut runner = ScriptedRunner::new().log("slow", &["a|alice|2024-01-01 00:00:00|a"]);
        runner.delay = Some(Duration::from_millis(300));
        let coordinator = ScanCoordinator::new(options(1), Arc::new(runner)).unwrap();

        let caller_cancel = CancellationToken::new();
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            coordinator.execute_scan(
                vec![temp_dir.path().to_path_buf()],
                ScanFilter::default(),
                caller_cancel.clone(),
            ),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(coordinator.state(), ScanState::Cancelled);
        assert!(!caller_cancel.is_cancelled());

        // 下一次扫描可以正常开始
        let empty = tempdir().unwrap();
        let outcome = coordinator
            .execute_scan(vec![empty.path().to_path_buf()], ScanFilter::default(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.state, ScanState::Completed);
        assert_eq!(coordinator.state(), ScanState::Completed);
    }

    #[tokio::test]
    async fn test_empty_roots_fail_fast() {
        let coordinator = ScanCoordinator::new(options(1), Arc::new(ScriptedRunner::new())).unwrap();

        let result = coordinator
            .execute_scan(Vec::new(), ScanFilter::default(), CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ScanError::NoRootPaths)));
        assert_eq!(coordinator.state(), ScanState::Failed);

        coordinator.reset();
        assert_eq!(coordinator.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn test_no_repositories_is_empty_success() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("plain/dir")).unwrap();
        let coordinator = ScanCoordinator::new(options(2), Arc::new(ScriptedRunner::new())).unwrap();

        let outcome = coordinator
            .execute_scan(vec![temp_dir.path().to_path_buf()], ScanFilter::default(), CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.commits.is_empty());
        assert_eq!(outcome.state, ScanState::Completed);
    }

    #[tokio::test]
    async fn test_roots_resolving_to_same_repository_are_deduplicated() {
        let temp_dir = tempdir().unwrap();
        make_repos(temp_dir.path(), &["shared"]);
        fs::create_dir_all(temp_dir.path().join("other")).unwrap();

        let runner = ScriptedRunner::new().log("shared", &["a|alice|2024-01-01 00:00:00|a"]);
        let coordinator = ScanCoordinator::new(options(2), Arc::new(runner)).unwrap();

        let roots = vec![
            temp_dir.path().to_path_buf(),
            temp_dir.path().join("shared"),
            temp_dir.path().join("other/../shared"),
        ];
        let outcome = coordinator
            .execute_scan(roots, ScanFilter::default(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.stats.repositories_found, 1);
        assert_eq!(outcome.commits.len(), 1);
    }

    #[tokio::test]
    async fn test_prefilter_only_runs_with_constraints() {
        let temp_dir = tempdir().unwrap();
        make_repos(temp_dir.path(), &["active", "stale"]);

        let runner = Arc::new(
            ScriptedRunner::new().log("active", &["a|alice|2024-01-01 00:00:00|a"]),
        );
        let coordinator = ScanCoordinator::new(options(2), runner.clone()).unwrap();
        let roots = vec![temp_dir.path().to_path_buf()];

        coordinator
            .execute_scan(roots.clone(), ScanFilter::default(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(runner.probes.load(Ordering::SeqCst), 0);

        let filter = ScanFilter {
            author: Some("alice".to_string()),
            ..Default::default()
        };
        let outcome = coordinator
            .execute_scan(roots, filter, CancellationToken::new())
            .await
            .unwrap();

        // stale 仓库探测无输出，被预过滤掉
        assert_eq!(runner.probes.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.stats.repositories_found, 2);
        assert_eq!(outcome.stats.repositories_scanned, 1);
        assert_eq!(outcome.commits.len(), 1);
    }

    #[tokio::test]
    async fn test_progress_and_authors_are_reported() {
        let temp_dir = tempdir().unwrap();
        make_repos(temp_dir.path(), &["X"]);

        let runner = ScriptedRunner::new().log("X", &["a|alice|2024-01-01 00:00:00|a", "b|bob|2024-01-02 00:00:00|b"]);
        let (progress, mut rx) = ChannelProgress::channel();
        let authors = Arc::new(MemoryAuthors::new());
        let coordinator = ScanCoordinator::new(options(1), Arc::new(runner))
            .unwrap()
            .with_progress(Arc::new(progress))
            .with_authors(authors.clone());

        let filter = ScanFilter {
            author: Some("alice".to_string()),
            ..Default::default()
        };
        coordinator
            .execute_scan(vec![temp_dir.path().to_path_buf()], filter, CancellationToken::new())
            .await
            .unwrap();

        let mut percents = Vec::new();
        while let Ok(update) = rx.try_recv() {
            percents.push(update.percent);
        }
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(authors.seen(), vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(authors.recent_filters(), vec!["alice".to_string()]);
    }

    #[test]
    fn test_phase_percent() {
        assert_eq!(phase_percent(35, 95, 0, 4), 35);
        assert_eq!(phase_percent(35, 95, 2, 4), 65);
        assert_eq!(phase_percent(35, 95, 4, 4), 95);
        assert_eq!(phase_percent(35, 95, 1, 0), 95);
    }

    #[test]
    fn test_default_workers_at_least_one() {
        assert!(default_workers() >= 1);
    }
}
