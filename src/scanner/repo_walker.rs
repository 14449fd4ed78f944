use std::collections::HashSet;
use std::fs::DirEntry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rayon::ThreadPool;
use tokio_util::sync::CancellationToken;

use crate::models::repository::canonical_or_absolute;
use crate::models::RepositoryHandle;
use crate::scanner::RepositoryDetector;

/// 并发仓库遍历器
///
/// 每个目录先判断是否为仓库，是则记录并停止向下遍历；否则把子目录作为新任务
/// 投递到共享线程池。任务在线程池的队列中排队，并发数始终受线程池大小限制。
pub struct RepositoryWalker {
    detector: RepositoryDetector,
    pool: Arc<ThreadPool>,

    /// 不进入的目录名
    ignore_dirs: HashSet<String>,

    /// 是否跟随符号链接目录
    follow_symlinks: bool,

    /// 最大遍历深度（根目录为 0）
    max_depth: Option<usize>,
}

/// 一次遍历的结果
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// 发现的仓库（未去重，顺序不确定）
    pub repositories: Vec<RepositoryHandle>,

    /// 检查过的目录数量
    pub directories_scanned: usize,

    /// 无法读取的目录数量
    pub unreadable_directories: usize,
}

/// 遍历过程中各任务共享的状态
#[derive(Clone, Copy)]
struct WalkContext<'a> {
    walker: &'a RepositoryWalker,
    found: &'a Mutex<Vec<RepositoryHandle>>,
    visited: &'a Mutex<HashSet<PathBuf>>,
    scanned: &'a AtomicUsize,
    unreadable: &'a AtomicUsize,
    cancel: &'a CancellationToken,
}

impl RepositoryWalker {
    pub fn new(detector: RepositoryDetector, pool: Arc<ThreadPool>) -> Self {
        Self {
            detector,
            pool,
            ignore_dirs: HashSet::new(),
            follow_symlinks: false,
            max_depth: None,
        }
    }

    pub fn with_ignore_dirs(mut self, ignore_dirs: HashSet<String>) -> Self {
        self.ignore_dirs = ignore_dirs;
        self
    }

    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 查找单个根目录下的仓库
    pub fn find_repositories(&self, root: &Path, cancel: &CancellationToken) -> Vec<RepositoryHandle> {
        self.walk(&[root.to_path_buf()], cancel).repositories
    }

    /// 查找多个根目录下的仓库（各根目录并行遍历，结果取并集）
    pub fn find_all(&self, roots: &[PathBuf], cancel: &CancellationToken) -> Vec<RepositoryHandle> {
        self.walk(roots, cancel).repositories
    }

    /// 遍历所有根目录并返回详细结果
    pub fn walk(&self, roots: &[PathBuf], cancel: &CancellationToken) -> Discovery {
        let found = Mutex::new(Vec::new());
        let visited = Mutex::new(HashSet::new());
        let scanned = AtomicUsize::new(0);
        let unreadable = AtomicUsize::new(0);

        let ctx = WalkContext {
            walker: self,
            found: &found,
            visited: &visited,
            scanned: &scanned,
            unreadable: &unreadable,
            cancel,
        };

        self.pool.scope(|scope| {
            for root in roots {
                if !root.is_dir() {
                    tracing::warn!("扫描路径不存在或不是目录: {}", root.display());
                    continue;
                }

                let root = root.clone();
                scope.spawn(move |s| ctx.visit(s, root, 0));
            }
        });

        let repositories = found.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::debug!(
            "遍历完成：发现 {} 个仓库，检查了 {} 个目录",
            repositories.len(),
            scanned.load(Ordering::Relaxed)
        );

        Discovery {
            repositories,
            directories_scanned: scanned.into_inner(),
            unreadable_directories: unreadable.into_inner(),
        }
    }

    /// 判断目录项是否需要继续遍历，返回其路径
    fn child_directory(&self, entry: &DirEntry) -> Option<PathBuf> {
        let file_type = entry.file_type().ok()?;
        let path = entry.path();

        let is_dir = if file_type.is_symlink() {
            self.follow_symlinks && path.is_dir()
        } else {
            file_type.is_dir()
        };
        if !is_dir {
            return None;
        }

        let name = entry.file_name();
        if self.ignore_dirs.contains(name.to_string_lossy().as_ref()) {
            return None;
        }

        Some(path)
    }
}

impl<'a> WalkContext<'a> {
    fn visit(self, scope: &rayon::Scope<'a>, dir: PathBuf, depth: usize) {
        if self.cancel.is_cancelled() {
            return;
        }

        // 跟随符号链接时可能出现环，用规范化路径去重
        if self.walker.follow_symlinks && !self.first_visit(&dir) {
            return;
        }

        self.scanned.fetch_add(1, Ordering::Relaxed);

        if self.walker.detector.detect(&dir) {
            let handle = RepositoryHandle::from_path(&dir);
            tracing::debug!("发现仓库: {}", handle.path.display());
            if let Ok(mut found) = self.found.lock() {
                found.push(handle);
            }
            return;
        }

        if self.walker.max_depth.is_some_and(|max| depth >= max) {
            return;
        }

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                // 只放弃这个子树，兄弟目录继续遍历
                self.unreadable.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("无法读取目录 {}: {}", dir.display(), err);
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!("读取目录项失败 {}: {}", dir.display(), err);
                    continue;
                }
            };

            if let Some(child) = self.walker.child_directory(&entry) {
                scope.spawn(move |s| self.visit(s, child, depth + 1));
            }
        }
    }

    fn first_visit(&self, dir: &Path) -> bool {
        let canonical = canonical_or_absolute(dir);
        match self.visited.lock() {
            Ok(mut visited) => visited.insert(canonical),
            Err(_) => true,
        }
    }
}
