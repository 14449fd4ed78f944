use std::path::Path;
use std::sync::Arc;

use crate::scanner::git_query;
use crate::scanner::CommandRunner;

/// 仓库元数据目录名
pub const METADATA_DIR: &str = ".git";

/// 仓库检测器
///
/// 遍历时只看 `.git` 目录是否存在，不启动进程。`.git` 是文件（worktree、子模块）
/// 时目录检查无法下结论，如果配置了执行器就交给 git 判断。
#[derive(Clone)]
pub struct RepositoryDetector {
    fallback: Option<Arc<dyn CommandRunner>>,
}

impl RepositoryDetector {
    /// 仅使用目录检查的检测器
    pub fn new() -> Self {
        Self { fallback: None }
    }

    /// 对 gitlink 文件启用 git 命令回退检查
    pub fn with_fallback(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            fallback: Some(runner),
        }
    }

    /// 目录下是否直接存在 `.git` 目录；任何 I/O 错误都视为否
    pub fn is_repository(&self, path: &Path) -> bool {
        std::fs::metadata(path.join(METADATA_DIR))
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false)
    }

    /// 用 `git rev-parse --is-inside-work-tree` 确认；失败时视为否
    pub fn confirm_with_git(&self, path: &Path) -> bool {
        let Some(runner) = &self.fallback else {
            return false;
        };

        match runner.run(path, &git_query::inside_work_tree_args()) {
            Ok(lines) => lines
                .first()
                .map(|line| line.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            Err(err) => {
                tracing::debug!("git 确认仓库失败 {}: {}", path.display(), err);
                false
            }
        }
    }

    /// 遍历时使用的检测入口
    pub fn detect(&self, path: &Path) -> bool {
        if self.is_repository(path) {
            return true;
        }

        if self.fallback.is_some() && is_gitlink_file(path) {
            return self.confirm_with_git(path);
        }

        false
    }
}

impl Default for RepositoryDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn is_gitlink_file(path: &Path) -> bool {
    std::fs::symlink_metadata(path.join(METADATA_DIR))
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}
