use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::models::{CommitRecord, RepositoryHandle, ResolvedFilter};
use crate::scanner::git_query::{self, FIELD_COUNT, FIELD_SEPARATOR};
use crate::scanner::CommandRunner;

/// 提交收集器 - 对单个仓库执行历史查询并解析为提交记录
#[derive(Clone)]
pub struct CommitCollector {
    runner: Arc<dyn CommandRunner>,

    /// 单次查询的提交数量上限
    max_commits: usize,
}

/// 单个仓库的收集结果
#[derive(Debug, Clone, PartialEq)]
pub enum CollectOutcome {
    /// 收集完成
    Collected {
        commits: Vec<CommitRecord>,
        /// 原始输出达到上限，可能还有更早的提交
        truncated: bool,
    },

    /// git 执行失败，该仓库不贡献任何结果
    Failed(String),

    /// 解析途中观察到取消，丢弃该仓库的部分结果
    Cancelled,
}

impl CommitCollector {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            max_commits: git_query::DEFAULT_MAX_COMMITS,
        }
    }

    pub fn with_max_commits(mut self, max_commits: usize) -> Self {
        self.max_commits = max_commits.max(1);
        self
    }

    /// 收集仓库中符合过滤条件的提交
    pub fn collect(
        &self,
        repo: &RepositoryHandle,
        filter: &ResolvedFilter,
        cancel: &CancellationToken,
    ) -> CollectOutcome {
        let args = git_query::history_args(filter, self.max_commits);
        let lines = match self.runner.run(&repo.path, &args) {
            Ok(lines) => lines,
            Err(err) => {
                tracing::warn!("读取提交历史失败 {}: {}", repo.path.display(), err);
                return CollectOutcome::Failed(err.to_string());
            }
        };

        let truncated = lines.len() >= self.max_commits;
        if truncated {
            tracing::info!(
                "仓库 {} 的提交数达到单次查询上限 {}，更早的提交未包含",
                repo.name,
                self.max_commits
            );
        }

        // 每行独立解析；任一行观察到取消，整个仓库的结果都被丢弃
        let parsed: Option<Vec<Option<CommitRecord>>> = lines
            .par_iter()
            .map(|line| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(parse_line(repo, line))
            })
            .collect();

        let Some(parsed) = parsed else {
            return CollectOutcome::Cancelled;
        };

        let mut seen = HashSet::new();
        let commits = parsed
            .into_iter()
            .flatten()
            .filter(|commit| filter.author_terms.matches(&commit.author))
            .filter(|commit| seen.insert(commit.commit_id.clone()))
            .collect();

        CollectOutcome::Collected { commits, truncated }
    }

    /// 仓库第一个提交的日期
    pub fn first_commit_date(&self, repo: &RepositoryHandle) -> Option<String> {
        match self.runner.run(&repo.path, &git_query::first_commit_args()) {
            Ok(lines) => lines.into_iter().next().map(|line| line.trim().to_string()),
            Err(err) => {
                tracing::debug!("读取首次提交日期失败 {}: {}", repo.path.display(), err);
                None
            }
        }
    }
}

/// 解析一行 `%H|%an|%ad|%s` 输出；字段不足时返回 None
///
/// 最多拆成 4 段，标题中的 `|` 会保留在提交信息里。
pub fn parse_line(repo: &RepositoryHandle, line: &str) -> Option<CommitRecord> {
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, FIELD_SEPARATOR).collect();
    if fields.len() < FIELD_COUNT {
        tracing::debug!("忽略格式不正确的行 ({}): {}", repo.name, line);
        return None;
    }

    Some(CommitRecord::new(repo, fields[0], fields[1], fields[2], fields[3]))
}
