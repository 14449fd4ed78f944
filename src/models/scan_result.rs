use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::CommitRecord;

/// 扫描状态机：Idle -> Running -> {Completed | Cancelled | Failed} -> Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    /// 空闲
    Idle,
    /// 扫描中
    Running,
    /// 正常完成
    Completed,
    /// 被取消，结果只包含已完整处理的仓库
    Cancelled,
    /// 失败（输入无效或工作线程异常）
    Failed,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Completed | ScanState::Cancelled | ScanState::Failed)
    }

    pub fn display_name(&self) -> &str {
        match self {
            ScanState::Idle => "空闲",
            ScanState::Running => "扫描中",
            ScanState::Completed => "完成",
            ScanState::Cancelled => "已取消",
            ScanState::Failed => "失败",
        }
    }
}

/// 一次扫描的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// 按日期降序排列的提交
    pub commits: Vec<CommitRecord>,

    /// 终止状态
    pub state: ScanState,

    /// 统计信息
    pub stats: ScanStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// 检查过的目录数量
    pub directories_scanned: usize,

    /// 无法读取而跳过的目录数量
    pub unreadable_directories: usize,

    /// 去重后发现的仓库数量
    pub repositories_found: usize,

    /// 实际执行了提交查询的仓库数量（含失败，不含预过滤排除和取消后跳过的）
    pub repositories_scanned: usize,

    /// 执行 git 失败的仓库数量
    pub repositories_failed: usize,

    /// 结果达到单次查询上限的仓库（可能还有更早的提交未取到）
    pub truncated_repositories: Vec<String>,

    /// 提交总数
    pub total_commits: usize,

    /// 按作者统计的提交数量
    pub commits_by_author: BTreeMap<String, usize>,

    /// 按仓库统计的提交数量
    pub commits_by_repository: BTreeMap<String, usize>,

    /// 扫描耗时
    pub scan_duration: Option<Duration>,
}

impl ScanStats {
    /// 根据最终提交列表更新计数
    pub fn record_commits(&mut self, commits: &[CommitRecord]) {
        self.total_commits = commits.len();
        self.commits_by_author.clear();
        self.commits_by_repository.clear();

        for commit in commits {
            *self.commits_by_author.entry(commit.author.clone()).or_insert(0) += 1;
            *self
                .commits_by_repository
                .entry(commit.repository_path.clone())
                .or_insert(0) += 1;
        }
    }

    /// 提交最多的作者
    pub fn top_author(&self) -> Option<(&str, usize)> {
        self.commits_by_author
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, count)| (name.as_str(), *count))
    }
}
