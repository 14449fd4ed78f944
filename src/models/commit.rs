use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::models::RepositoryHandle;
use crate::utils::parse_commit_date;

/// 在某个仓库中观察到的一次提交
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitRecord {
    /// 仓库显示名称
    pub repository_name: String,

    /// 仓库绝对路径
    pub repository_path: String,

    /// 仓库所在目录名称
    pub repository_folder: String,

    /// 提交哈希
    pub commit_id: String,

    /// 作者名
    pub author: String,

    /// 提交日期，格式为 `yyyy-MM-dd HH:mm:ss`
    pub date: String,

    /// 提交信息（仅第一行）
    pub message: String,
}

impl CommitRecord {
    /// 用仓库身份信息和 git 输出的字段构造提交记录
    pub fn new(
        repository: &RepositoryHandle,
        commit_id: &str,
        author: &str,
        date: &str,
        message: &str,
    ) -> Self {
        Self {
            repository_name: repository.name.clone(),
            repository_path: repository.path.to_string_lossy().to_string(),
            repository_folder: repository.folder_name(),
            commit_id: commit_id.trim().to_string(),
            author: author.trim().to_string(),
            date: date.trim().to_string(),
            message: message.lines().next().unwrap_or("").trim().to_string(),
        }
    }

    /// 解析后的提交时间，无法解析时为最小值
    pub fn parsed_date(&self) -> NaiveDateTime {
        parse_commit_date(&self.date)
    }

}

/// 全局排序：日期降序，同一时刻按仓库路径、提交哈希排序以保证结果确定
pub fn sort_newest_first(commits: &mut [CommitRecord]) {
    // 每条记录只解析一次日期
    commits.sort_by_cached_key(|c| {
        (
            Reverse(c.parsed_date()),
            c.repository_path.clone(),
            c.commit_id.clone(),
        )
    });
}
