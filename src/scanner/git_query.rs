//! git 命令参数构造
//!
//! 所有参数都以独立的 argv 项传递，不经过 shell 解释，所以格式串里不需要引号。

use crate::models::ResolvedFilter;
use crate::utils::{format_git_boundary, format_git_until};

/// 提交字段分隔符
pub const FIELD_SEPARATOR: char = '|';

/// 每条提交输出的字段数：哈希、作者、日期、标题
pub const FIELD_COUNT: usize = 4;

/// 单次查询的默认提交数量上限
pub const DEFAULT_MAX_COMMITS: usize = 1000;

const PRETTY_FORMAT: &str = "--pretty=format:%H|%an|%ad|%s";
const DATE_FORMAT: &str = "--date=format:%Y-%m-%d %H:%M:%S";

/// `git --version`
pub fn version_args() -> Vec<String> {
    vec!["--version".to_string()]
}

/// `git rev-parse --is-inside-work-tree`
pub fn inside_work_tree_args() -> Vec<String> {
    vec!["rev-parse".to_string(), "--is-inside-work-tree".to_string()]
}

/// 提交历史查询
pub fn history_args(filter: &ResolvedFilter, max_commits: usize) -> Vec<String> {
    let mut args = vec!["log".to_string()];
    push_range(&mut args, filter);
    args.push(PRETTY_FORMAT.to_string());
    args.push(DATE_FORMAT.to_string());
    push_author(&mut args, filter);
    args.push("--all".to_string());
    args.push(format!("-n{}", max_commits.max(1)));
    args
}

/// 预过滤用的最小查询：条件与完整查询相同，只取一条
pub fn probe_args(filter: &ResolvedFilter) -> Vec<String> {
    let mut args = vec!["log".to_string()];
    push_range(&mut args, filter);
    args.push("--format=%H".to_string());
    push_author(&mut args, filter);
    args.push("--all".to_string());
    args.push("-n1".to_string());
    args
}

/// 首次提交日期查询，调用方取第一行
///
/// 不能和 `-n1` 一起用：git 先截断再反转，得到的会是最新的提交。
pub fn first_commit_args() -> Vec<String> {
    vec![
        "log".to_string(),
        "--reverse".to_string(),
        "--format=%ad".to_string(),
        DATE_FORMAT.to_string(),
    ]
}

fn push_range(args: &mut Vec<String>, filter: &ResolvedFilter) {
    if let Some(since) = filter.since {
        args.push(format!("--since={}", format_git_boundary(since)));
    }
    args.push(format!("--until={}", format_git_until(filter.until)));
}

fn push_author(args: &mut Vec<String>, filter: &ResolvedFilter) {
    if let Some(author) = &filter.author {
        args.push(format!("--author={}", author));
    }
}
