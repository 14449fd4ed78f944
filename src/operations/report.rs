use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::models::{RepositoryHandle, ScanOutcome, ScanState};
use crate::utils::format_elapsed;

/// JSON 输出结构
#[derive(Serialize)]
struct JsonReport<'a> {
    state: ScanState,
    commits: &'a [crate::models::CommitRecord],
    stats: &'a crate::models::ScanStats,
}

/// 把扫描结果渲染为文本
pub fn render_outcome(outcome: &ScanOutcome, format: OutputFormat, max_message_width: usize) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let report = JsonReport {
                state: outcome.state,
                commits: &outcome.commits,
                stats: &outcome.stats,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Table => Ok(render_table(outcome, max_message_width)),
    }
}

/// 输出到文件或标准输出
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
            tracing::info!("结果已保存到 {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", content)?;
        }
    }
    Ok(())
}

fn render_table(outcome: &ScanOutcome, max_message_width: usize) -> String {
    let commits = &outcome.commits;
    let repo_width = column_width(commits.iter().map(|c| c.repository_name.as_str()), "仓库");
    let author_width = column_width(commits.iter().map(|c| c.author.as_str()), "作者");

    let mut out = String::new();
    out.push_str(&format!(
        "{:<19}  {}  {}  {:<8}  {}\n",
        "日期",
        pad("仓库", repo_width),
        pad("作者", author_width),
        "提交",
        "信息"
    ));

    for commit in commits {
        out.push_str(&format!(
            "{:<19}  {}  {}  {:<8}  {}\n",
            commit.date,
            pad(&commit.repository_name, repo_width),
            pad(&commit.author, author_width),
            commit.commit_id.chars().take(8).collect::<String>(),
            truncate(&commit.message, max_message_width)
        ));
    }

    out.push('\n');
    out.push_str(&render_summary(outcome));
    out
}

/// 扫描统计摘要
pub fn render_summary(outcome: &ScanOutcome) -> String {
    let stats = &outcome.stats;
    let mut out = format!(
        "状态: {} | 仓库: {} (扫描 {}, 失败 {}) | 提交: {}",
        outcome.state.display_name(),
        stats.repositories_found,
        stats.repositories_scanned,
        stats.repositories_failed,
        stats.total_commits,
    );

    if let Some(duration) = stats.scan_duration {
        out.push_str(&format!(" | 耗时: {}", format_elapsed(duration)));
    }
    if let Some((author, count)) = stats.top_author() {
        out.push_str(&format!(" | 最活跃作者: {} ({})", author, count));
    }
    if !stats.truncated_repositories.is_empty() {
        out.push_str(&format!(
            "\n以下仓库达到单次查询上限，结果可能不完整: {}",
            stats.truncated_repositories.join(", ")
        ));
    }
    out
}

/// 仓库列表（repos 子命令）
pub fn render_repositories(
    repositories: &[(RepositoryHandle, Option<String>)],
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = repositories
                .iter()
                .map(|(repo, first_commit)| {
                    serde_json::json!({
                        "name": repo.name,
                        "path": repo.path,
                        "first_commit": first_commit,
                    })
                })
                .collect();
            Ok(serde_json::to_string_pretty(&items)?)
        }
        OutputFormat::Table => {
            let name_width = column_width(repositories.iter().map(|(r, _)| r.name.as_str()), "仓库");
            let mut out = String::new();
            for (repo, first_commit) in repositories {
                out.push_str(&format!(
                    "{}  {:<19}  {}\n",
                    pad(&repo.name, name_width),
                    first_commit.as_deref().unwrap_or("-"),
                    repo.path.display()
                ));
            }
            out.push_str(&format!("共 {} 个仓库", repositories.len()));
            Ok(out)
        }
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.chars().count()))
        .max()
        .unwrap_or(0)
        .min(32)
}

fn pad(value: &str, width: usize) -> String {
    let value = truncate(value, width);
    let len = value.chars().count();
    format!("{}{}", value, " ".repeat(width.saturating_sub(len)))
}

/// 按字符数截断，避免切断多字节字符
fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut truncated: String = value.chars().take(max_chars - 1).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommitRecord, ScanStats};
    use std::path::PathBuf;

    fn outcome() -> ScanOutcome {
        let repo = RepositoryHandle {
            path: PathBuf::from("/code/api"),
            name: "api".to_string(),
        };
        let commits = vec![CommitRecord::new(
            &repo,
            "0123456789abcdef",
            "alice",
            "2024-01-03 12:00:00",
            "修复登录页面的显示问题",
        )];
        let mut stats = ScanStats::default();
        stats.repositories_found = 1;
        stats.repositories_scanned = 1;
        stats.record_commits(&commits);

        ScanOutcome {
            commits,
            state: ScanState::Completed,
            stats,
        }
    }

    #[test]
    fn test_truncate_respects_characters() {
        assert_eq!(truncate("修复登录页面", 4), "修复登…");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn test_table_output() {
        let table = render_outcome(&outcome(), OutputFormat::Table, 8).unwrap();

        assert!(table.contains("2024-01-03 12:00:00"));
        assert!(table.contains("01234567"));
        assert!(!table.contains("0123456789"));
        assert!(table.contains("修复登录页面的…"));
        assert!(table.contains("最活跃作者: alice (1)"));
    }

    #[test]
    fn test_json_output() {
        let json = render_outcome(&outcome(), OutputFormat::Json, 72).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["state"], "Completed");
        assert_eq!(value["commits"][0]["author"], "alice");
        assert_eq!(value["stats"]["total_commits"], 1);
    }
}
