use std::sync::Arc;

use crate::models::{RepositoryHandle, ResolvedFilter};
use crate::scanner::git_query;
use crate::scanner::CommandRunner;

/// 预过滤：用只取一条的查询判断仓库是否可能有匹配的提交
///
/// 执行失败时返回 true，宁可多扫描一个仓库，也不漏掉结果。
#[derive(Clone)]
pub struct PreFilter {
    runner: Arc<dyn CommandRunner>,
}

impl PreFilter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub fn likely_has_matching_commit(&self, repo: &RepositoryHandle, filter: &ResolvedFilter) -> bool {
        match self.runner.run(&repo.path, &git_query::probe_args(filter)) {
            Ok(lines) => {
                let matched = lines.iter().any(|line| !line.trim().is_empty());
                if !matched {
                    tracing::debug!("预过滤跳过仓库: {}", repo.path.display());
                }
                matched
            }
            Err(err) => {
                tracing::debug!("预过滤执行失败，保留仓库 {}: {}", repo.path.display(), err);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GitError, GitResult};
    use crate::models::ScanFilter;
    use chrono::NaiveDate;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    struct ProbeRunner {
        result: Option<Vec<&'static str>>,
        seen_args: Mutex<Vec<String>>,
    }

    impl CommandRunner for ProbeRunner {
        fn run(&self, working_dir: &Path, args: &[String]) -> GitResult<Vec<String>> {
            *self.seen_args.lock().unwrap() = args.to_vec();
            match &self.result {
                Some(lines) => Ok(lines.iter().map(|l| l.to_string()).collect()),
                None => Err(GitError::ExitStatus {
                    args: args.join(" "),
                    working_dir: working_dir.to_path_buf(),
                    code: Some(128),
                    stderr: "fatal: bad revision".to_string(),
                }),
            }
        }
    }

    fn probe(result: Option<Vec<&'static str>>) -> (PreFilter, Arc<ProbeRunner>) {
        let runner = Arc::new(ProbeRunner {
            result,
            seen_args: Mutex::new(Vec::new()),
        });
        (PreFilter::new(runner.clone()), runner)
    }

    fn repo() -> RepositoryHandle {
        RepositoryHandle {
            path: PathBuf::from("/code/x"),
            name: "x".to_string(),
        }
    }

    fn filter() -> ResolvedFilter {
        ScanFilter {
            since: NaiveDate::from_ymd_opt(2024, 1, 1),
            author: Some("alice".to_string()),
            ..Default::default()
        }
        .resolve(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
    }

    #[test]
    fn test_output_means_match() {
        let (pre_filter, runner) = probe(Some(vec!["0123abcd"]));
        assert!(pre_filter.likely_has_matching_commit(&repo(), &filter()));

        let args = runner.seen_args.lock().unwrap().clone();
        assert!(args.contains(&"-n1".to_string()));
        assert!(args.contains(&"--author=alice".to_string()));
        assert!(args.contains(&"--since=2024-01-01 00:00:00".to_string()));
    }

    #[test]
    fn test_no_output_means_skip() {
        let (pre_filter, _) = probe(Some(vec![]));
        assert!(!pre_filter.likely_has_matching_commit(&repo(), &filter()));
    }

    #[test]
    fn test_errors_fail_open() {
        let (pre_filter, _) = probe(None);
        assert!(pre_filter.likely_has_matching_commit(&repo(), &filter()));
    }
}
