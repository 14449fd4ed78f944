use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{GitError, GitResult};
use crate::scanner::git_query;

/// 外部版本控制命令的执行器
///
/// 工作目录总是作为参数显式传入，实现不得读取或修改进程级的当前目录，
/// 这样多个工作线程可以同时针对不同仓库执行命令。
pub trait CommandRunner: Send + Sync {
    /// 在 `working_dir` 中执行命令，返回标准输出的各行
    fn run(&self, working_dir: &Path, args: &[String]) -> GitResult<Vec<String>>;
}

/// 调用 git 命令行
#[derive(Debug, Clone)]
pub struct GitCli {
    executable: PathBuf,
}

impl GitCli {
    pub fn new() -> Self {
        Self::with_executable("git")
    }

    /// 使用自定义的 git 可执行文件路径
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// 检查 git 是否可用（`git --version` 退出码为 0）
    pub fn is_available(&self) -> bool {
        let cwd = std::env::temp_dir();
        match self.run(&cwd, &git_query::version_args()) {
            Ok(lines) => {
                tracing::debug!("检测到 {}", lines.first().map(String::as_str).unwrap_or("git"));
                true
            }
            Err(err) => {
                tracing::debug!("git 不可用: {}", err);
                false
            }
        }
    }

    fn command(&self, working_dir: &Path, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            // CREATE_NO_WINDOW，不弹出控制台窗口
            cmd.creation_flags(0x0800_0000);
        }

        cmd
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for GitCli {
    fn run(&self, working_dir: &Path, args: &[String]) -> GitResult<Vec<String>> {
        let output = self
            .command(working_dir, args)
            .output()
            .map_err(|source| GitError::Spawn {
                program: self.executable.display().to_string(),
                working_dir: working_dir.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::ExitStatus {
                args: args.join(" "),
                working_dir: working_dir.to_path_buf(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(split_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// 按行拆分输出，去掉 `\r` 和末尾空行
fn split_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
