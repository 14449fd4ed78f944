use std::path::PathBuf;

/// 扫描入口返回给调用方的错误
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("没有提供任何扫描路径")]
    NoRootPaths,

    #[error("已有扫描正在进行")]
    AlreadyRunning,

    #[error("无法创建工作线程池: {0}")]
    WorkerPool(String),

    #[error("扫描任务异常中断: {0}")]
    Interrupted(String),
}

/// 调用 git 可执行文件时的错误
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("无法启动 {program} (工作目录 {}): {source}", .working_dir.display())]
    Spawn {
        program: String,
        working_dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git {args} 退出码 {code:?} (工作目录 {}): {stderr}", .working_dir.display())]
    ExitStatus {
        args: String,
        working_dir: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
}

pub type ScanResult<T> = Result<T, ScanError>;
pub type GitResult<T> = Result<T, GitError>;
