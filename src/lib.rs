pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod operations;
pub mod scanner;
pub mod utils;

// 重新导出常用类型
pub use error::{GitError, ScanError};
pub use models::{CommitRecord, RepositoryHandle, ScanFilter, ScanOutcome, ScanState};
pub use scanner::{GitCli, ScanCoordinator, ScanOptions};
