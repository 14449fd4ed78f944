use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, OutputFormat};
use crate::models::{ScanFilter, ScanOutcome};
use crate::operations::report;
use crate::scanner::{ChannelProgress, GitCli, MemoryAuthors, ProgressUpdate, ScanCoordinator, ScanOptions};

/// 一次命令行扫描请求
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub paths: Vec<PathBuf>,
    pub filter: ScanFilter,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub show_progress: bool,
}

/// 执行扫描并输出结果
pub async fn run_scan(config: &Config, request: ScanRequest) -> Result<ScanOutcome> {
    let runner = Arc::new(git_cli(config)?);

    let (progress, rx) = ChannelProgress::channel();
    let bar = if request.show_progress {
        create_progress_bar()
    } else {
        ProgressBar::hidden()
    };
    let progress_task = tokio::spawn(drain_progress(rx, bar));

    let cancel = CancellationToken::new();
    let ctrl_c = watch_ctrl_c(cancel.clone());

    let authors = Arc::new(MemoryAuthors::new());
    let coordinator = ScanCoordinator::new(ScanOptions::from(config), runner)?
        .with_progress(Arc::new(progress))
        .with_authors(authors.clone());

    let result = coordinator
        .execute_scan(request.paths.clone(), request.filter.clone(), cancel)
        .await;

    // 释放最后一个发送端，进度任务随之结束
    drop(coordinator);
    let _ = progress_task.await;
    ctrl_c.abort();

    let outcome = result?;
    tracing::debug!("本次扫描出现的作者: {:?}", authors.seen());

    let content = report::render_outcome(&outcome, request.format, config.display.max_message_width)?;
    report::write_output(&content, request.output.as_deref())?;

    if request.output.is_some() || request.format == OutputFormat::Json {
        eprintln!("{}", report::render_summary(&outcome));
    }

    Ok(outcome)
}

/// 只发现仓库并列出首次提交日期
pub async fn run_repos(config: &Config, paths: Vec<PathBuf>, format: OutputFormat) -> Result<()> {
    let runner = Arc::new(git_cli(config)?);
    let coordinator = ScanCoordinator::new(ScanOptions::from(config), runner)?;

    let cancel = CancellationToken::new();
    let ctrl_c = watch_ctrl_c(cancel.clone());

    let repositories = coordinator.discover(paths, cancel).await?;
    let listing = coordinator.first_commit_dates(repositories).await?;
    ctrl_c.abort();

    let content = report::render_repositories(&listing, format)?;
    report::write_output(&content, None)
}

/// 检查 git 是否可用
pub fn run_check(config: &Config) -> Result<()> {
    let git = GitCli::with_executable(&config.scan.git_executable);
    if git.is_available() {
        println!("git 可用: {}", git.executable().display());
        Ok(())
    } else {
        bail!("找不到可用的 git: {}", git.executable().display())
    }
}

fn git_cli(config: &Config) -> Result<GitCli> {
    let git = GitCli::with_executable(&config.scan.git_executable);
    if !git.is_available() {
        bail!("找不到可用的 git: {}，请安装 git 或在配置中设置 scan.git_executable", git.executable().display());
    }
    Ok(git)
}

/// Ctrl-C 时请求取消，正在执行的 git 进程允许自然结束
fn watch_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("收到中断信号，正在停止扫描...");
            cancel.cancel();
        }
    })
}

async fn drain_progress(mut rx: mpsc::UnboundedReceiver<ProgressUpdate>, bar: ProgressBar) {
    while let Some(update) = rx.recv().await {
        // 并行任务的进度可能乱序到达，进度条只前进不后退
        if u64::from(update.percent) > bar.position() {
            bar.set_position(u64::from(update.percent));
        }
        bar.set_message(update.label);
    }
    bar.finish_and_clear();
}

/// 创建进度条
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
