use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use commit_scanner_cli::cli::{Cli, Commands, ConfigAction};
use commit_scanner_cli::config::Config;
use commit_scanner_cli::models::ScanState;
use commit_scanner_cli::operations::{self, ScanRequest};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志，输出到 stderr，避免混入表格和 JSON 输出
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    // 加载配置
    let mut config = if let Some(config_path) = &cli.config {
        Config::load_from_file(config_path)?
    } else {
        Config::load_or_create_default()?
    };

    // 根据命令执行相应操作
    match cli.command {
        None => {
            let request = ScanRequest {
                paths: resolve_paths(&cli.paths, &config)?,
                filter: cli.filter.to_filter(),
                format: config.display.format,
                output: None,
                show_progress: true,
            };
            finish_scan(operations::run_scan(&config, request).await?.state)
        }
        Some(Commands::Scan { paths, filter, format, output, jobs, no_prefilter, no_progress }) => {
            if jobs.is_some() {
                config.scan.workers = jobs;
            }
            if no_prefilter {
                config.scan.prefilter = false;
            }

            let request = ScanRequest {
                paths: resolve_paths(&paths, &config)?,
                filter: filter.to_filter(),
                format: format.unwrap_or(config.display.format),
                output,
                show_progress: !no_progress,
            };
            finish_scan(operations::run_scan(&config, request).await?.state)
        }
        Some(Commands::Repos { paths, format }) => {
            let paths = resolve_paths(&paths, &config)?;
            operations::run_repos(&config, paths, format.unwrap_or(config.display.format)).await
        }
        Some(Commands::Check) => operations::run_check(&config),
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Reset => {
                let path = match &cli.config {
                    Some(path) => path.clone(),
                    None => Config::default_config_path()?,
                };
                Config::default().save_to_file(&path)?;
                println!("已重置配置: {}", path.display());
                Ok(())
            }
            ConfigAction::Path => {
                println!("{}", Config::default_config_path()?.display());
                Ok(())
            }
        },
    }
}

/// 命令行路径优先，其次是配置中存在的扫描路径，最后是当前目录
fn resolve_paths(paths: &[String], config: &Config) -> Result<Vec<PathBuf>> {
    if !paths.is_empty() {
        return Ok(paths.iter().map(PathBuf::from).collect());
    }

    let configured = config.existing_scan_paths();
    if !configured.is_empty() {
        return Ok(configured);
    }

    Ok(vec![std::env::current_dir()?])
}

fn finish_scan(state: ScanState) -> Result<()> {
    if state == ScanState::Cancelled {
        // 与 shell 的 Ctrl-C 约定一致
        std::process::exit(130);
    }
    Ok(())
}
