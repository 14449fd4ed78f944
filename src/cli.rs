use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputFormat;
use crate::models::ScanFilter;
use crate::utils::parse_date_arg;

#[derive(Parser)]
#[command(name = "commit-scanner")]
#[command(about = "查找目录下的 Git 仓库并汇总提交历史")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 默认扫描的路径（不带子命令时使用）
    pub paths: Vec<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 详细输出
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 扫描指定目录中的仓库并列出提交
    Scan {
        /// 要扫描的目录路径
        paths: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// 输出格式
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// 保存结果到文件
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 工作线程数
        #[arg(short, long)]
        jobs: Option<usize>,

        /// 禁用预过滤
        #[arg(long)]
        no_prefilter: bool,

        /// 不显示进度条
        #[arg(long)]
        no_progress: bool,
    },

    /// 只列出发现的仓库及其首次提交日期
    Repos {
        /// 要扫描的目录路径
        paths: Vec<String>,

        /// 输出格式
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// 检查 git 是否可用
    Check,

    /// 管理配置
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// 起始日期（包含），格式 YYYY-MM-DD
    #[arg(long, value_parser = parse_date_arg)]
    pub since: Option<NaiveDate>,

    /// 截止日期（不包含），格式 YYYY-MM-DD，默认为明天
    #[arg(long, value_parser = parse_date_arg)]
    pub until: Option<NaiveDate>,

    /// 交给 git --author 的作者模式
    #[arg(long)]
    pub author: Option<String>,

    /// 作者名关键字，逗号分隔，任一匹配即保留（不区分大小写）
    #[arg(long = "filter", value_name = "KEYWORDS")]
    pub author_contains: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// 显示当前配置
    Show,

    /// 重置为默认配置
    Reset,

    /// 显示配置文件路径
    Path,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ScanFilter {
        ScanFilter {
            since: self.since,
            until: self.until,
            author: self.author.clone(),
            author_contains: self.author_contains.clone(),
        }
    }
}
