use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use anyhow::Result;

use crate::config::defaults::DefaultConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 未指定路径时扫描的根目录列表
    pub scan_paths: Vec<String>,

    /// 忽略配置
    pub ignore: IgnoreConfig,

    /// 扫描配置
    pub scan: ScanConfig,

    /// 显示配置
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// 遍历时不进入的目录名
    pub directories: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 工作线程数，不设置时为 CPU 核心数减一
    pub workers: Option<usize>,

    /// 最大遍历深度
    pub max_depth: Option<usize>,

    /// 是否跟随符号链接
    pub follow_symlinks: bool,

    /// 有日期或作者条件时先用单条查询预过滤仓库
    pub prefilter: bool,

    /// `.git` 为文件（worktree、子模块）时调用 git 确认
    pub verify_gitlinks: bool,

    /// 每个仓库单次查询的提交上限
    pub max_commits: usize,

    /// git 可执行文件
    pub git_executable: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// 默认输出格式
    pub format: OutputFormat,

    /// 表格中提交信息的最大显示宽度（字符数）
    pub max_message_width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 表格格式
    Table,
    /// JSON 格式
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_paths: DefaultConfig::default_scan_paths(),
            ignore: IgnoreConfig::default(),
            scan: ScanConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            directories: DefaultConfig::default_ignore_dirs(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: None,
            max_depth: None,
            follow_symlinks: false,
            prefilter: true,
            verify_gitlinks: true,
            max_commits: crate::scanner::git_query::DEFAULT_MAX_COMMITS,
            git_executable: "git".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            max_message_width: 72,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        // 确保目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 获取默认配置文件路径
    pub fn default_config_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("无法找到配置目录"))?;
        path.push("commit-scanner-cli");
        path.push("config.toml");
        Ok(path)
    }

    /// 加载配置，如果文件不存在则创建默认配置
    pub fn load_or_create_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            if let Err(err) = config.save_to_file(&config_path) {
                // 配置目录不可写时仍然可以用默认配置运行
                tracing::warn!("无法写入默认配置 {}: {}", config_path.display(), err);
            }
            Ok(config)
        }
    }

    /// 只保留存在的默认扫描路径
    pub fn existing_scan_paths(&self) -> Vec<PathBuf> {
        self.scan_paths
            .iter()
            .map(PathBuf::from)
            .filter(|p| p.is_dir())
            .collect()
    }
}
