use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 发现的 Git 仓库
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryHandle {
    /// 仓库绝对路径（尽可能规范化）
    pub path: PathBuf,

    /// 显示名称（路径最后一段）
    pub name: String,
}

impl RepositoryHandle {
    /// 根据路径创建仓库句柄，路径会被规范化
    pub fn from_path(path: &Path) -> Self {
        let path = canonical_or_absolute(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Self { path, name }
    }

    /// 仓库所在目录的名称（文件系统根目录下的仓库返回空字符串）
    pub fn folder_name(&self) -> String {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// 去重用的键：规范化后的绝对路径，在大小写不敏感的文件系统上转为小写
    pub fn dedup_key(&self) -> String {
        let key = self.path.to_string_lossy().to_string();
        if cfg!(any(windows, target_os = "macos")) {
            key.to_lowercase()
        } else {
            key
        }
    }
}

/// 规范化路径；规范化失败时退回到绝对路径
pub fn canonical_or_absolute(path: &Path) -> PathBuf {
    match std::fs::canonicalize(path) {
        Ok(canonical) => strip_verbatim_prefix(canonical),
        Err(_) => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// Windows 上 canonicalize 会带 `\\?\` 前缀，显示和比较时去掉
fn strip_verbatim_prefix(path: PathBuf) -> PathBuf {
    if cfg!(windows) {
        let text = path.to_string_lossy();
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            if !stripped.starts_with("UNC") {
                return PathBuf::from(stripped);
            }
        }
    }
    path
}
