use std::collections::HashSet;

pub struct DefaultConfig;

impl DefaultConfig {
    /// 默认不进入的目录名
    pub fn default_ignore_dirs() -> HashSet<String> {
        [
            // 常见的依赖和构建目录
            "node_modules",
            "bower_components",
            "__pycache__",
            ".pytest_cache",
            ".venv",
            "venv",
            // macOS 系统目录
            ".Trash",
            ".Trashes",
            ".fseventsd",
            ".Spotlight-V100",
            ".DocumentRevisions-V100",
            // Windows 系统目录
            "$RECYCLE.BIN",
            "System Volume Information",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// 默认扫描的根目录
    pub fn default_scan_paths() -> Vec<String> {
        ["Code", "Projects", "Development", "src"]
            .iter()
            .map(|name| {
                dirs::home_dir()
                    .map(|p| p.join(name).to_string_lossy().to_string())
                    .unwrap_or_else(|| format!("~/{}", name))
            })
            .collect()
    }
}
