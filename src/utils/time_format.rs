use chrono::{Duration, NaiveDate, NaiveDateTime};

/// 提交日期的固定格式，字典序与时间顺序一致
pub const COMMIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 命令行日期参数格式
pub const DATE_ARG_FORMAT: &str = "%Y-%m-%d";

/// 解析提交日期，无法解析时返回最小时间（排序时视为最旧）
pub fn parse_commit_date(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value.trim(), COMMIT_DATE_FORMAT)
        .unwrap_or(NaiveDateTime::MIN)
}

/// 解析 `yyyy-MM-dd` 形式的日期参数
pub fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_ARG_FORMAT)
        .map_err(|e| format!("无效日期 '{}'，应为 YYYY-MM-DD: {}", value, e))
}

/// 传给 git 的日期边界，显式带上零点，避免 git 用当前时刻补全
pub fn format_git_boundary(date: NaiveDate) -> String {
    format!("{} 00:00:00", date.format(DATE_ARG_FORMAT))
}

/// 传给 git 的排他上界：git 的 `--until` 包含边界时刻本身，所以取前一天的最后一秒
pub fn format_git_until(date: NaiveDate) -> String {
    match date.pred_opt() {
        Some(previous) => format!("{} 23:59:59", previous.format(DATE_ARG_FORMAT)),
        None => format_git_boundary(date),
    }
}

/// 截止日期缺省时取“明天”，保证当天的提交不会被排他上界漏掉
pub fn default_until(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_signed(Duration::days(1))
        .unwrap_or(today)
}

/// 格式化耗时 (例如: "1m 5s")
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    let seconds = elapsed.as_secs();
    if seconds < 60 {
        format!("{}.{:01}s", seconds, elapsed.subsec_millis() / 100)
    } else {
        format!("{}m {}s", seconds / 60, seconds % 60)
    }
}
