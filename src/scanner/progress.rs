use std::collections::BTreeSet;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// 扫描进度接收者
pub trait ProgressSink: Send + Sync {
    /// 报告进度（0-100）和当前处理的仓库名称；实现不得阻塞调用的工作线程
    fn report(&self, percent: u8, label: &str);
}

/// 作者信息接收者（只写，调用后不关心结果）
pub trait AuthorSink: Send + Sync {
    /// 扫描结果中出现的作者（去重、排序）
    fn authors_seen(&self, authors: &[String]);

    /// 本次扫描使用的作者过滤条件
    fn filter_author(&self, author: &str);
}

/// 不做任何事的进度接收者
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _percent: u8, _label: &str) {}
}

/// 进度更新
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub label: String,
}

/// 通过无界通道把进度投递回调用方，发送永不阻塞
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelProgress {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, percent: u8, label: &str) {
        // 接收端已关闭时直接丢弃
        let _ = self.tx.send(ProgressUpdate {
            percent: percent.min(100),
            label: label.to_string(),
        });
    }
}

/// 不记录作者信息
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuthors;

impl AuthorSink for NoopAuthors {
    fn authors_seen(&self, _authors: &[String]) {}

    fn filter_author(&self, _author: &str) {}
}

/// 在内存中记录见过的作者和最近使用的过滤作者
#[derive(Debug, Default)]
pub struct MemoryAuthors {
    seen: Mutex<BTreeSet<String>>,
    recent_filters: Mutex<Vec<String>>,
}

impl MemoryAuthors {
    /// 最近使用的过滤作者最多保留的数量
    const MAX_RECENT: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen
            .lock()
            .map(|seen| seen.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 最近使用的过滤作者，最新的在前
    pub fn recent_filters(&self) -> Vec<String> {
        self.recent_filters
            .lock()
            .map(|recent| recent.clone())
            .unwrap_or_default()
    }
}

impl AuthorSink for MemoryAuthors {
    fn authors_seen(&self, authors: &[String]) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.extend(authors.iter().cloned());
        }
    }

    fn filter_author(&self, author: &str) {
        if let Ok(mut recent) = self.recent_filters.lock() {
            recent.retain(|existing| !existing.eq_ignore_ascii_case(author));
            recent.insert(0, author.to_string());
            recent.truncate(Self::MAX_RECENT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_progress_never_blocks() {
        let (sink, mut rx) = ChannelProgress::channel();
        sink.report(150, "api");
        sink.report(20, "web");

        assert_eq!(rx.try_recv().unwrap(), ProgressUpdate { percent: 100, label: "api".to_string() });
        assert_eq!(rx.try_recv().unwrap().label, "web");

        // 接收端关闭后发送也不会出错
        drop(rx);
        sink.report(30, "late");
    }

    #[test]
    fn test_memory_authors() {
        let sink = MemoryAuthors::new();
        sink.authors_seen(&["bob".to_string(), "alice".to_string()]);
        sink.authors_seen(&["alice".to_string()]);
        sink.filter_author("alice");
        sink.filter_author("bob");
        sink.filter_author("Alice");

        assert_eq!(sink.seen(), vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(sink.recent_filters(), vec!["Alice".to_string(), "bob".to_string()]);
    }
}
