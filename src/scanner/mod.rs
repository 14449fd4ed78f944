pub mod commit_collector;
pub mod coordinator;
pub mod git_query;
pub mod pre_filter;
pub mod process_runner;
pub mod progress;
pub mod repo_detector;
pub mod repo_walker;

pub use commit_collector::{CollectOutcome, CommitCollector};
pub use coordinator::{dedupe_repositories, default_workers, ScanCoordinator, ScanOptions};
pub use pre_filter::PreFilter;
pub use process_runner::{CommandRunner, GitCli};
pub use progress::{
    AuthorSink, ChannelProgress, MemoryAuthors, NoopAuthors, NoopProgress, ProgressSink,
    ProgressUpdate,
};
pub use repo_detector::RepositoryDetector;
pub use repo_walker::{Discovery, RepositoryWalker};
