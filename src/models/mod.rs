pub mod commit;
pub mod filter;
pub mod repository;
pub mod scan_result;

pub use commit::{sort_newest_first, CommitRecord};
pub use filter::{AuthorFilter, ResolvedFilter, ScanFilter};
pub use repository::RepositoryHandle;
pub use scan_result::{ScanOutcome, ScanState, ScanStats};
