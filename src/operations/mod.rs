pub mod report;
pub mod scan;

pub use scan::{run_check, run_repos, run_scan, ScanRequest};
