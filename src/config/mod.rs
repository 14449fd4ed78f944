pub mod defaults;
pub mod settings;

pub use settings::{Config, DisplayConfig, IgnoreConfig, OutputFormat, ScanConfig};
