pub mod config;
pub mod errors;
pub mod files;
pub mod merge;
pub mod metrics;
pub mod partition;
pub mod pool;
pub mod report;
pub mod results;
pub mod search;

pub use config::{ConfigOverrides, EncodingMode, ScanMode, SearchConfig};
pub use errors::{SearchError, SearchResult};
pub use report::{ReportFormat, Reporter};
pub use results::{FinalResult, KeywordHits, KeywordSet, PartialResult, SkippedFile};
pub use search::{search, search_since, search_with, ScanReport};
