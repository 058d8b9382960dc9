pub mod engine;
pub mod scanner;

pub use engine::{build_pool, search, search_since, search_with, ScanReport};
pub use scanner::KeywordScanner;
