pub mod crawl;
pub mod endpoint;
pub mod error;
pub mod feed;
pub mod options;
pub mod paginate;
pub mod path;
pub mod scheduler;
pub mod walker;

pub use crawl::{
    ClientFactory, CrawlReport, ServerCrawler, SonarClientFactory, crawl_endpoint,
    crawl_with_fallback,
};
pub use endpoint::Endpoint;
pub use error::CrawlError;
pub use feed::{FeedDriver, FeedRecord, FeedSummary, HostCallback, HostOutcome};
pub use options::CrawlOptions;
pub use path::{safe_join, sanitize_path};
