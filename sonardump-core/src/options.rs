use sonardump_client::Credential;
use std::path::PathBuf;

/// Page size requested from every paginated listing.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Ceiling on concurrently running file downloads per server.
pub const DEFAULT_MAX_DOWNLOADS: usize = 50;

/// Options for configuring a crawl, threaded into every component
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Base directory that project (or per-host) directories are created in
    pub output_dir: PathBuf,
    /// List projects only, download nothing
    pub inspect_only: bool,
    /// Suppress non-fatal error output
    pub quiet: bool,
    pub page_size: u32,
    pub max_concurrent_downloads: usize,
    /// Tried first for every feed endpoint, before falling back to anonymous
    pub default_credential: Option<Credential>,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            inspect_only: false,
            quiet: false,
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent_downloads: DEFAULT_MAX_DOWNLOADS,
            default_credential: Some(Credential::default_pair()),
            show_progress_bars: false,
        }
    }
}
