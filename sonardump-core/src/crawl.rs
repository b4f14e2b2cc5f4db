use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::options::CrawlOptions;
use crate::paginate::collect_pages;
use crate::path::safe_join;
use crate::scheduler::DownloadScheduler;
use crate::walker::TreeWalker;
use sonardump_client::error::Result as ClientResult;
use sonardump_client::{Credential, ProjectSummary, RemoteTreeClient, SonarClient};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of crawling one server
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// One display line per discovered project, in server order
    pub lines: Vec<String>,
    /// Recovered listing and download errors
    pub errors: Vec<String>,
    pub projects: usize,
    pub files_written: usize,
    pub files_failed: usize,
    pub unrecognized: usize,
}

impl CrawlReport {
    fn recover(&mut self, quiet: bool, message: String) {
        if !quiet {
            warn!("{}", message);
        }
        self.errors.push(message);
    }
}

/// Builds a client bound to one endpoint and credential
pub trait ClientFactory: Send + Sync {
    fn connect(
        &self,
        endpoint: &Endpoint,
        credential: Option<&Credential>,
    ) -> ClientResult<Arc<dyn RemoteTreeClient>>;
}

/// Connects with [`SonarClient`] over HTTP(S)
#[derive(Debug, Default, Clone, Copy)]
pub struct SonarClientFactory;

impl ClientFactory for SonarClientFactory {
    fn connect(
        &self,
        endpoint: &Endpoint,
        credential: Option<&Credential>,
    ) -> ClientResult<Arc<dyn RemoteTreeClient>> {
        Ok(Arc::new(SonarClient::new(&endpoint.url(), credential.cloned())?))
    }
}

/// Lists and mirrors every project of one server
pub struct ServerCrawler {
    client: Arc<dyn RemoteTreeClient>,
    options: CrawlOptions,
}

impl ServerCrawler {
    pub fn new(client: Arc<dyn RemoteTreeClient>, options: CrawlOptions) -> Self {
        Self { client, options }
    }

    /// Only a failing first project-search page is returned as an error;
    /// everything after that is recovered into the report.
    pub async fn crawl(&self, base_dir: &Path) -> Result<CrawlReport> {
        let client = self.client.as_ref();
        let page_size = self.options.page_size;
        let projects = collect_pages(move |page| client.search_projects(page_size, page)).await?;

        let mut report = CrawlReport::default();
        if let Some(ref e) = projects.error {
            report.recover(self.options.quiet, format!("project search (partial): {}", e));
        }
        report.projects = projects.items.len();
        report.lines = projects.items.iter().map(ProjectSummary::display_line).collect();

        if self.options.inspect_only {
            return Ok(report);
        }

        let mut scheduler = DownloadScheduler::new(self.client.clone(), &self.options);
        for project in &projects.items {
            self.mirror_project(base_dir, project, &mut scheduler, &mut report)
                .await;
        }

        let summary = scheduler.finish().await;
        report.files_written = summary.succeeded;
        report.files_failed = summary.failed;
        report.errors.extend(summary.errors);

        info!(
            "{} project(s), {} file(s) written, {} failed",
            report.projects, report.files_written, report.files_failed
        );
        Ok(report)
    }

    async fn mirror_project(
        &self,
        base_dir: &Path,
        project: &ProjectSummary,
        scheduler: &mut DownloadScheduler,
        report: &mut CrawlReport,
    ) {
        let quiet = self.options.quiet;
        info!("Downloading {}", project.key);

        let project_root = safe_join(base_dir, &project.key);
        if let Err(e) = tokio::fs::create_dir_all(&project_root).await {
            report.recover(quiet, format!("cannot create {}: {}", project_root.display(), e));
            return;
        }

        let client = self.client.as_ref();
        let key = project.key.as_str();
        let page_size = self.options.page_size;
        let tree = match collect_pages(move |page| client.list_children(key, page_size, page)).await
        {
            Ok(tree) => tree,
            Err(e) => {
                report.recover(quiet, format!("listing {}: {}", key, e));
                return;
            }
        };
        if let Some(ref e) = tree.error {
            report.recover(quiet, format!("listing {} (partial): {}", key, e));
        }

        let walker = TreeWalker::new(self.client.clone(), &project_root, &self.options);
        let walked = walker.walk(&project_root, tree.items).await;

        report.unrecognized += walked.unrecognized.len();
        report.errors.extend(walked.errors);
        scheduler.submit_all(walked.tasks).await;
    }
}

/// Connect to `endpoint` and crawl it into `base_dir`
pub async fn crawl_endpoint(
    factory: &dyn ClientFactory,
    endpoint: &Endpoint,
    credential: Option<&Credential>,
    base_dir: &Path,
    options: &CrawlOptions,
) -> Result<CrawlReport> {
    let client = factory.connect(endpoint, credential)?;
    ServerCrawler::new(client, options.clone())
        .crawl(base_dir)
        .await
}

/// Crawl with `credential` first; if the server cannot be crawled with it,
/// try exactly once more anonymously.
pub async fn crawl_with_fallback(
    factory: &dyn ClientFactory,
    endpoint: &Endpoint,
    credential: Option<Credential>,
    base_dir: &Path,
    options: &CrawlOptions,
) -> Result<CrawlReport> {
    match crawl_endpoint(factory, endpoint, credential.as_ref(), base_dir, options).await {
        Ok(report) => Ok(report),
        Err(e) if credential.is_some() => {
            info!("{} refused credentials ({}), retrying anonymously", endpoint, e);
            crawl_endpoint(factory, endpoint, None, base_dir, options).await
        }
        Err(e) => Err(e),
    }
}
