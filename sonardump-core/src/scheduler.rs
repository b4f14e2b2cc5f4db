// Bounded, join-able download queue

use crate::error::Result;
use crate::options::CrawlOptions;
use crate::walker::DownloadTask;
use indicatif::{ProgressBar, ProgressStyle};
use sonardump_client::RemoteTreeClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// Terminal states of every task admitted to one scheduler
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

type DownloadOutcome = std::result::Result<PathBuf, String>;

/// Runs downloads on spawned tasks, never more than `capacity` at once.
///
/// `submit` waits for a free slot before spawning, so a producer faster than
/// the network is held back. `finish` is the join point: it returns once
/// every admitted task has succeeded or failed.
pub struct DownloadScheduler {
    client: Arc<dyn RemoteTreeClient>,
    permits: Arc<Semaphore>,
    tasks: JoinSet<DownloadOutcome>,
    summary: ScheduleSummary,
    quiet: bool,
    progress_bar: Option<ProgressBar>,
}

impl DownloadScheduler {
    pub fn new(client: Arc<dyn RemoteTreeClient>, options: &CrawlOptions) -> Self {
        let capacity = options.max_concurrent_downloads.max(1);

        let progress_bar = if options.show_progress_bars {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Mirroring...");
            Some(pb)
        } else {
            None
        };

        Self {
            client,
            permits: Arc::new(Semaphore::new(capacity)),
            tasks: JoinSet::new(),
            summary: ScheduleSummary::default(),
            quiet: options.quiet,
            progress_bar,
        }
    }

    pub async fn submit(&mut self, task: DownloadTask) {
        while let Some(joined) = self.tasks.try_join_next() {
            self.record(joined);
        }

        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                self.record(Ok(Err(format!("{}: {}", task.node.key, e))));
                return;
            }
        };

        let client = self.client.clone();
        self.tasks.spawn(async move {
            let _permit = permit;
            download(client.as_ref(), &task)
                .await
                .map_err(|e| format!("{}: {}", task.node.key, e))
        });
    }

    pub async fn submit_all(&mut self, tasks: impl IntoIterator<Item = DownloadTask>) {
        for task in tasks {
            self.submit(task).await;
        }
    }

    /// Number of tasks spawned and not yet reaped
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every admitted download to reach a terminal state
    pub async fn finish(mut self) -> ScheduleSummary {
        while let Some(joined) = self.tasks.join_next().await {
            self.record(joined);
        }
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
        self.summary
    }

    fn record(&mut self, joined: std::result::Result<DownloadOutcome, JoinError>) {
        match joined {
            Ok(Ok(path)) => {
                debug!("Wrote {}", path.display());
                self.summary.succeeded += 1;
            }
            Ok(Err(message)) => self.record_failure(message),
            Err(e) => self.record_failure(format!("download task failed: {}", e)),
        }

        if let Some(ref pb) = self.progress_bar {
            pb.set_message(format!(
                "Mirroring... {} files written, {} failed",
                self.summary.succeeded, self.summary.failed
            ));
        }
    }

    fn record_failure(&mut self, message: String) {
        if !self.quiet {
            warn!("{}", message);
        }
        self.summary.failed += 1;
        self.summary.errors.push(message);
    }
}

/// Fetch one file and write it below its task's directory
pub async fn download(client: &dyn RemoteTreeClient, task: &DownloadTask) -> Result<PathBuf> {
    let raw = client.fetch_raw(&task.node.key).await?;

    let destination = task.destination();
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(&destination).await?;
    file.write_all(raw.as_bytes()).await?;
    file.flush().await?;

    Ok(destination)
}
