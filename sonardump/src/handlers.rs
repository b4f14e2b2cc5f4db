use anyhow::{Context, Result};
use colored::Colorize;
use sonardump_core::options::DEFAULT_MAX_DOWNLOADS;
use sonardump_core::{
    CrawlOptions, CrawlReport, Endpoint, FeedDriver, FeedSummary, HostCallback, HostOutcome,
    SonarClientFactory, crawl_with_fallback,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// What the invocation asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Crawl the server behind one API URL
    Single(String),
    /// Crawl every host listed in a feed file
    Feed(PathBuf),
}

/// Pick the run mode; `None` means neither a URL nor a feed was supplied.
pub fn select_mode(url: Option<&String>, feed: Option<&PathBuf>) -> Option<Mode> {
    match (url, feed) {
        (_, Some(feed)) => Some(Mode::Feed(feed.clone())),
        (Some(url), None) => Some(Mode::Single(url.clone())),
        (None, None) => None,
    }
}

/// Expand `~` and environment variables in the output directory
pub fn resolve_output_dir(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

pub fn build_options(output: &str, threads: usize, inspect_only: bool, quiet: bool) -> CrawlOptions {
    CrawlOptions {
        output_dir: resolve_output_dir(output),
        inspect_only,
        quiet,
        max_concurrent_downloads: if threads == 0 {
            DEFAULT_MAX_DOWNLOADS
        } else {
            threads
        },
        show_progress_bars: !inspect_only && !quiet,
        ..CrawlOptions::default()
    }
}

/// Filter used when `RUST_LOG` is unset
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for inspection output.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Lines printed for one host in inspection mode
pub fn format_host_listing(summary: &[String], projects: &[String]) -> Vec<String> {
    let mut lines = Vec::with_capacity(summary.len() + projects.len() + 2);
    lines.push(String::new());
    lines.extend(summary.iter().cloned());
    lines.push("projects:".to_string());
    lines.extend(projects.iter().map(|p| format!("    {}", p)));
    lines
}

fn print_report(report: &CrawlReport, inspect_only: bool) {
    if inspect_only {
        for line in &report.lines {
            println!("{}", line);
        }
        return;
    }
    eprintln!(
        "{} {} project(s), {} file(s) written, {} failed",
        "✓".green().bold(),
        report.projects,
        report.files_written,
        report.files_failed
    );
}

/// Crawl a single server. Connection-level failure is returned to the caller.
pub async fn handle_single(url: &str, options: &CrawlOptions) -> Result<CrawlReport> {
    let (endpoint, credential) =
        Endpoint::parse(url).with_context(|| format!("cannot use {} as an API root", url))?;
    info!("Checking {}", endpoint);

    if !options.inspect_only {
        tokio::fs::create_dir_all(&options.output_dir)
            .await
            .with_context(|| format!("cannot create {}", options.output_dir.display()))?;
    }

    let report = crawl_with_fallback(
        &SonarClientFactory,
        &endpoint,
        credential,
        &options.output_dir,
        options,
    )
    .await
    .with_context(|| format!("cannot crawl {}", endpoint))?;

    print_report(&report, options.inspect_only);
    Ok(report)
}

/// Failed hosts are already logged by the feed driver
fn host_callback(inspect_only: bool) -> HostCallback {
    Arc::new(move |outcome: &HostOutcome| match outcome.result {
        Ok(ref report) if inspect_only => {
            for line in format_host_listing(&outcome.summary, &report.lines) {
                println!("{}", line);
            }
        }
        Ok(ref report) => eprintln!(
            "{} {}: {} file(s) written",
            "✓".green().bold(),
            outcome.endpoint.host_port(),
            report.files_written
        ),
        Err(_) => {}
    })
}

/// Crawl every host in the feed at `path`. Only an unreadable feed is fatal.
pub async fn handle_feed(path: &Path, options: &CrawlOptions) -> Result<FeedSummary> {
    let driver = FeedDriver::new(Arc::new(SonarClientFactory), options.clone());
    let callback = host_callback(options.inspect_only);

    let summary = driver
        .run(path, Some(callback))
        .await
        .with_context(|| format!("cannot read feed {}", path.display()))?;

    if !options.quiet {
        eprintln!(
            "{} {} host(s) crawled, {} unreachable, {} unusable record(s)",
            "✓".green().bold(),
            summary.succeeded,
            summary.failed,
            summary.decode_errors
        );
    }
    Ok(summary)
}
