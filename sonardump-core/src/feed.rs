// Batch mode driven by a Shodan-style reconnaissance export

use crate::crawl::{ClientFactory, CrawlReport, crawl_with_fallback};
use crate::endpoint::Endpoint;
use crate::error::{CrawlError, Result};
use crate::options::CrawlOptions;
use crate::path::safe_join;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// File the raw record is kept in, next to the host's mirrored projects
pub const RECORD_FILE_NAME: &str = "shodan.json";

/// The fields of a feed record we use. Everything is optional so a sparse or
/// partly-null record still decodes; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedRecord {
    #[serde(rename = "_shodan")]
    pub meta: Option<FeedMeta>,
    pub http: Option<HttpInfo>,
    pub ssl: Option<SslInfo>,
    pub port: Option<u16>,
    pub ip_str: Option<String>,
    pub org: Option<String>,
    pub asn: Option<String>,
    pub isp: Option<String>,
    pub product: Option<String>,
    pub hostnames: Option<Vec<String>>,
    pub domains: Option<Vec<String>>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedMeta {
    pub id: Option<String>,
    pub module: Option<String>,
    pub crawler: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpInfo {
    pub host: Option<String>,
    pub title: Option<String>,
    pub server: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SslInfo {
    pub cert: Option<Certificate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Certificate {
    pub subject: Option<CertSubject>,
    pub extensions: Option<Vec<CertExtension>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertSubject {
    #[serde(rename = "CN")]
    pub common_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertExtension {
    pub name: Option<String>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    pub country_name: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl FeedRecord {
    pub fn parse(line: &str) -> Result<Self> {
        Self::from_slice(line.as_bytes())
    }

    /// Decode one raw feed line. Bytes that are not UTF-8 are a decode error.
    pub fn from_slice(line: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(line)?)
    }

    fn module(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| non_empty(&m.module))
    }

    /// `https` when the service was banner-grabbed over TLS, else `http`
    pub fn scheme(&self) -> &'static str {
        if self.module() == Some("https") {
            "https"
        } else {
            "http"
        }
    }

    /// HTTP host as seen by the crawler, falling back to the bare IP
    pub fn host(&self) -> Option<&str> {
        self.http
            .as_ref()
            .and_then(|h| non_empty(&h.host))
            .or_else(|| non_empty(&self.ip_str))
    }

    pub fn host_port(&self) -> Option<String> {
        Some(format!("{}:{}", self.host()?, self.port?))
    }

    fn used_tls(&self) -> bool {
        self.module() == Some("https") || self.ssl.is_some()
    }

    /// Human-readable description of the host, one fact per line
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("host: {}", self.host().unwrap_or("?")),
            format!(
                "port: {}",
                self.port.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string())
            ),
            format!("scheme: {}", self.scheme()),
            format!(
                "org: {} ({})",
                non_empty(&self.org).unwrap_or("?"),
                non_empty(&self.asn).unwrap_or("?")
            ),
        ];

        if self.used_tls()
            && let Some(cert) = self.ssl.as_ref().and_then(|s| s.cert.as_ref())
        {
            if let Some(cn) = cert.subject.as_ref().and_then(|s| non_empty(&s.common_name)) {
                lines.push(format!("ssl.cert.subject.cn: {}", cn));
            }
            for extension in cert.extensions.iter().flatten() {
                if extension.name.as_deref() == Some("subjectAltName")
                    && let Some(data) = non_empty(&extension.data)
                {
                    lines.push(format!("ssl.cert.extensions[subjectAltName]: {}", data));
                }
            }
        }

        if let Some(hostnames) = self.hostnames.as_ref().filter(|h| !h.is_empty()) {
            lines.push("hostnames:".to_string());
            for hostname in hostnames {
                lines.push(format!("    {}", hostname));
            }
        }

        lines
    }
}

/// What happened to one feed record
#[derive(Debug)]
pub struct HostOutcome {
    pub endpoint: Endpoint,
    pub summary: Vec<String>,
    /// Per-host mirror directory (mirroring mode only)
    pub host_dir: Option<PathBuf>,
    pub result: Result<CrawlReport>,
}

/// Callback invoked once per decoded record, after its crawl finished
pub type HostCallback = Arc<dyn Fn(&HostOutcome) + Send + Sync>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedSummary {
    pub records: usize,
    pub decode_errors: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct FeedDriver {
    factory: Arc<dyn ClientFactory>,
    options: CrawlOptions,
}

impl FeedDriver {
    pub fn new(factory: Arc<dyn ClientFactory>, options: CrawlOptions) -> Self {
        Self { factory, options }
    }

    /// Crawl every host in the newline-delimited feed at `path`.
    ///
    /// Only an unreadable feed file is an error; bad records and unreachable
    /// hosts are logged and skipped.
    pub async fn run(&self, path: &Path, on_host: Option<HostCallback>) -> Result<FeedSummary> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| CrawlError::Feed(format!("{}: {}", path.display(), e)))?;
        if metadata.is_dir() {
            return Err(CrawlError::Feed(format!(
                "{} is not a file",
                path.display()
            )));
        }

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| CrawlError::Feed(format!("{}: {}", path.display(), e)))?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();

        let mut summary = FeedSummary::default();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            if line.trim_ascii().is_empty() {
                continue;
            }
            summary.records += 1;

            let outcome = match self.process_line(line).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    summary.decode_errors += 1;
                    if !self.options.quiet {
                        warn!("skipping record {}: {}", summary.records, e);
                    }
                    continue;
                }
            };

            match outcome.result {
                Ok(_) => summary.succeeded += 1,
                Err(ref e) => {
                    summary.failed += 1;
                    if !self.options.quiet {
                        warn!("{}: {}", outcome.endpoint, e);
                    }
                }
            }
            if let Some(ref callback) = on_host {
                callback(&outcome);
            }
        }

        info!(
            "Feed done: {} record(s), {} crawled, {} failed, {} undecodable",
            summary.records, summary.succeeded, summary.failed, summary.decode_errors
        );
        Ok(summary)
    }

    /// Decode one record and crawl the host it describes.
    ///
    /// `Err` means the record itself was unusable; a host that could not be
    /// crawled is reported through `HostOutcome::result`. The line is kept
    /// byte for byte in the host's record file.
    pub async fn process_line(&self, line: &[u8]) -> Result<HostOutcome> {
        let record = FeedRecord::from_slice(line)?;
        let endpoint = Endpoint::from_record(&record)?;
        info!("Checking {}", endpoint);

        let mut outcome = HostOutcome {
            summary: record.summary(),
            endpoint,
            host_dir: None,
            result: Ok(CrawlReport::default()),
        };

        let base_dir = if self.options.inspect_only {
            self.options.output_dir.clone()
        } else {
            let host_dir = safe_join(&self.options.output_dir, &outcome.endpoint.dir_name());
            if let Err(e) = self.prepare_host_dir(&host_dir, line).await {
                outcome.result = Err(e);
                return Ok(outcome);
            }
            outcome.host_dir = Some(host_dir.clone());
            host_dir
        };

        outcome.result = crawl_with_fallback(
            self.factory.as_ref(),
            &outcome.endpoint,
            self.options.default_credential.clone(),
            &base_dir,
            &self.options,
        )
        .await;
        Ok(outcome)
    }

    async fn prepare_host_dir(&self, host_dir: &Path, line: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(host_dir).await?;
        tokio::fs::write(host_dir.join(RECORD_FILE_NAME), line).await?;
        Ok(())
    }
}
