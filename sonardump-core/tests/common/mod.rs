// In-memory server shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use sonardump_client::error::Result;
use sonardump_client::{
    ClientError, Credential, Page, ProjectSummary, Qualifier, RemoteTreeClient, TreeNode,
};
use sonardump_core::{ClientFactory, Endpoint};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn dir(key: &str, name: &str, path: &str) -> TreeNode {
    TreeNode::new(key, name, path, Qualifier::Directory)
}

pub fn file(key: &str, name: &str) -> TreeNode {
    TreeNode::new(key, name, "", Qualifier::File)
}

fn paginate<T: Clone>(items: &[T], page_size: u32, page: u32) -> Page<T> {
    let page_size = page_size.max(1) as usize;
    let total_pages = items.len().div_ceil(page_size).max(1) as u32;
    let start = (page as usize - 1) * page_size;
    let chunk = items.iter().skip(start).take(page_size).cloned().collect();
    Page::new(chunk, page, total_pages)
}

#[derive(Default)]
pub struct FakeClient {
    projects: Vec<ProjectSummary>,
    trees: HashMap<String, Vec<TreeNode>>,
    files: HashMap<String, String>,
    failing_files: HashSet<String>,
    failing_listings: HashSet<String>,
    reject_all: bool,
    fetch_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A server that refuses every request
    pub fn rejecting() -> Self {
        Self {
            reject_all: true,
            ..Self::default()
        }
    }

    pub fn with_project(mut self, key: &str, name: &str) -> Self {
        self.projects.push(ProjectSummary::new(key, name));
        self
    }

    pub fn with_children(mut self, parent: &str, children: Vec<TreeNode>) -> Self {
        self.trees.insert(parent.to_string(), children);
        self
    }

    pub fn with_file(mut self, key: &str, content: &str) -> Self {
        self.files.insert(key.to_string(), content.to_string());
        self
    }

    pub fn with_failing_file(mut self, key: &str) -> Self {
        self.failing_files.insert(key.to_string());
        self
    }

    pub fn with_failing_listing(mut self, key: &str) -> Self {
        self.failing_listings.insert(key.to_string());
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_access(&self, what: &str) -> Result<()> {
        if self.reject_all {
            Err(ClientError::Unauthorized(what.to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteTreeClient for FakeClient {
    async fn search_projects(&self, page_size: u32, page: u32) -> Result<Page<ProjectSummary>> {
        self.log(format!("search:{}", page));
        self.check_access("projects/search")?;
        Ok(paginate(&self.projects, page_size, page))
    }

    async fn list_children(
        &self,
        component_key: &str,
        page_size: u32,
        page: u32,
    ) -> Result<Page<TreeNode>> {
        self.log(format!("tree:{}:{}", component_key, page));
        self.check_access("components/tree")?;
        if self.failing_listings.contains(component_key) {
            return Err(ClientError::Status {
                status: 500,
                url: format!("components/tree?component={}", component_key),
            });
        }
        let children = self.trees.get(component_key).cloned().unwrap_or_default();
        Ok(paginate(&children, page_size, page))
    }

    async fn fetch_raw(&self, component_key: &str) -> Result<String> {
        self.log(format!("raw:{}", component_key));
        self.check_access("sources/raw")?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_files.contains(component_key) {
            return Err(ClientError::Other(format!("{} is gone", component_key)));
        }
        Ok(self
            .files
            .get(component_key)
            .cloned()
            .unwrap_or_else(|| format!("content of {}", component_key)))
    }
}

/// Hands out `accepted` unless the credential used is refused, and records
/// the credential of every connection attempt.
pub struct FakeFactory {
    accepted: Arc<FakeClient>,
    reject_credentials: bool,
    reject_anonymous: bool,
    attempts: Mutex<Vec<Option<Credential>>>,
}

impl FakeFactory {
    pub fn new(accepted: FakeClient) -> Self {
        Self {
            accepted: Arc::new(accepted),
            reject_credentials: false,
            reject_anonymous: false,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    pub fn rejecting_anonymous(mut self) -> Self {
        self.reject_anonymous = true;
        self
    }

    pub fn attempts(&self) -> Vec<Option<Credential>> {
        self.attempts.lock().unwrap().clone()
    }
}

impl ClientFactory for FakeFactory {
    fn connect(
        &self,
        _endpoint: &Endpoint,
        credential: Option<&Credential>,
    ) -> Result<Arc<dyn RemoteTreeClient>> {
        self.attempts.lock().unwrap().push(credential.cloned());

        let refused = match credential {
            Some(_) => self.reject_credentials,
            None => self.reject_anonymous,
        };
        if refused {
            Ok(Arc::new(FakeClient::rejecting()))
        } else {
            Ok(self.accepted.clone())
        }
    }
}
