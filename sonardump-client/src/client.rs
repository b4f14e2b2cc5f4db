use crate::error::{ClientError, Result};
use crate::model::{
    ComponentTreeResponse, Credential, Page, ProjectSearchResponse, ProjectSummary, TreeNode,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The three read operations a mirror needs from an indexing server.
#[async_trait]
pub trait RemoteTreeClient: Send + Sync {
    async fn search_projects(&self, page_size: u32, page: u32) -> Result<Page<ProjectSummary>>;

    /// Direct children of `component_key` (strategy `children`).
    async fn list_children(
        &self,
        component_key: &str,
        page_size: u32,
        page: u32,
    ) -> Result<Page<TreeNode>>;

    async fn fetch_raw(&self, component_key: &str) -> Result<String>;
}

/// `RemoteTreeClient` over the SonarQube web API rooted at e.g. `https://host/api`.
pub struct SonarClient {
    client: Client,
    base_url: Url,
    credential: Option<Credential>,
}

impl SonarClient {
    pub fn new(base_url: &str, credential: Option<Credential>) -> Result<Self> {
        Self::with_timeout(base_url, credential, 30)
    }

    pub fn with_timeout(
        base_url: &str,
        credential: Option<Credential>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("sonardump/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs / 2))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            base_url,
            credential,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self.client.get(url);
        match self.credential {
            Some(ref credential) => {
                request.basic_auth(&credential.username, Some(&credential.password))
            }
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        debug!("GET {}", url);
        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ClientError::Unauthorized(url.to_string()))
            }
            status => Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl RemoteTreeClient for SonarClient {
    async fn search_projects(&self, page_size: u32, page: u32) -> Result<Page<ProjectSummary>> {
        let url = self.endpoint(&["projects", "search"]);
        let request = self
            .get(url.clone())
            .query(&[("ps", page_size.to_string()), ("p", page.to_string())]);

        let body: ProjectSearchResponse = self
            .send(request, &url)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("project search: {}", e)))?;

        Ok(Page::new(
            body.components,
            body.paging.page_index,
            body.paging.total_pages(page_size),
        ))
    }

    async fn list_children(
        &self,
        component_key: &str,
        page_size: u32,
        page: u32,
    ) -> Result<Page<TreeNode>> {
        let url = self.endpoint(&["components", "tree"]);
        let request = self.get(url.clone()).query(&[
            ("component", component_key.to_string()),
            ("ps", page_size.to_string()),
            ("p", page.to_string()),
            ("strategy", "children".to_string()),
        ]);

        let body: ComponentTreeResponse = self
            .send(request, &url)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("tree of {}: {}", component_key, e)))?;

        Ok(Page::new(
            body.components,
            body.paging.page_index,
            body.paging.total_pages(page_size),
        ))
    }

    async fn fetch_raw(&self, component_key: &str) -> Result<String> {
        let url = self.endpoint(&["sources", "raw"]);
        let request = self.get(url.clone()).query(&[("key", component_key)]);
        Ok(self.send(request, &url).await?.text().await?)
    }
}
