// Recursive walk over a project's component tree

use crate::options::CrawlOptions;
use crate::paginate::collect_pages;
use crate::path::safe_join;
use futures::future::{BoxFuture, FutureExt};
use sonardump_client::{Qualifier, RemoteTreeClient, TreeNode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A leaf file waiting to be fetched into `local_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub local_dir: PathBuf,
    pub node: TreeNode,
}

impl DownloadTask {
    pub fn new(local_dir: PathBuf, node: TreeNode) -> Self {
        Self { local_dir, node }
    }

    /// Local file the node's content is written to
    pub fn destination(&self) -> PathBuf {
        let name = if self.node.name.is_empty() {
            self.node.key.rsplit(['/', ':']).next().unwrap_or_default()
        } else {
            self.node.name.as_str()
        };
        safe_join(&self.local_dir, name)
    }
}

/// Everything one walk produced
#[derive(Debug, Default)]
pub struct WalkReport {
    pub tasks: Vec<DownloadTask>,
    /// Local directories created for containers, in creation order
    pub directories: Vec<PathBuf>,
    /// One diagnostic line per node with an unknown qualifier
    pub unrecognized: Vec<String>,
    /// Recovered listing and directory errors
    pub errors: Vec<String>,
}

pub struct TreeWalker {
    client: Arc<dyn RemoteTreeClient>,
    project_root: PathBuf,
    page_size: u32,
    quiet: bool,
}

impl TreeWalker {
    /// Container paths are resolved below `project_root`
    pub fn new(
        client: Arc<dyn RemoteTreeClient>,
        project_root: impl Into<PathBuf>,
        options: &CrawlOptions,
    ) -> Self {
        Self {
            client,
            project_root: project_root.into(),
            page_size: options.page_size,
            quiet: options.quiet,
        }
    }

    /// Walk `nodes` depth-first, creating directories for containers and
    /// collecting a download task for every file.
    pub async fn walk(&self, local_dir: &Path, nodes: Vec<TreeNode>) -> WalkReport {
        let mut report = WalkReport::default();
        let module_root = self.project_root.clone();
        self.walk_level(module_root, local_dir.to_path_buf(), nodes, &mut report)
            .await;
        report
    }

    /// `module_root` is the directory of the nearest enclosing branch, or the
    /// project root at top level. Container paths are relative to it.
    fn walk_level<'a>(
        &'a self,
        module_root: PathBuf,
        local_dir: PathBuf,
        nodes: Vec<TreeNode>,
        report: &'a mut WalkReport,
    ) -> BoxFuture<'a, ()> {
        async move {
            for node in nodes {
                if node.qualifier.is_container() {
                    self.descend(&module_root, &local_dir, node, report).await;
                } else if node.qualifier.is_leaf() {
                    report.tasks.push(DownloadTask::new(local_dir.clone(), node));
                } else {
                    let line = format!("Unknown qualifier {} ({})", node.qualifier, node.key);
                    warn!("{}", line);
                    report.unrecognized.push(line);
                }
            }
        }
        .boxed()
    }

    async fn descend(
        &self,
        module_root: &Path,
        local_dir: &Path,
        node: TreeNode,
        report: &mut WalkReport,
    ) {
        let dir = container_dir(module_root, local_dir, &node);

        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            self.recover(report, format!("cannot create {}: {}", dir.display(), e));
            return;
        }
        debug!("Created {}", dir.display());
        report.directories.push(dir.clone());

        let client = self.client.as_ref();
        let key = node.key.as_str();
        let page_size = self.page_size;
        let children =
            match collect_pages(move |page| client.list_children(key, page_size, page)).await {
                Ok(children) => children,
                Err(e) => {
                    self.recover(report, format!("listing {}: {}", key, e));
                    return;
                }
            };
        if let Some(ref e) = children.error {
            self.recover(report, format!("listing {} (partial): {}", key, e));
        }

        let child_root = if node.qualifier == Qualifier::Branch {
            dir.clone()
        } else {
            module_root.to_path_buf()
        };
        self.walk_level(child_root, dir, children.items, report)
            .await;
    }

    fn recover(&self, report: &mut WalkReport, message: String) {
        if !self.quiet {
            warn!("{}", message);
        }
        report.errors.push(message);
    }
}

fn container_dir(module_root: &Path, local_dir: &Path, node: &TreeNode) -> PathBuf {
    if node.path.is_empty() {
        safe_join(local_dir, &node.name)
    } else {
        safe_join(module_root, &node.path)
    }
}
