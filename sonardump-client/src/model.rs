use serde::{Deserialize, Serialize};
use std::fmt;

/// One page of a paginated listing. `page_index` starts at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_index: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page_index: u32, total_pages: u32) -> Self {
        Self {
            items,
            page_index,
            total_pages,
        }
    }

    /// A single page holding every item.
    pub fn single(items: Vec<T>) -> Self {
        Self::new(items, 1, 1)
    }

    pub fn is_last(&self) -> bool {
        self.page_index >= self.total_pages
    }
}

/// Paging block as returned by the web API. `total` counts items, not pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    #[serde(default = "first_page")]
    pub page_index: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total: u32,
}

fn first_page() -> u32 {
    1
}

impl Default for Paging {
    // A response without a paging block is a single, complete page
    fn default() -> Self {
        Self {
            page_index: first_page(),
            page_size: 0,
            total: 0,
        }
    }
}

impl Paging {
    /// Page count for this listing. `requested_page_size` stands in when the
    /// server leaves `pageSize` out or reports it as zero.
    pub fn total_pages(&self, requested_page_size: u32) -> u32 {
        let page_size = if self.page_size == 0 {
            requested_page_size
        } else {
            self.page_size
        };
        if page_size == 0 {
            return 1;
        }
        self.total.div_ceil(page_size).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub key: String,
    #[serde(default)]
    pub name: String,
}

impl ProjectSummary {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }

    /// `name (key)`, or just `key` when the two are the same.
    pub fn display_line(&self) -> String {
        if self.name.is_empty() || self.name == self.key {
            self.key.clone()
        } else {
            format!("{} ({})", self.name, self.key)
        }
    }
}

/// Component kind tag attached to every tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Qualifier {
    Directory,
    Branch,
    File,
    TestFile,
    Other(String),
}

impl Qualifier {
    pub fn as_str(&self) -> &str {
        match self {
            Qualifier::Directory => "DIR",
            Qualifier::Branch => "BRC",
            Qualifier::File => "FIL",
            Qualifier::TestFile => "UTS",
            Qualifier::Other(tag) => tag,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Qualifier::Directory | Qualifier::Branch)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Qualifier::File | Qualifier::TestFile)
    }
}

impl From<String> for Qualifier {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "DIR" => Qualifier::Directory,
            "BRC" => Qualifier::Branch,
            "FIL" => Qualifier::File,
            "UTS" => Qualifier::TestFile,
            _ => Qualifier::Other(tag),
        }
    }
}

impl From<Qualifier> for String {
    fn from(qualifier: Qualifier) -> Self {
        qualifier.as_str().to_string()
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    pub qualifier: Qualifier,
}

impl TreeNode {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        qualifier: Qualifier,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            path: path.into(),
            qualifier,
        }
    }
}

/// Username/password pair for HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The out-of-the-box administrator login.
    pub fn default_pair() -> Self {
        Self::new("admin", "admin")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectSearchResponse {
    #[serde(default)]
    pub paging: Paging,
    #[serde(default)]
    pub components: Vec<ProjectSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComponentTreeResponse {
    #[serde(default)]
    pub paging: Paging,
    #[serde(default)]
    pub components: Vec<TreeNode>,
}
