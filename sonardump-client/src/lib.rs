pub mod client;
pub mod error;
pub mod model;

pub use client::{RemoteTreeClient, SonarClient};
pub use error::ClientError;
pub use model::{Credential, Page, ProjectSummary, Qualifier, TreeNode};
