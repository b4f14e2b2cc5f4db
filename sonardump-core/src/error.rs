use sonardump_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Malformed feed record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Invalid endpoint: {0}")]
    Endpoint(String),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
