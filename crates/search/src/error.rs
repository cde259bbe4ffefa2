use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Empty query")]
    EmptyQuery,

    #[error("Board fingerprint failed: {0}")]
    Fingerprint(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
