use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid corpus: {0}")]
    InvalidCorpus(String),

    #[error("Dimension mismatch: query has {actual} dimensions, corpus has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A corpus source or embedder failed; the underlying error is passed through untouched.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
