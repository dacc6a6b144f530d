/// Failure of the durable session store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored session is invalid: {0}")]
    Corrupt(String),
}

/// Failure of the external completion service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("completion service unreachable: {0}")]
    Unavailable(String),
    #[error("completion service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion service returned an unusable response: {0}")]
    Malformed(String),
    #[error("completion service did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}
