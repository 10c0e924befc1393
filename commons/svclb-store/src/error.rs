#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
