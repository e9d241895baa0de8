use thiserror::Error;

/// Batch-level failures. Per-message rejections never surface here.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The source refused access; the caller must re-authorize before retrying.
    #[error("access to the message source was refused, re-authenticate: {0}")]
    ReauthRequired(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("message source error: {0}")]
    Source(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl SyncError {
    pub fn is_reauth(&self) -> bool {
        matches!(self, SyncError::ReauthRequired(_))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
