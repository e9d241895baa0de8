use thiserror::Error;

/// Problems building a classifier from configuration.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("amount pattern '{0}' must capture the number in group 1")]
    MissingCapture(String),

    #[error("merge window must be positive, got {0} minutes")]
    InvalidWindow(i64),
}
