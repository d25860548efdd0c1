//! Error types for the loader

/// Rejected loader configuration. Raised by `start`/`reset` before any fetch.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("items_per_page must be positive")]
    ZeroItemsPerPage,
    #[error("threshold must be a finite, non-negative distance (got {0})")]
    InvalidThreshold(f64),
}

/// A data source failed to produce a page
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for FetchError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for FetchError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Failure of a single load attempt, as surfaced to whoever drove it
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("fetching page {page} failed: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },
}
