use thiserror::Error;

/// Why an image could not be produced. Cloneable so one failed fetch can be
/// delivered to every caller that was waiting on the same URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("failed to decode {url}: {message}")]
    Decode { url: String, message: String },

    /// The load task went away before reporting a result.
    #[error("load of {url} was abandoned")]
    Cancelled { url: String },
}

impl LoadError {
    pub fn url(&self) -> &str {
        match self {
            LoadError::Fetch { url, .. }
            | LoadError::Decode { url, .. }
            | LoadError::Cancelled { url } => url,
        }
    }
}
