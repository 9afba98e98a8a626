use thiserror::Error;

/// Failure to read or write the JSON contracts (design document, catalog).
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown product `{product}` / color `{color}`")]
    UnknownVariant { product: String, color: String },
}
