use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Malformed library id: {0}")]
    MalformedLibraryId(String),

    #[error("Document has no qualified name: {0}")]
    MissingQualifiedName(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
