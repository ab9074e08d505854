use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] apidex_store::StoreError),

    #[error(transparent)]
    Model(#[from] apidex_model::ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
