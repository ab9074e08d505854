use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] apidex_store::StoreError),

    #[error(transparent)]
    Index(#[from] apidex_index::IndexError),

    #[error(transparent)]
    Model(#[from] apidex_model::ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
