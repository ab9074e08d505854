use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoaderError>;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Bad library file name: {0} (expected <name>[_<version>].json)")]
    BadFileName(String),

    #[error("Record has no derivable id: {0}")]
    MissingIdentity(String),

    #[error(transparent)]
    Store(#[from] apidex_store::StoreError),

    #[error(transparent)]
    Model(#[from] apidex_model::ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
