use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("VMware Fusion API error: {0} - {1}")]
    Api(reqwest::StatusCode, String),

    #[error("Failed to connect to VMware Fusion API: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("Invalid action '{0}'. Valid actions: on, off, suspend, pause, unpause, reset")]
    InvalidAction(String),

    #[error("Failed to parse VMware Fusion API response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("VM with ID '{0}' not found")]
    NotFound(String),

    #[error("Invalid base URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, FusionError>;
