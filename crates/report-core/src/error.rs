use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Export target not found")]
    TargetNotFound,

    #[error("Export already in progress")]
    Busy,

    #[error("Rasterization error: {0}")]
    Rasterization(String),

    #[error("Rasterizer returned no document")]
    EmptyDocument,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
