use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tickerpulse_core::ValidationError),

    #[error(transparent)]
    Config(#[from] tickerpulse_core::ConfigError),

    #[error(transparent)]
    Store(#[from] tickerpulse_store::StoreError),

    #[error("strict mode failed: no data available")]
    NoData,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::NoData => 5,
            Self::Serialization(_) => 4,
            Self::Store(_) => 7,
            Self::Io(_) => 10,
            Self::Logging(_) => 10,
        }
    }
}
