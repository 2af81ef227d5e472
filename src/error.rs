//! Error types.

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("dataset is missing `{0}`")]
    DataMissing(String),

    #[error("time index {index} out of range: dataset has {len} time steps")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("netcdf error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("job config error: {0}")]
    JobConfig(#[from] toml::de::Error),

    #[error("scheduler rejected job: {0}")]
    Scheduler(String),

    #[error("plot rendering failed: {0}")]
    Render(String),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
