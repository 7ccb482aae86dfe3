//! Error types for Fluvia

use thiserror::Error;

/// Main error type for Fluvia operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported decay mode: {0} (only mode 1, log-ratio decay, is implemented)")]
    UnsupportedDecayMode(i32),

    #[error("barrier on reach {reach} has a basin id of 0; basin ids must be nonzero")]
    ZeroBasinId { reach: u64 },

    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("basin {basin} worker failed: {source}")]
    BasinWorker {
        basin: u32,
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for Fluvia operations
pub type Result<T> = std::result::Result<T, Error>;
