use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Backend unreachable at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("{operation} failed on collection '{collection}': {source}")]
    Backend {
        operation: &'static str,
        collection: String,
        #[source]
        source: BoxError,
    },

    #[error("Malformed record in collection '{collection}': {reason}")]
    Payload { collection: String, reason: String },
}

impl Error {
    pub fn backend(operation: &'static str, collection: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Backend { operation, collection: collection.into(), source: source.into() }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
