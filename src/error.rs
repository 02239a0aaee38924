use thiserror::Error;

/// Invalid client configuration, detected before any connection is opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("store address must not be empty")]
    EmptyAddress,
    #[error("invalid store address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("node id {0} is outside the valid range [0, 1023]")]
    NodeIdOutOfRange(i64),
    #[error("database index {0} must not be negative")]
    InvalidDatabase(i64),
    #[error("connection pool size must be at least 1")]
    EmptyPool,
    #[error("could not resolve node id: {0}")]
    NodeIdUnavailable(String),
}

/// Failure talking to the backing key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or a pooled connection was unavailable.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// The store answered with an error or an unexpected reply.
    #[error("store command {command} failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
    /// Liveness check did not answer as expected.
    #[error("store ping failed: {0}")]
    Ping(String),
    /// An in-process store lock was poisoned (a thread panicked while holding it).
    #[error("store lock poisoned during {0}")]
    Poisoned(&'static str),
}

impl StoreError {
    pub fn command(command: &'static str, message: impl Into<String>) -> Self {
        StoreError::Command {
            command,
            message: message.into(),
        }
    }
}

#[cfg(feature = "redis")]
impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Connection(err.to_string())
    }
}

/// I/O failures become [`StoreError::Connection`]; anything the server
/// answered with is a [`StoreError::Command`] without a known command name.
#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::command("redis", err.to_string())
        }
    }
}

/// Error type for every fallible operation of the crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutexError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = MutexError> = std::result::Result<T, E>;
