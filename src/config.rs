use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::token::is_valid_node_id;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:6379";
pub const DEFAULT_DB: i64 = 0;
pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Connection and identity settings for a [`Client`](crate::Client).
///
/// Deserializes with defaults for every missing field, so it can be embedded
/// in an application config file:
///
/// ```ignore
/// let config: ClientConfig = serde_json::from_str(r#"{"address": "cache:6379", "db": 2}"#)?;
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host:port`, or a full `redis://` / `rediss://` URL.
    pub address: String,
    /// Logical database index.
    pub db: i64,
    pub pool_size: u32,
    pub password: Option<String>,
    /// Explicit node id in `[0, 1023]`. When unset the client's
    /// [`NodeIdResolver`](crate::NodeIdResolver) decides.
    pub node_id: Option<i64>,
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            address: DEFAULT_ADDRESS.to_string(),
            db: DEFAULT_DB,
            pool_size: DEFAULT_POOL_SIZE,
            password: None,
            node_id: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("db", &self.db)
            .field("pool_size", &self.pool_size)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("node_id", &self.node_id)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        ClientConfig {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Checks every field; an out-of-range node id is an error, never
    /// silently replaced by a derived one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        if self.db < 0 {
            return Err(ConfigError::InvalidDatabase(self.db));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if let Some(node_id) = self.node_id {
            if !is_valid_node_id(node_id) {
                return Err(ConfigError::NodeIdOutOfRange(node_id));
            }
        }
        Ok(())
    }

    /// Connection URL for the store.
    ///
    /// A bare `host:port` address becomes `redis://host:port/<db>`. A full URL
    /// keeps its own database path if it has one; otherwise `db` is applied.
    /// The password is percent-encoded unless the URL already carries one.
    #[cfg(feature = "redis")]
    pub fn redis_url(&self) -> Result<String, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAddress {
            address: self.address.clone(),
            reason,
        };

        let raw = if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("redis://{}", self.address)
        };
        let mut url = url::Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;

        match url.scheme() {
            "redis" | "rediss" => {}
            other => return Err(invalid(format!("unsupported scheme {}", other))),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        if let Some(password) = &self.password {
            if url.password().is_none() {
                url.set_password(Some(password))
                    .map_err(|_| invalid("cannot carry credentials".to_string()))?;
            }
        }
        if matches!(url.path(), "" | "/") {
            url.set_path(&format!("/{}", self.db));
        }

        Ok(url.to_string())
    }
}
