//! Redis-backed store.
//!
//! Acquisition is `SET key token NX PX ttl`; release runs [`UNLOCK_SCRIPT`]
//! so the ownership check and the delete execute as one unit on the server.

use std::time::Duration;

use r2d2::{Pool, PooledConnection};

use super::{ttl_millis, Store};
use crate::config::ClientConfig;
use crate::error::{ConfigError, MutexError, StoreError};

/// Deletes `KEYS[1]` only while it still holds `ARGV[1]`; returns the number
/// of keys removed.
pub const UNLOCK_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// Pooled Redis connection shared by every mutex of a client.
pub struct RedisStore {
    pool: Pool<::redis::Client>,
    unlock: ::redis::Script,
}

impl RedisStore {
    /// Opens the connection pool described by `config`.
    ///
    /// The pool dials its first connections eagerly, so an unreachable server
    /// fails here once `connect_timeout` elapses.
    pub fn connect(config: &ClientConfig) -> Result<Self, MutexError> {
        config.validate()?;
        let url = config.redis_url()?;
        let client =
            ::redis::Client::open(url.as_str()).map_err(|e| ConfigError::InvalidAddress {
                address: config.address.clone(),
                reason: e.to_string(),
            })?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connect_timeout())
            .build(client)
            .map_err(StoreError::from)?;

        tracing::info!(
            address = %config.address,
            db = config.db,
            pool_size = config.pool_size,
            "redis connection pool ready"
        );

        Ok(RedisStore {
            pool,
            unlock: ::redis::Script::new(UNLOCK_SCRIPT),
        })
    }

    /// Deletes `key` unconditionally. Returns whether the key existed.
    ///
    /// Bypasses the ownership check; meant for operators and tests.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let removed: i64 = ::redis::cmd("DEL")
            .arg(key)
            .query(&mut *conn)
            .map_err(command_error("DEL"))?;
        Ok(removed > 0)
    }

    /// Remaining time to live in milliseconds; `None` if the key is absent or
    /// has no expiry.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.conn()?;
        let millis: i64 = ::redis::cmd("PTTL")
            .arg(key)
            .query(&mut *conn)
            .map_err(command_error("PTTL"))?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }

    fn conn(&self) -> Result<PooledConnection<::redis::Client>, StoreError> {
        self.pool.get().map_err(|e| {
            tracing::warn!(error = %e, "no redis connection available");
            StoreError::from(e)
        })
    }
}

impl Store for RedisStore {
    fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let pong: String = ::redis::cmd("PING")
            .query(&mut *conn)
            .map_err(|e| StoreError::Ping(e.to_string()))?;
        if pong != "PONG" {
            return Err(StoreError::Ping(format!("unexpected reply {}", pong)));
        }
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let mut cmd = ::redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(millis) = ttl_millis(ttl) {
            cmd.arg("PX").arg(millis);
        }
        // OK when the key was created, nil when it already existed.
        let reply: Option<String> = cmd.query(&mut *conn).map_err(command_error("SET"))?;
        Ok(reply.is_some())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn()?;
        ::redis::cmd("GET")
            .arg(key)
            .query(&mut *conn)
            .map_err(command_error("GET"))
    }

    fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let removed: i64 = self
            .unlock
            .key(key)
            .arg(value)
            .invoke(&mut *conn)
            .map_err(command_error("EVALSHA"))?;
        Ok(removed > 0)
    }
}

fn command_error(command: &'static str) -> impl Fn(::redis::RedisError) -> StoreError {
    move |e| {
        tracing::warn!(command, error = %e, "redis command failed");
        if e.is_io_error() {
            StoreError::from(e)
        } else {
            StoreError::command(command, e.to_string())
        }
    }
}
