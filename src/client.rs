use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::mutex::Mutex;
use crate::node_id::{HostnameNodeId, NodeIdResolver};
#[cfg(feature = "redis")]
use crate::store::RedisStore;
use crate::store::Store;
use crate::token::TokenGenerator;

/// Factory for [`Mutex`] values sharing one store connection and one token
/// generator.
///
/// Build one client per process and share it; cloning is cheap. A client holds
/// no lock state of its own, so it can be used from many threads at once.
pub struct Client<S> {
    store: Arc<S>,
    tokens: Arc<TokenGenerator>,
    config: ClientConfig,
}

impl<S> Clone for Client<S> {
    fn clone(&self) -> Self {
        Client {
            store: Arc::clone(&self.store),
            tokens: Arc::clone(&self.tokens),
            config: self.config.clone(),
        }
    }
}

impl<S> fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("node_id", &self.tokens.node_id())
            .finish_non_exhaustive()
    }
}

/// `Client::builder` hangs off `Client<()>` only so it can be called without
/// naming a store type; the store is chosen later by
/// [`ClientBuilder::connect`] or [`ClientBuilder::build_with_store`].
impl Client<()> {
    /// Same as [`ClientBuilder::new`].
    pub fn builder(address: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(address)
    }
}

#[cfg(feature = "redis")]
impl Client<RedisStore> {
    /// Connects to Redis with `config` and the host-name node id strategy.
    ///
    /// An error here means the deployment is misconfigured or the store is
    /// down; callers are expected to treat it as fatal at startup.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).connect()
    }
}

impl<S: Store> Client<S> {
    /// Builds a client over an already-constructed store.
    pub fn with_store(config: ClientConfig, store: S) -> Result<Self> {
        ClientBuilder::from_config(config).build_with_store(store)
    }

    /// Creates a mutex for `key` with a fresh ownership token.
    ///
    /// No store I/O happens until [`Mutex::lock`]. An empty key is accepted
    /// but every caller using it contends on the same entry. A zero
    /// `expiration` produces a lock that never expires.
    pub fn new_mutex(&self, key: impl Into<String>, expiration: Duration) -> Mutex<S> {
        Mutex::new(
            Arc::clone(&self.store),
            key.into(),
            self.tokens.generate(),
            expiration,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> Client<S> {
    pub fn node_id(&self) -> i64 {
        self.tokens.node_id()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Step-by-step client construction; each method overrides one default.
pub struct ClientBuilder {
    config: ClientConfig,
    resolver: Box<dyn NodeIdResolver>,
}

impl ClientBuilder {
    pub fn new(address: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(address))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        ClientBuilder {
            config,
            resolver: Box::new(HostnameNodeId),
        }
    }

    pub fn db(mut self, db: i64) -> Self {
        self.config.db = db;
        self
    }

    pub fn pool_size(mut self, size: u32) -> Self {
        self.config.pool_size = size;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Pins the node id. Values outside `[0, 1023]` fail the build.
    pub fn node_id(mut self, node_id: i64) -> Self {
        self.config.node_id = Some(node_id);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Strategy used when no explicit node id is configured.
    pub fn node_id_resolver(mut self, resolver: impl NodeIdResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Opens the Redis pool, pings it and returns a ready client.
    #[cfg(feature = "redis")]
    pub fn connect(self) -> Result<Client<RedisStore>> {
        let tokens = self.token_generator()?;
        let store = RedisStore::connect(&self.config)?;
        Self::finish(self.config, store, tokens)
    }

    pub fn build_with_store<S: Store>(self, store: S) -> Result<Client<S>> {
        let tokens = self.token_generator()?;
        Self::finish(self.config, store, tokens)
    }

    fn token_generator(&self) -> Result<TokenGenerator> {
        self.config.validate()?;
        let node_id = match self.config.node_id {
            Some(node_id) => node_id,
            None => {
                let node_id = self.resolver.resolve()?;
                tracing::info!(node_id, "resolved node id");
                node_id
            }
        };
        Ok(TokenGenerator::new(node_id)?)
    }

    fn finish<S: Store>(config: ClientConfig, store: S, tokens: TokenGenerator) -> Result<Client<S>> {
        store.ping()?;
        tracing::info!(
            address = %config.address,
            node_id = tokens.node_id(),
            "mutex client ready"
        );
        Ok(Client {
            store: Arc::new(store),
            tokens: Arc::new(tokens),
            config,
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
