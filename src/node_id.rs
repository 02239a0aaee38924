//! Node identity strategies.
//!
//! The node id occupies 10 bits of every token and keeps tokens from
//! different processes apart. It is not a coordination primitive: two hosts
//! resolving to the same id only raise the (already small) chance of a token
//! collision. Deployments that need strict uniqueness should assign ids
//! explicitly or plug in a coordinator-backed [`NodeIdResolver`].

use std::ffi::OsStr;

use crate::error::{ConfigError, MutexError};
use crate::token::MAX_NODE_ID;

/// Strategy for choosing this process's node id.
pub trait NodeIdResolver: Send + Sync {
    fn resolve(&self) -> Result<i64, MutexError>;
}

/// A node id chosen by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedNodeId(pub i64);

impl NodeIdResolver for FixedNodeId {
    fn resolve(&self) -> Result<i64, MutexError> {
        Ok(self.0)
    }
}

/// Derives the node id from the host name (FNV-1a, modulo 1024).
///
/// Hosts with different names can still land on the same id.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostnameNodeId;

impl NodeIdResolver for HostnameNodeId {
    fn resolve(&self) -> Result<i64, MutexError> {
        let name = hostname::get().map_err(|e| ConfigError::NodeIdUnavailable(e.to_string()))?;
        Ok(node_id_for_host(&name))
    }
}

impl<F> NodeIdResolver for F
where
    F: Fn() -> Result<i64, MutexError> + Send + Sync,
{
    fn resolve(&self) -> Result<i64, MutexError> {
        self()
    }
}

/// Hashes the raw bytes of `name`, so non-UTF-8 host names are not altered
/// before hashing.
pub fn node_id_for_host(name: &OsStr) -> i64 {
    node_id_for_name(name.as_encoded_bytes())
}

pub fn node_id_for_name(name: &[u8]) -> i64 {
    i64::from(fnv1a_32(name) % (MAX_NODE_ID as u32 + 1))
}

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}
