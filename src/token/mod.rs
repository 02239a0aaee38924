//! Ownership tokens.
//!
//! Every [`Mutex`](crate::Mutex) carries a 64-bit token that is written as the
//! value of the lock key. Release only deletes the key while it still holds
//! that token, so a token must differ between any two concurrently-alive
//! mutexes. Tokens follow the snowflake layout:
//!
//! ```text
//! | 1 bit unused | 41 bits ms since EPOCH_MS | 10 bits node id | 12 bits sequence |
//! ```

mod generator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use generator::TokenGenerator;

/// Custom epoch (2010-11-04T01:42:54.657Z) in unix milliseconds.
pub const EPOCH_MS: i64 = 1_288_834_974_657;

pub const NODE_BITS: u8 = 10;
pub const SEQUENCE_BITS: u8 = 12;

pub const MIN_NODE_ID: i64 = 0;
pub const MAX_NODE_ID: i64 = (1 << NODE_BITS) - 1;

pub(crate) const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
pub(crate) const NODE_SHIFT: u8 = SEQUENCE_BITS;
pub(crate) const TIME_SHIFT: u8 = NODE_BITS + SEQUENCE_BITS;

/// Returns true if `node_id` fits the node field of a token.
pub fn is_valid_node_id(node_id: i64) -> bool {
    (MIN_NODE_ID..=MAX_NODE_ID).contains(&node_id)
}

/// Proof of ownership for one lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(i64);

impl Token {
    pub(crate) fn from_parts(elapsed_ms: i64, node_id: i64, sequence: i64) -> Self {
        Token((elapsed_ms << TIME_SHIFT) | (node_id << NODE_SHIFT) | sequence)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Unix time in milliseconds at which the token was generated.
    pub fn timestamp_ms(&self) -> i64 {
        (self.0 >> TIME_SHIFT) + EPOCH_MS
    }

    pub fn node_id(&self) -> i64 {
        (self.0 >> NODE_SHIFT) & MAX_NODE_ID
    }

    pub fn sequence(&self) -> i64 {
        self.0 & SEQUENCE_MASK
    }
}

impl From<i64> for Token {
    fn from(value: i64) -> Self {
        Token(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Token {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Token)
    }
}
