use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::{is_valid_node_id, Token, EPOCH_MS, SEQUENCE_MASK};
use crate::error::ConfigError;

struct Cursor {
    last_ms: i64,
    sequence: i64,
}

/// Thread-safe snowflake generator bound to one node id.
///
/// Time is read from a monotonic clock anchored to the wall clock at
/// construction, so tokens from one generator never go backwards even if the
/// system clock is adjusted. At most 4096 tokens are issued per millisecond;
/// further calls wait for the next millisecond.
pub struct TokenGenerator {
    node_id: i64,
    anchor: Instant,
    anchor_ms: i64,
    cursor: Mutex<Cursor>,
}

impl TokenGenerator {
    pub fn new(node_id: i64) -> Result<Self, ConfigError> {
        if !is_valid_node_id(node_id) {
            return Err(ConfigError::NodeIdOutOfRange(node_id));
        }

        let wall_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        Ok(TokenGenerator {
            node_id,
            anchor: Instant::now(),
            anchor_ms: wall_ms - EPOCH_MS,
            cursor: Mutex::new(Cursor {
                last_ms: 0,
                sequence: 0,
            }),
        })
    }

    pub fn node_id(&self) -> i64 {
        self.node_id
    }

    pub fn generate(&self) -> Token {
        // The cursor is two plain integers updated together, so a poisoned
        // guard still holds a consistent value.
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);

        let mut now = self.elapsed_ms();
        if now <= cursor.last_ms {
            now = cursor.last_ms;
            cursor.sequence = (cursor.sequence + 1) & SEQUENCE_MASK;
            if cursor.sequence == 0 {
                while now <= cursor.last_ms {
                    thread::yield_now();
                    now = self.elapsed_ms();
                }
            }
        } else {
            cursor.sequence = 0;
        }
        cursor.last_ms = now;

        Token::from_parts(now, self.node_id, cursor.sequence)
    }

    fn elapsed_ms(&self) -> i64 {
        self.anchor_ms + self.anchor.elapsed().as_millis() as i64
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator")
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}
