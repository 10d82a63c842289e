//! Error types for replication

use thiserror::Error;

/// Errors while decoding replicated behavior state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("packet ended early: needed {needed} bytes, {remaining} left")]
    UnexpectedEnd { needed: usize, remaining: usize },

    #[error("unknown state index {value}")]
    InvalidState { value: u8 },

    #[error("unknown {field} tag {value}")]
    InvalidTag { field: &'static str, value: u8 },
}
