//! Error types for the simulator

use matchbook::{BookError, Side};
use thiserror::Error;

use crate::latency::ActionType;

/// Errors that can occur while building or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("order book error: {0}")]
    Book(#[from] BookError),

    #[error("latency bounds for {action:?} must satisfy 0 <= min <= max, got {min_us}..{max_us}")]
    InvalidLatencyBounds { action: ActionType, min_us: i64, max_us: i64 },

    #[error("no active {side} order")]
    NoActiveOrder { side: Side },
}
