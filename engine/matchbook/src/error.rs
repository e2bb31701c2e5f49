//! Error types for the order book

use thiserror::Error;

use crate::{OrderId, PriceTick};

/// Errors raised by order-book operations.
///
/// Every variant is a rejected input: the book state is unchanged when one
/// of these is returned. Missing-entity conditions (cancel of an unknown
/// id) are reported through `bool` returns, not errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookError {
    #[error("price must be a positive tick count, got {0}")]
    InvalidPrice(PriceTick),

    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error("order {0} not found or inactive")]
    UnknownOrder(OrderId),
}
