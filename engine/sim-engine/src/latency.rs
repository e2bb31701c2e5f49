//! Latency model: every strategy-originated action is deferred by a
//! uniformly sampled per-action-type delay and delivered in
//! `(execution_time, sequence)` order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use matchbook::{OrderId, PriceTick, Qty, Side, TsMicros};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Kinds of deferred action. Discriminants are part of the external
/// contract and never change.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    OrderSend = 0,
    Cancel = 1,
    Modify = 2,
    AcknowledgeFill = 3,
    MarketUpdate = 4,
}

/// Whether an order send is the initial quote or the offsetting leg.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteRole {
    Ping,
    Pong,
}

/// A deferred strategy action.
#[derive(Clone, Debug)]
pub enum Action {
    OrderSend { side: Side, price_tick: PriceTick, quantity: Qty, role: QuoteRole },
    Cancel { order_id: OrderId },
    Modify { order_id: OrderId, new_quantity: Qty },
    AcknowledgeFill { order_id: OrderId },
    MarketUpdate,
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::OrderSend { .. } => ActionType::OrderSend,
            Action::Cancel { .. } => ActionType::Cancel,
            Action::Modify { .. } => ActionType::Modify,
            Action::AcknowledgeFill { .. } => ActionType::AcknowledgeFill,
            Action::MarketUpdate => ActionType::MarketUpdate,
        }
    }
}

/// Inclusive microsecond delay range for one action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyBounds {
    pub min_us: i64,
    pub max_us: i64,
}

impl LatencyBounds {
    pub fn new(min_us: i64, max_us: i64) -> Self {
        Self { min_us, max_us }
    }
}

/// Per-action-type latency bounds. Set atomically, validated as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyProfile {
    pub order_send: LatencyBounds,
    pub cancel: LatencyBounds,
    pub modify: LatencyBounds,
    pub acknowledge_fill: LatencyBounds,
    pub market_update: LatencyBounds,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            order_send: LatencyBounds::new(100, 300),
            cancel: LatencyBounds::new(80, 250),
            modify: LatencyBounds::new(80, 250),
            acknowledge_fill: LatencyBounds::new(20, 80),
            market_update: LatencyBounds::new(10, 50),
        }
    }
}

impl LatencyProfile {
    /// A profile where every action executes at its scheduling time.
    pub fn zero() -> Self {
        let z = LatencyBounds::new(0, 0);
        Self { order_send: z, cancel: z, modify: z, acknowledge_fill: z, market_update: z }
    }

    /// Build a profile from the ten raw bounds, in action-type order.
    #[allow(clippy::too_many_arguments)]
    pub fn from_bounds(
        order_send_min: i64,
        order_send_max: i64,
        cancel_min: i64,
        cancel_max: i64,
        modify_min: i64,
        modify_max: i64,
        acknowledge_fill_min: i64,
        acknowledge_fill_max: i64,
        market_update_min: i64,
        market_update_max: i64,
    ) -> Self {
        Self {
            order_send: LatencyBounds::new(order_send_min, order_send_max),
            cancel: LatencyBounds::new(cancel_min, cancel_max),
            modify: LatencyBounds::new(modify_min, modify_max),
            acknowledge_fill: LatencyBounds::new(acknowledge_fill_min, acknowledge_fill_max),
            market_update: LatencyBounds::new(market_update_min, market_update_max),
        }
    }

    pub fn bounds(&self, action: ActionType) -> LatencyBounds {
        match action {
            ActionType::OrderSend => self.order_send,
            ActionType::Cancel => self.cancel,
            ActionType::Modify => self.modify,
            ActionType::AcknowledgeFill => self.acknowledge_fill,
            ActionType::MarketUpdate => self.market_update,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        for action in [
            ActionType::OrderSend,
            ActionType::Cancel,
            ActionType::Modify,
            ActionType::AcknowledgeFill,
            ActionType::MarketUpdate,
        ] {
            let b = self.bounds(action);
            if b.min_us < 0 || b.min_us > b.max_us {
                return Err(SimError::InvalidLatencyBounds {
                    action,
                    min_us: b.min_us,
                    max_us: b.max_us,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Entry {
    execution_time_us: TsMicros,
    seq: u64,
    action: Action,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.execution_time_us == other.execution_time_us && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest
        // (execution_time, seq) pops first.
        (other.execution_time_us, other.seq).cmp(&(self.execution_time_us, self.seq))
    }
}

/// Time-ordered queue of pending strategy actions.
///
/// Entries with equal execution times are delivered in insertion order
/// via the sequence-number tiebreak.
#[derive(Debug)]
pub struct LatencyQueue {
    heap: BinaryHeap<Entry>,
    profile: LatencyProfile,
    next_seq: u64,
}

impl LatencyQueue {
    pub fn new(profile: LatencyProfile) -> Result<Self, SimError> {
        profile.validate()?;
        Ok(Self { heap: BinaryHeap::new(), profile, next_seq: 0 })
    }

    /// Replace every latency bound at once.
    pub fn reset_latency_profile(&mut self, profile: LatencyProfile) -> Result<(), SimError> {
        profile.validate()?;
        self.profile = profile;
        Ok(())
    }

    pub fn profile(&self) -> &LatencyProfile {
        &self.profile
    }

    /// Sample a delay for the given action type from the shared PRNG.
    pub fn compute_execution_latency(&self, action: ActionType, rng: &mut StdRng) -> i64 {
        let b = self.profile.bounds(action);
        rng.gen_range(b.min_us..=b.max_us)
    }

    /// Enqueue an action at `now + sampled latency`. Returns the
    /// scheduled execution time.
    pub fn schedule(&mut self, action: Action, now: TsMicros, rng: &mut StdRng) -> TsMicros {
        let delay = self.compute_execution_latency(action.action_type(), rng);
        let execution_time_us = now + delay;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { execution_time_us, seq, action });
        execution_time_us
    }

    /// Pop the earliest action whose execution time is due at `ts`.
    pub fn pop_due(&mut self, ts: TsMicros) -> Option<Action> {
        if self.heap.peek()?.execution_time_us <= ts {
            Some(self.heap.pop().expect("peeked entry exists").action)
        } else {
            None
        }
    }

    /// Deliver every due action, in `(execution_time, seq)` order.
    pub fn process_until(&mut self, ts: TsMicros, mut apply: impl FnMut(Action)) {
        while let Some(action) = self.pop_due(ts) {
            apply(action);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
