//! Event notifications for observers (renderer, UI, logs).
//!
//! - `GameEvent`: tagged union of everything a match can report
//! - `StateField`: per-field change payloads emitted by Game State
//! - `EventBus`: subscriber registry with kind-indexed dispatch
//!
//! Handlers get compile-time exhaustiveness by matching on `GameEvent`
//! instead of string event names.

mod bus;
mod event;

pub use bus::{EventBus, SubscriptionId};
pub use event::{EventKind, GameEvent, StateField};
