//! Card effect resolution.
//!
//! - `CardResolver`: turns a card and a ranking into a new ranking
//! - `Resolution`: the new ranking plus the message to show
//!
//! Resolution is pure with respect to the ranking it is given. Randomness
//! (targetless cards) comes from the caller's `GameRng`.

mod resolver;

pub use resolver::{CardResolver, Resolution};
