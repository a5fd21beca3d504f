//! Speculative moves computed against a snapshot.
//!
//! A move picks an item up from one slot (or the tray of unplaced items)
//! and drops it on another. [`simulate_move`] returns copies of the one or
//! two records the move would change; the snapshot itself is never edited.
//! The caller packages those records into an action and sends it, and the
//! server's resulting notification later replaces the speculation.

mod engine;
mod locator;
mod tray;

pub use engine::{simulate_move, try_simulate_move};
pub use locator::{ChangedRecords, Locator, MoveRequest};
pub use tray::{DrawLayout, TrayLayout, TrayPlacement, TrayRole};
