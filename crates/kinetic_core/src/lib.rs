//! Kinetic core runtime
//!
//! Shared plumbing for the scroll engine:
//!
//! - **Frame ticking**: a [`Vsync`] registry that hands out [`Ticker`]
//!   handles, one per animating activity, so the host's frame loop knows
//!   when it can go idle.
//! - **Offset persistence**: the [`ScrollStorage`] contract for saving and
//!   restoring a single scroll offset per opaque storage key.

pub mod storage;
pub mod ticker;

pub use storage::{MemoryStorage, ScrollStorage, SharedStorage, StorageError, StorageKey};
pub use ticker::{Ticker, TickerId, Vsync};
