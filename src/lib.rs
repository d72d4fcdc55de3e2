//! # Dash Lock Monitor
//!
//! A long-running subscriber that listens to Dash Core ZMQ notifications
//! (new blocks, ChainLocked blocks, new transactions, InstantLocked
//! transactions), deduplicates redelivered notifications, and persists
//! first-seen / lock-seen timestamps into two SQLite tables keyed by hash.
//!
//! ## Overview
//!
//! The monitor is a single-consumer pipeline:
//!
//! - **Transport**: a ZMQ SUB socket filtered to the four lock-relevant
//!   topics, drained on a dedicated thread.
//! - **Classification**: each (topic, payload) pair becomes a semantic lock
//!   event with a canonical hex hash identifier.
//! - **Deduplication**: a bounded FIFO cache of recently seen transaction
//!   hashes suppresses redelivered `hashtx` notifications.
//! - **Persistence**: insert-or-ignore upserts keep first-seen timestamps
//!   stable; lock transitions are monotonic (once locked, never reverted).
//!
//! One message is processed fully (classify → dedup → persist → log) before
//! the next is pulled, so no locking is needed beyond SQLite's per-statement
//! atomicity.

// Event Pipeline
/// Topic classification and raw notification framing
pub mod notification;
/// Bounded FIFO cache for duplicate transaction suppression
pub mod recent_tx_cache;
/// Per-message dispatch state machine
pub mod dispatcher;

// Infrastructure
/// SQLite persistence for block and transaction lock records
pub mod lock_store;
/// ZMQ SUB socket subscription bridged into the async loop
pub mod zmq_subscriber;

// Settings & Errors
/// Configuration management
pub mod settings;
/// Error taxonomy
pub mod error;

// Re-exports for convenience
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::MonitorError;
pub use lock_store::LockStore;
pub use notification::{LockEvent, RawNotification, Topic};
pub use recent_tx_cache::RecentTxCache;
pub use settings::Settings;
