//! # Loomsync Engine
//!
//! Offline-first synchronization engine for factory loom shift records.
//!
//! This crate provides:
//! - The [`SyncEngine`] state container and mutation router
//! - A persisted pending-operation queue with per-record deduplication
//! - A three-state connection lifecycle (disconnected, reconnecting,
//!   connected)
//! - Reconciliation: remote-wins initial merge, queue drain, realtime
//!   event application with a per-id suppression window
//!
//! ## Architecture
//!
//! Every mutation applies to local state immediately and never fails
//! from the caller's perspective. Propagation to the remote store is
//! asynchronous: operations queue until a connection confirms them, and
//! the queue holds at most one operation per record id.
//!
//! On (re)connection the engine performs one **initial merge** - the
//! remote record set wins per id, local-only records are retained - and
//! then drains the queue until empty or disconnected. Realtime events
//! pushed by the remote apply to local state unless the affected id has
//! a queued local operation (the suppression window), so a stale echo
//! can never overwrite local intent.
//!
//! ## Key Invariants
//!
//! - Local mutations always succeed; only propagation can fail
//! - At most one pending operation per record id
//! - Remote applies are idempotent (upsert/delete)
//! - Conflicts resolve last-writer-wins at whole-record granularity
//! - One failed connect attempt terminates in `Disconnected`, never in a
//!   silent retry loop

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod engine;
mod error;
mod queue;
mod reconcile;
mod remote;
mod scheduler;

pub use config::EngineConfig;
pub use connection::ConnectionState;
pub use engine::{EngineStats, SyncEngine};
pub use error::{EngineError, EngineResult, RemoteError, RemoteResult};
pub use queue::{PendingOp, PendingQueue};
pub use reconcile::DrainOutcome;
pub use remote::{InMemoryRemote, Pulled, RemoteEvent, RemoteStore, Subscription};
