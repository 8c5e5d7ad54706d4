//! # Loomsync Core
//!
//! Domain model for Loomsync: loom shift records, the settings
//! singleton, and the boundary mapping that turns loosely-typed remote
//! rows into typed entities.
//!
//! ## Entities
//!
//! - [`Record`] - one shift observation for one machine
//! - [`Settings`] - the global configuration singleton
//! - [`RecordId`] - 128-bit stable record identity
//!
//! ## Boundary mapping
//!
//! Remote rows arrive as JSON objects. The [`boundary`] module validates
//! and maps them into typed entities exactly once; nothing downstream
//! re-interprets raw rows.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod boundary;
mod error;
mod id;
mod record;
mod settings;
mod span;

pub use error::{CoreError, CoreResult};
pub use id::RecordId;
pub use record::{Record, RecordDraft, Shift};
pub use settings::{Settings, SettingsPatch};
pub use span::RunSpan;
