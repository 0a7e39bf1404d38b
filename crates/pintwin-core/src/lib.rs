//! Reactive data layer between `pintwin-api` and UI consumers.
//!
//! This crate owns the business logic and reactive infrastructure of the
//! board twin:
//!
//! - **[`Twin`]** — Central facade managing the full lifecycle:
//!   [`start_polling()`](Twin::start_polling) spawns the periodic refresh
//!   task, command methods validate locally, fire the board's HTTP
//!   endpoints, and chase each success with a refresh so the next accepted
//!   snapshot confirms the mutation.
//!
//! - **[`SnapshotStore`]** — Single-snapshot storage built on a
//!   `tokio::sync::watch` channel. Wholesale replacement only; the board
//!   is authoritative and the next poll wins.
//!
//! - **[`ConnectivityState`]** — One-writer connectivity indicator derived
//!   purely from the most recent transport outcome.
//!
//! - **Domain model** ([`model`]) — Canonical types (`DeviceSnapshot`,
//!   `PinState`, `PinId`, `PinMode`, `PinRole`) parsed from the wire
//!   types once per poll, never re-derived downstream.

pub mod connectivity;
pub mod debounce;
pub mod error;
pub mod model;
mod scheduler;
pub mod store;
pub mod twin;

// ── Primary re-exports ──────────────────────────────────────────────
pub use connectivity::ConnectivityState;
pub use debounce::Debouncer;
pub use error::CoreError;
pub use store::SnapshotStore;
pub use twin::{DEFAULT_DEBOUNCE_DELAY, DEFAULT_POLL_INTERVAL, RefreshOutcome, Twin, TwinConfig};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AdcReadings, DeviceSnapshot, DeviceStatus, PinId, PinMode, PinRole, PinState, PullMode,
};
