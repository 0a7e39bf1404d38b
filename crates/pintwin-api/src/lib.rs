//! Async HTTP client for the pintwin board console API.
//!
//! The board exposes a tiny path-routed HTTP surface: one snapshot
//! endpoint (`/api/board_state`) and a handful of GET-with-path-parameters
//! command endpoints (`pin/...`, `pwm/...`, `ble/...`, `wifi/...`,
//! `console/...`). Every response is a `{status, message?}` envelope.
//!
//! This crate does transport and classification only -- no connectivity
//! state, no scheduling, no UI concerns. See `pintwin-core` for those.

pub mod client;
pub mod error;
pub mod model;
pub mod transport;

pub use client::DeviceClient;
pub use error::Error;
pub use model::{AdcVolts, BoardState, CommandAck, PinIdWire, PinRecord, StatusBlock};
pub use transport::TransportConfig;
