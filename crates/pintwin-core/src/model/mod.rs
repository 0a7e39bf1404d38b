//! Domain model: pins, modes, roles, and the device snapshot.

pub mod pin;
pub mod snapshot;

pub use pin::{PinId, PinMode, PinRole, PinState, PullMode};
pub use snapshot::{AdcReadings, DeviceSnapshot, DeviceStatus};
