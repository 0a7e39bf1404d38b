// ── Core error types ──
//
// User-facing errors from pintwin-core. Local validation failures surface
// immediately and never produce a network request; remote failures are
// already classified by pintwin-api and arrive wrapped in `Api`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Local validation (no request was sent) ───────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("No board snapshot received yet")]
    NoSnapshot,

    #[error("Pin not found in snapshot: {id}")]
    PinNotFound { id: String },

    #[error("Pin {id} is not in output mode")]
    NotAnOutput { id: String },

    // ── Remote failures (classified by pintwin-api) ──────────────────
    #[error("API error: {0}")]
    Api(#[from] pintwin_api::Error),

    // ── Setup ────────────────────────────────────────────────────────
    #[error("Invalid board URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CoreError {
    /// Returns `true` for failures that were rejected locally, before any
    /// request went out.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NoSnapshot
                | Self::PinNotFound { .. }
                | Self::NotAnOutput { .. }
        )
    }
}
