//! Connectivity state — derived purely from the most recent transport outcome.

/// Connection state observable by consumers.
///
/// Exactly one writer (the active refresh or command flow) updates this;
/// any number of widgets read it. `Offline` is the only state that stops
/// the poll scheduler; `ApiError` covers both board-reported errors and
/// structurally invalid responses, and polling keeps running through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    /// A request is in flight (also the initial state).
    #[default]
    Connecting,
    /// The last request succeeded.
    Connected,
    /// The board was unreachable at the network level; polling is halted.
    Offline,
    /// The board answered, but with an error or a malformed body.
    ApiError,
}

impl ConnectivityState {
    /// Returns `true` when the twin is showing stale data.
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::Offline | Self::ApiError)
    }

    /// Short operator-facing label for the indicator fallback text.
    pub fn fallback_label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Connected => "OK",
            Self::Offline => "OFFLINE?",
            Self::ApiError => "API ERR",
        }
    }
}
