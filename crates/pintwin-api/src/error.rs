use thiserror::Error;

/// Top-level error type for the `pintwin-api` crate.
///
/// Covers every failure mode of a single request against the board's
/// console API. `pintwin-core` maps these onto connectivity state: a
/// [`Transport`](Error::Transport) failure means the board is unreachable
/// and halts polling; everything else degrades the indicator only.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Network-level failure (connection refused, DNS, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Unparseable URL, or one that cannot serve as an HTTP base
    /// (e.g. `mailto:`).
    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    // ── Response classification ─────────────────────────────────────
    /// Non-success HTTP status code.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The board answered with a well-formed `{status: "error"}` envelope.
    #[error("{message}")]
    Application { message: String },

    /// Non-JSON body or a snapshot missing required sections. Carries a
    /// truncated preview of the raw body so the garbage is never fed
    /// downstream as structured data.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, preview: String },
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl {
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Returns `true` when the board itself was unreachable.
    ///
    /// This is the only failure class that should stop periodic polling;
    /// everything else is a bad answer from a reachable board.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` for structurally broken responses (non-JSON body,
    /// missing snapshot sections). These are soft failures: the indicator
    /// degrades but polling continues.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }
}
