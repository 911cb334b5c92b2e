use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the adventure core.
///
/// The session state machine, the narrator and the image materializer return
/// these so the gateway can map each failure to a status code. Plumbing code
/// (config loading, SQL, HTTP clients) keeps using `anyhow::Result` for
/// context chains and lands in [`AdventureError::Other`] or `Storage`.
#[derive(Debug, Error)]
pub enum AdventureError {
    // ── Narrative reply ──────────────────────────────────────────────────
    #[error("malformed reply: {reason}")]
    MalformedReply { reason: String },

    // ── Image resolution ─────────────────────────────────────────────────
    #[error("unknown image reference: {fingerprint}")]
    UnknownImageReference { fingerprint: String },

    // ── Session ──────────────────────────────────────────────────────────
    #[error("session not found: {0}")]
    SessionNotFound(String),

    // ── Generation ───────────────────────────────────────────────────────
    #[error("{what} generation timed out after {secs}s")]
    GenerationTimeout { what: &'static str, secs: u64 },

    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Persistence ──────────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(String),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdventureError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedReply {
            reason: reason.into(),
        }
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::GenerationTimeout { .. } => true,
            Self::Llm(llm) => llm.is_retryable(),
            _ => false,
        }
    }
}

// ─── LLM / image provider errors ────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} returned status {status}: {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("provider {provider} credentials not set ({hint})")]
    MissingCredentials {
        provider: String,
        hint: &'static str,
    },

    #[error("provider {provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("provider {provider} returned an unusable response: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl LlmError {
    /// Transport failures, rate limits and server errors are transient;
    /// other client errors will not resolve on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::MissingCredentials { .. }
            | Self::EmptyResponse { .. }
            | Self::InvalidResponse { .. } => false,
        }
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, AdventureError>;
