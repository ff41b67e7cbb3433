use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Scrybe.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ScrybeError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Session engine ──────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Voice capture / transcription ───────────────────────────────────
    #[error("capture: {0}")]
    Capture(#[from] CaptureError),

    // ── Backend transport ───────────────────────────────────────────────
    #[error("api: {0}")]
    Api(#[from] ApiError),

    // ── Publish flow ────────────────────────────────────────────────────
    #[error("publish: {0}")]
    Publish(#[from] PublishError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("config dir could not be determined")]
    NoConfigDir,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    /// A continuation request is already in flight; the session is
    /// single-flight and rejects rather than queues.
    #[error("a continuation request is already pending")]
    TurnPending,

    #[error("cannot publish an empty story")]
    EmptyStory,
}

// ─── Capture errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// The microphone (or the upload slot) is already held by an earlier
    /// capture cycle.
    #[error("capture already in progress")]
    ResourceBusy,

    #[error("no capture in progress")]
    NotRecording,

    #[error("audio device: {0}")]
    Device(String),

    #[error("transcription upload failed: {0}")]
    Upload(#[source] ApiError),
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("{endpoint} response decode failed: {message}")]
    Decode { endpoint: String, message: String },
}

// ─── Publish errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PublishError {
    /// Step one failed: nothing was persisted.
    #[error("story save failed: {0}")]
    Create(#[source] ApiError),

    /// Cover retry failed for an already-saved story.
    #[error("cover generation failed: {0}")]
    Cover(#[source] ApiError),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ScrybeError>;
