/// Result alias that carries the crate's [`SimbeatError`].
pub type Result<T> = std::result::Result<T, SimbeatError>;

/// Which edge of an allowed range a value fell past.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// Errors raised by the domain model and the playback engine.
///
/// Persistence and command-line code wrap these in `anyhow::Error`; callers
/// that need to react to a specific variant can `downcast_ref` it back out.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimbeatError {
    /// A single carrier frequency is non-finite or outside the audible range.
    #[error("frequency {hz} Hz is outside the audible range {min}-{max} Hz")]
    OutOfRange { hz: f64, min: f64, max: f64 },

    /// The difference between the two carriers is outside the beat range.
    #[error("beat frequency must be within {min}-{max} Hz (received {beat})")]
    BeatOutOfRange {
        beat: f64,
        min: f64,
        max: f64,
        violated: Bound,
    },

    #[error("preset not found: {0}")]
    PresetNotFound(String),

    #[error("preset name must be provided")]
    EmptyPresetName,

    /// The host has no usable audio output.
    #[error("audio output is unavailable: {0}")]
    EngineUnavailable(String),

    /// A live-only operation was issued while the engine was idle.
    #[error("playback engine is not running")]
    NotRunning,
}

impl SimbeatError {
    /// Builds an [`SimbeatError::EngineUnavailable`] from any displayable cause.
    pub fn unavailable<T: std::fmt::Display>(cause: T) -> Self {
        Self::EngineUnavailable(cause.to_string())
    }
}
