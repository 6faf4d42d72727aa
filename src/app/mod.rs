//! Use cases that glue domain validation to the engine and session storage.

pub mod dto;
pub mod playback;
pub mod ports;
pub mod presets;
pub mod sessions;

pub use dto::{CreateSessionFromPresetRequest, CreateSessionRequest, PresetDto, SessionResponse};
pub use playback::{retune_keeping_beat, start_playback, stop_playback};
pub use ports::{AudioEngine, SessionRepository};
pub use presets::list_presets;
pub use sessions::{
    clear_sessions, create_session, create_session_from_preset, delete_session, find_session,
    list_sessions,
};
