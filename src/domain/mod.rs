//! Frequency and beat domain model.
//!
//! Every constructor here validates; nothing clamps. Callers that want to be
//! forgiving about user input must adjust values before handing them in.

pub mod beat;
pub mod frequency;
pub mod preset;
pub mod retune;

pub use beat::{BeatSpec, MAX_BEAT_FREQUENCY_HZ, MIN_BEAT_FREQUENCY_HZ};
pub use frequency::{FrequencyValue, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};
pub use preset::{catalog, find_preset, Preset};
pub use retune::{compute_left_right, CenterBeat, LeftRight};
