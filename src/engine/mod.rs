pub mod controller;
mod listeners;
pub mod state;

pub use controller::PlaybackEngine;
pub use listeners::{Listener, ListenerId};
pub use state::EngineState;
