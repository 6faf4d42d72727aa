//! Seams between the use cases and the things they drive.

use std::future::Future;

use crate::engine::{Listener, ListenerId, PlaybackEngine};
use crate::error::Result;
use crate::models::Session;

/// Everything a use case may ask of the audio side.
///
/// `start` and `stop` are asynchronous because a graceful stop has to wait out
/// the fade before releasing the graph.
pub trait AudioEngine: Send + Sync {
    fn start(&self, left_hz: f64, right_hz: f64) -> impl Future<Output = Result<()>> + Send;
    fn stop(&self) -> impl Future<Output = Result<()>> + Send;
    fn is_running(&self) -> bool;
    fn set_volume(&self, volume: f64);
    fn volume(&self) -> f64;
    fn set_pan(&self, pan: f64);
    fn pan(&self) -> f64;
    fn update_frequencies(&self, left_hz: f64, right_hz: f64) -> Result<()>;
    fn subscribe(&self, listener: Listener) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// Storage for saved sessions. Listing preserves first-save order, and saving
/// an existing id replaces it in place.
pub trait SessionRepository: Send + Sync {
    fn save(&self, session: &Session) -> impl Future<Output = anyhow::Result<()>> + Send;
    fn find_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Session>>> + Send;
    fn list(&self) -> impl Future<Output = anyhow::Result<Vec<Session>>> + Send;
    /// Returns `false` when nothing was stored under `id`.
    fn delete(&self, id: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;
    fn clear(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl AudioEngine for PlaybackEngine {
    async fn start(&self, left_hz: f64, right_hz: f64) -> Result<()> {
        PlaybackEngine::start(self, left_hz, right_hz).await
    }

    async fn stop(&self) -> Result<()> {
        PlaybackEngine::stop(self).await
    }

    fn is_running(&self) -> bool {
        PlaybackEngine::is_running(self)
    }

    fn set_volume(&self, volume: f64) {
        PlaybackEngine::set_volume(self, volume)
    }

    fn volume(&self) -> f64 {
        PlaybackEngine::volume(self)
    }

    fn set_pan(&self, pan: f64) {
        PlaybackEngine::set_pan(self, pan)
    }

    fn pan(&self) -> f64 {
        PlaybackEngine::pan(self)
    }

    fn update_frequencies(&self, left_hz: f64, right_hz: f64) -> Result<()> {
        PlaybackEngine::update_frequencies(self, left_hz, right_hz)
    }

    fn subscribe(&self, listener: Listener) -> ListenerId {
        PlaybackEngine::subscribe(self, listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        PlaybackEngine::unsubscribe(self, id)
    }
}
