use crate::domain::{compute_left_right, CenterBeat, LeftRight};
use crate::error::Result;
use crate::log_info;

use super::ports::AudioEngine;

const ENABLE_LOGS: bool = true;

/// Starts the engine on an already validated pair.
pub async fn start_playback<E: AudioEngine>(engine: &E, pair: LeftRight) -> Result<()> {
    engine.start(pair.left_hz, pair.right_hz).await
}

pub async fn stop_playback<E: AudioEngine>(engine: &E) -> Result<()> {
    engine.stop().await
}

/// Recomputes the carriers around a new centre and glides a running engine
/// to them.
///
/// Domain errors propagate. An engine that refuses the update (idle or
/// unavailable) does not fail the call; the computed pair is returned either
/// way.
pub fn retune_keeping_beat<E: AudioEngine>(engine: &E, req: CenterBeat) -> Result<LeftRight> {
    let pair = compute_left_right(req)?;
    if let Err(err) = engine.update_frequencies(pair.left_hz, pair.right_hz) {
        log_info!(
            "Retune to {} Hz / {} Hz not applied to audio: {err}",
            pair.left_hz,
            pair.right_hz
        );
    }
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ManualOutput;
    use crate::engine::PlaybackEngine;
    use crate::error::SimbeatError;
    use crate::settings::EngineSettings;
    use std::sync::Arc;

    fn engine() -> PlaybackEngine {
        PlaybackEngine::new(Arc::new(ManualOutput::new()), EngineSettings::default())
    }

    #[test]
    fn retune_while_idle_still_returns_pair() {
        let engine = engine();
        let pair = retune_keeping_beat(
            &engine,
            CenterBeat {
                center_hz: 223.0,
                beat_hz: 6.0,
            },
        )
        .unwrap();

        assert_eq!(
            pair,
            LeftRight {
                left_hz: 220.0,
                right_hz: 226.0
            }
        );
        assert!(!engine.is_running());
    }

    #[test]
    fn retune_propagates_domain_errors() {
        let err = retune_keeping_beat(
            &engine(),
            CenterBeat {
                center_hz: 223.0,
                beat_hz: 0.1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, SimbeatError::BeatOutOfRange { .. }));
    }

    #[tokio::test]
    async fn start_and_stop_delegate_to_engine() {
        let engine = engine();
        start_playback(
            &engine,
            LeftRight {
                left_hz: 200.0,
                right_hz: 206.0,
            },
        )
        .await
        .unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.live_frequencies(), Some((200.0, 206.0)));

        stop_playback(&engine).await.unwrap();
        assert!(!engine.is_running());
    }
}
