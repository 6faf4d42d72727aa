use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

/// Remembered listener preferences, applied on the next start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackSettings {
    pub volume: f64,
    pub pan: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 0.5,
            pan: 0.0,
        }
    }
}

/// Tuning for the signal graph and its fades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    pub sample_rate: u32,
    /// Length of every parameter ramp, in seconds.
    pub fade_seconds: f64,
    /// How long `stop` waits for the fade-out before releasing the graph.
    pub stop_wait_ms: u64,
    /// Fixed attenuation applied to each oscillator before the master gain.
    pub channel_gain: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            fade_seconds: 0.05,
            stop_wait_ms: 60,
            channel_gain: 0.05,
        }
    }
}

/// Slack added on top of the fade before `stop` looks at the graph again.
const STOP_MARGIN_MS: u64 = 10;

impl EngineSettings {
    /// Replaces every unusable field with its default, logging each one.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut settings = self;

        if settings.sample_rate == 0 {
            log::warn!("Ignoring engine sampleRate of 0");
            settings.sample_rate = defaults.sample_rate;
        }
        if !settings.fade_seconds.is_finite() || settings.fade_seconds < 0.0 {
            log::warn!("Ignoring engine fadeSeconds of {}", settings.fade_seconds);
            settings.fade_seconds = defaults.fade_seconds;
        }
        if !settings.channel_gain.is_finite() || settings.channel_gain < 0.0 {
            log::warn!("Ignoring engine channelGain of {}", settings.channel_gain);
            settings.channel_gain = defaults.channel_gain;
        }
        settings
    }

    /// How long `stop` waits before checking that the fade-out has finished.
    /// Never shorter than the fade itself.
    pub fn drain_wait(&self) -> Duration {
        let fade_ms = (self.fade_seconds * 1000.0).ceil() as u64;
        let floor_ms = fade_ms.saturating_add(STOP_MARGIN_MS);
        Duration::from_millis(self.stop_wait_ms.max(floor_ms))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    playback: PlaybackSettings,
    engine: EngineSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unreadable settings at {}: {err}",
                    path.display()
                );
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn playback(&self) -> PlaybackSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .playback
    }

    /// Engine tuning with unusable values already replaced by defaults.
    pub fn engine(&self) -> EngineSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .engine
            .sanitized()
    }

    pub fn update_playback(&self, settings: PlaybackSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.playback = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.playback(), PlaybackSettings::default());
        assert_eq!(store.engine(), EngineSettings::default());
    }

    #[test]
    fn playback_settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_playback(PlaybackSettings {
                volume: 0.8,
                pan: -0.25,
            })
            .unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.playback().volume, 0.8);
        assert_eq!(reopened.playback().pan, -0.25);
    }

    #[test]
    fn partial_engine_section_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"engine":{"fadeSeconds":0.1}}"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.engine().fade_seconds, 0.1);
        assert_eq!(store.engine().sample_rate, 44_100);
        assert_eq!(store.playback(), PlaybackSettings::default());
    }

    #[test]
    fn unusable_engine_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"engine":{"sampleRate":0,"fadeSeconds":-1.0,"channelGain":0.2,"stopWaitMs":5}}"#,
        )
        .unwrap();

        let engine = SettingsStore::new(path).unwrap().engine();
        assert_eq!(engine.sample_rate, 44_100);
        assert_eq!(engine.fade_seconds, 0.05);
        assert_eq!(engine.channel_gain, 0.2);
        assert_eq!(engine.stop_wait_ms, 5);
    }

    #[test]
    fn drain_wait_never_undercuts_the_fade() {
        assert_eq!(
            EngineSettings::default().drain_wait(),
            Duration::from_millis(60)
        );

        let slow_fade = EngineSettings {
            fade_seconds: 0.3,
            ..EngineSettings::default()
        };
        assert_eq!(slow_fade.drain_wait(), Duration::from_millis(310));

        let long_wait = EngineSettings {
            stop_wait_ms: 500,
            ..EngineSettings::default()
        };
        assert_eq!(long_wait.drain_wait(), Duration::from_millis(500));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.playback(), PlaybackSettings::default());
    }
}
