use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tokio::{sync::Mutex as AsyncMutex, task, time};

use crate::{
    audio::{lock_graph, AudioOutput, SignalGraph},
    error::{Result, SimbeatError},
    settings::{EngineSettings, PlaybackSettings},
};
use crate::{log_info, log_warn};

use super::listeners::{deliver, fan_out, Listener, ListenerId, ListenerRegistry, Subscribers};
use super::state::{clamp_or, EngineMode, EngineState, LiveGraph};

const ENABLE_LOGS: bool = true;

/// Poll interval while waiting for the output to finish a fade-out.
const DRAIN_POLL: Duration = Duration::from_millis(2);

struct EngineInner {
    mode: EngineMode,
    volume: f64,
    pan: f64,
    /// Bumped on every state change; listeners never receive an older one.
    revision: u64,
    listeners: ListenerRegistry,
}

impl EngineInner {
    fn snapshot(&self) -> EngineState {
        EngineState {
            running: self.mode.is_running(),
            volume: self.volume,
            pan: self.pan,
        }
    }

    /// Records a state change and captures what to broadcast once the lock
    /// is released.
    fn changed(&mut self) -> Notice {
        self.revision += 1;
        Notice {
            state: self.snapshot(),
            revision: self.revision,
            subscribers: self.listeners.snapshot(),
        }
    }
}

struct Notice {
    state: EngineState,
    revision: u64,
    subscribers: Subscribers,
}

impl Notice {
    fn send(self) {
        fan_out(&self.subscribers, self.state, self.revision);
    }
}

/// Owns at most one live signal graph and broadcasts its state.
///
/// Cloning yields another handle to the same engine. Separate engines built
/// with [`PlaybackEngine::new`] share nothing.
///
/// Every live change is a ramp over `fade_seconds`; nothing on a running graph
/// is ever stepped. `start` and `stop` run one at a time, so a start issued
/// while a stop is still fading out waits for the old graph to be released.
/// Listener callbacks run after the internal lock has been released, so they
/// may call back into the engine.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<Mutex<EngineInner>>,
    transition: Arc<AsyncMutex<()>>,
    output: Arc<dyn AudioOutput>,
    settings: EngineSettings,
}

impl PlaybackEngine {
    pub fn new(output: Arc<dyn AudioOutput>, settings: EngineSettings) -> Self {
        Self::with_playback(output, settings, PlaybackSettings::default())
    }

    /// Starts from remembered volume and pan instead of the defaults.
    pub fn with_playback(
        output: Arc<dyn AudioOutput>,
        settings: EngineSettings,
        playback: PlaybackSettings,
    ) -> Self {
        let defaults = PlaybackSettings::default();
        Self {
            inner: Arc::new(Mutex::new(EngineInner {
                mode: EngineMode::Idle,
                volume: clamp_or(playback.volume, 0.0, 1.0, defaults.volume),
                pan: clamp_or(playback.pan, -1.0, 1.0, defaults.pan),
                revision: 1,
                listeners: ListenerRegistry::new(),
            })),
            transition: Arc::new(AsyncMutex::new(())),
            output,
            settings: settings.sanitized(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> EngineState {
        self.lock().snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.lock().mode.is_running()
    }

    pub fn volume(&self) -> f64 {
        self.lock().volume
    }

    pub fn pan(&self) -> f64 {
        self.lock().pan
    }

    /// Live oscillator frequencies, or `None` while idle.
    pub fn live_frequencies(&self) -> Option<(f64, f64)> {
        self.lock().mode.live().map(LiveGraph::frequencies)
    }

    /// Builds a fresh graph and fades it in from silence.
    ///
    /// A running graph is stopped gracefully first, so two graphs are never
    /// alive together. Opening the output runs on the blocking pool. If it
    /// fails the engine stays idle and [`SimbeatError::EngineUnavailable`] is
    /// returned.
    pub async fn start(&self, left_hz: f64, right_hz: f64) -> Result<()> {
        let _transition = self.transition.lock().await;
        self.shut_down().await;

        let (volume, pan) = {
            let inner = self.lock();
            (inner.volume, inner.pan)
        };

        let fade = self.settings.fade_seconds;
        let mut graph = SignalGraph::new(
            self.settings.sample_rate,
            left_hz,
            right_hz,
            self.settings.channel_gain,
            pan,
        );
        graph.ramp_master(volume, fade);
        let graph = graph.into_shared();

        let output = Arc::clone(&self.output);
        let opening = Arc::clone(&graph);
        let stream = task::spawn_blocking(move || output.open(opening))
            .await
            .map_err(SimbeatError::unavailable)??;
        let live = LiveGraph::new(graph, stream);
        log_info!(
            "Playback started on {} output: {left_hz} Hz / {right_hz} Hz",
            live.backend()
        );

        let notice = {
            let mut inner = self.lock();
            {
                // Volume or pan may have moved while the output was opening.
                let mut graph = lock_graph(&live.graph);
                if inner.volume != volume {
                    graph.ramp_master(inner.volume, fade);
                }
                if inner.pan != pan {
                    graph.ramp_pan(inner.pan, fade);
                }
            }
            inner.mode = EngineMode::Running(live);
            inner.changed()
        };

        notice.send();
        Ok(())
    }

    /// Fades the master gain to silence, waits for the output to render the
    /// fade, then releases every node.
    ///
    /// Stopping an idle engine returns at once. A stop that overlaps another
    /// stop waits its turn and then finds nothing to do.
    pub async fn stop(&self) -> Result<()> {
        let _transition = self.transition.lock().await;
        self.shut_down().await;
        Ok(())
    }

    /// Caller must hold the transition gate.
    async fn shut_down(&self) {
        let live = {
            let mut inner = self.lock();
            match inner.mode.take() {
                Some(live) => live,
                None => return,
            }
        };

        lock_graph(&live.graph).ramp_master(0.0, self.settings.fade_seconds);
        time::sleep(self.settings.drain_wait()).await;

        // The output clock can trail the wall clock; allow it one more drain
        // window to reach silence before giving up.
        let deadline = Instant::now() + self.settings.drain_wait();
        while !lock_graph(&live.graph).is_silent() && Instant::now() < deadline {
            time::sleep(DRAIN_POLL).await;
        }
        if !lock_graph(&live.graph).is_silent() {
            log_warn!("Output did not finish the fade-out before release");
        }

        live.release();
        log_info!("Playback stopped");

        let notice = self.lock().changed();
        notice.send();
    }

    /// Glides both oscillators to new frequencies.
    ///
    /// Returns [`SimbeatError::NotRunning`] while idle and leaves the engine
    /// untouched.
    pub fn update_frequencies(&self, left_hz: f64, right_hz: f64) -> Result<()> {
        let inner = self.lock();
        let live = inner.mode.live().ok_or(SimbeatError::NotRunning)?;
        lock_graph(&live.graph).ramp_frequencies(left_hz, right_hz, self.settings.fade_seconds);
        Ok(())
    }

    /// Stores the clamped volume, ramps it if running, and notifies. Never
    /// fails; NaN is treated as silence.
    pub fn set_volume(&self, volume: f64) {
        let volume = clamp_or(volume, 0.0, 1.0, 0.0);
        let notice = {
            let mut inner = self.lock();
            inner.volume = volume;
            if let Some(live) = inner.mode.live() {
                lock_graph(&live.graph).ramp_master(volume, self.settings.fade_seconds);
            }
            inner.changed()
        };
        notice.send();
    }

    /// Stores the clamped pan, ramps it if running, and notifies. Never
    /// fails; NaN is treated as centre.
    pub fn set_pan(&self, pan: f64) {
        let pan = clamp_or(pan, -1.0, 1.0, 0.0);
        let notice = {
            let mut inner = self.lock();
            inner.pan = pan;
            if let Some(live) = inner.mode.live() {
                lock_graph(&live.graph).ramp_pan(pan, self.settings.fade_seconds);
            }
            inner.changed()
        };
        notice.send();
    }

    /// Registers `listener` and immediately hands it the current state.
    ///
    /// If another call broadcasts a newer state in the meantime, the listener
    /// gets that one and the initial snapshot is dropped, so it never sees
    /// state go backwards.
    pub fn subscribe(&self, listener: Listener) -> ListenerId {
        let (id, subscription, state, revision) = {
            let mut inner = self.lock();
            let (id, subscription) = inner.listeners.insert(listener);
            (id, subscription, inner.snapshot(), inner.revision)
        };
        deliver(id, &subscription, state, revision);
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.lock().listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ManualOutput;

    fn engine() -> (PlaybackEngine, ManualOutput) {
        let output = ManualOutput::new();
        let engine = PlaybackEngine::new(Arc::new(output.clone()), EngineSettings::default());
        (engine, output)
    }

    #[test]
    fn starts_idle_with_defaults() {
        let (engine, output) = engine();
        assert_eq!(
            engine.state(),
            EngineState {
                running: false,
                volume: 0.5,
                pan: 0.0
            }
        );
        assert!(engine.live_frequencies().is_none());
        assert_eq!(output.open_count(), 0);
    }

    #[test]
    fn remembered_playback_is_clamped() {
        let engine = PlaybackEngine::with_playback(
            Arc::new(ManualOutput::new()),
            EngineSettings::default(),
            PlaybackSettings {
                volume: 3.0,
                pan: f64::NAN,
            },
        );
        assert_eq!(engine.volume(), 1.0);
        assert_eq!(engine.pan(), 0.0);
    }

    #[test]
    fn update_frequencies_while_idle_is_rejected() {
        let (engine, _) = engine();
        assert_eq!(
            engine.update_frequencies(230.0, 236.0),
            Err(SimbeatError::NotRunning)
        );
        assert!(!engine.is_running());
    }

    #[test]
    fn volume_and_pan_clamp_while_idle() {
        let (engine, _) = engine();
        engine.set_volume(1.7);
        assert_eq!(engine.volume(), 1.0);
        engine.set_volume(-0.2);
        assert_eq!(engine.volume(), 0.0);
        engine.set_pan(-4.0);
        assert_eq!(engine.pan(), -1.0);
        engine.set_pan(0.3);
        assert_eq!(engine.pan(), 0.3);
        engine.set_volume(f64::NAN);
        assert_eq!(engine.volume(), 0.0);
    }

    #[tokio::test]
    async fn start_fades_in_to_current_volume() {
        let (engine, output) = engine();
        engine.set_volume(0.8);
        engine.start(220.0, 226.0).await.unwrap();

        let graph = output.graph().expect("graph should be attached");
        assert_eq!(lock_graph(&graph).master_gain(), 0.0);

        output.render_seconds(0.06).unwrap();
        assert_eq!(lock_graph(&graph).master_gain(), 0.8);
        assert_eq!(engine.live_frequencies(), Some((220.0, 226.0)));
    }

    #[tokio::test]
    async fn unusable_settings_are_replaced_before_building_a_graph() {
        let output = ManualOutput::new();
        let engine = PlaybackEngine::new(
            Arc::new(output.clone()),
            EngineSettings {
                sample_rate: 0,
                fade_seconds: f64::NAN,
                ..EngineSettings::default()
            },
        );
        engine.start(220.0, 226.0).await.unwrap();

        let graph = output.graph().unwrap();
        assert_eq!(lock_graph(&graph).sample_rate(), 44_100);
        output.render_seconds(0.06).unwrap();
        assert_eq!(lock_graph(&graph).master_gain(), 0.5);
    }

    #[tokio::test]
    async fn listener_may_call_back_into_engine() {
        let (engine, _) = engine();
        let handle = engine.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.subscribe(Arc::new(move |_: EngineState| {
            sink.lock().unwrap().push(handle.is_running());
        }));

        engine.start(220.0, 226.0).await.unwrap();
        engine.stop().await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![false, true, false]);
    }
}
