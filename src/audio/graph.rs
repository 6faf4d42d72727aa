//! The dual-oscillator signal graph.
//!
//! Topology, fixed at construction:
//!
//! ```text
//! left sine  -> channel gain -> merge ch0 \
//!                                          master gain -> stereo pan -> out
//! right sine -> channel gain -> merge ch1 /
//! ```
//!
//! The graph keeps its own clock: every rendered frame advances it by one
//! sample period, and all parameter ramps are scheduled against it.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::ramp::RampedParam;

/// Interleaved stereo.
pub const CHANNELS: u16 = 2;

/// A graph shared between the engine (control) and an output backend (render).
pub type SharedGraph = Arc<Mutex<SignalGraph>>;

/// Locks a shared graph, recovering the data if a render thread panicked.
pub fn lock_graph(graph: &SharedGraph) -> MutexGuard<'_, SignalGraph> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct SineOscillator {
    frequency: RampedParam,
    /// Normalised phase in `0.0..1.0`.
    phase: f64,
}

impl SineOscillator {
    fn new(frequency: f64) -> Self {
        Self {
            frequency: RampedParam::new(frequency),
            phase: 0.0,
        }
    }

    fn tick(&mut self, time: f64, inv_sample_rate: f64) -> f64 {
        let sample = (self.phase * TAU).sin();
        self.phase += self.frequency.value_at(time) * inv_sample_rate;
        self.phase -= self.phase.floor();
        sample
    }
}

#[derive(Debug, Clone)]
pub struct SignalGraph {
    sample_rate: u32,
    inv_sample_rate: f64,
    frames_rendered: u64,
    left: SineOscillator,
    right: SineOscillator,
    channel_gain: f64,
    master: RampedParam,
    pan: RampedParam,
}

impl SignalGraph {
    /// Builds a silent graph: master gain starts at zero and must be ramped up.
    pub fn new(sample_rate: u32, left_hz: f64, right_hz: f64, channel_gain: f64, pan: f64) -> Self {
        Self {
            sample_rate,
            inv_sample_rate: 1.0 / f64::from(sample_rate.max(1)),
            frames_rendered: 0,
            left: SineOscillator::new(left_hz),
            right: SineOscillator::new(right_hz),
            channel_gain,
            master: RampedParam::new(0.0),
            pan: RampedParam::new(pan),
        }
    }

    pub fn into_shared(self) -> SharedGraph {
        Arc::new(Mutex::new(self))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Seconds of audio rendered so far.
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 * self.inv_sample_rate
    }

    pub fn left_frequency(&self) -> f64 {
        self.left.frequency.value_at(self.current_time())
    }

    pub fn right_frequency(&self) -> f64 {
        self.right.frequency.value_at(self.current_time())
    }

    pub fn master_gain(&self) -> f64 {
        self.master.value_at(self.current_time())
    }

    pub fn pan(&self) -> f64 {
        self.pan.value_at(self.current_time())
    }

    /// True once the master gain has settled at zero.
    pub fn is_silent(&self) -> bool {
        let now = self.current_time();
        !self.master.is_ramping(now) && self.master.value_at(now) == 0.0
    }

    pub fn ramp_frequencies(&mut self, left_hz: f64, right_hz: f64, duration: f64) {
        let now = self.current_time();
        self.left.frequency.ramp_to(left_hz, now, duration);
        self.right.frequency.ramp_to(right_hz, now, duration);
    }

    pub fn ramp_master(&mut self, gain: f64, duration: f64) {
        let now = self.current_time();
        self.master.ramp_to(gain, now, duration);
    }

    pub fn ramp_pan(&mut self, pan: f64, duration: f64) {
        let now = self.current_time();
        self.pan.ramp_to(pan, now, duration);
    }

    /// Fills `out` with interleaved stereo frames. A trailing odd sample is
    /// zeroed.
    pub fn render(&mut self, out: &mut [f32]) {
        let mut frames = out.chunks_exact_mut(usize::from(CHANNELS));
        for frame in &mut frames {
            let (left, right) = self.next_frame();
            frame[0] = left as f32;
            frame[1] = right as f32;
        }
        for sample in frames.into_remainder() {
            *sample = 0.0;
        }

        let now = self.current_time();
        self.left.frequency.settle(now);
        self.right.frequency.settle(now);
        self.master.settle(now);
        self.pan.settle(now);
    }

    fn next_frame(&mut self) -> (f64, f64) {
        let time = self.current_time();
        self.frames_rendered += 1;

        let ch0 = self.left.tick(time, self.inv_sample_rate) * self.channel_gain;
        let ch1 = self.right.tick(time, self.inv_sample_rate) * self.channel_gain;

        let master = self.master.value_at(time);
        equal_power_pan(ch0 * master, ch1 * master, self.pan.value_at(time))
    }
}

/// Stereo-input equal-power panner, matching the usual browser
/// `StereoPannerNode` behaviour: panning towards one side folds the other
/// channel into it.
fn equal_power_pan(in_l: f64, in_r: f64, pan: f64) -> (f64, f64) {
    let pan = pan.clamp(-1.0, 1.0);
    if pan <= 0.0 {
        let x = (pan + 1.0) * FRAC_PI_2;
        (in_l + in_r * x.cos(), in_r * x.sin())
    } else {
        let x = pan * FRAC_PI_2;
        (in_l * x.cos(), in_r + in_l * x.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 48_000;
    const FADE: f64 = 0.05;

    fn render_seconds(graph: &mut SignalGraph, seconds: f64) -> Vec<f32> {
        let frames = (seconds * f64::from(SAMPLE_RATE)).ceil() as usize;
        let mut buf = vec![0.0; frames * 2];
        graph.render(&mut buf);
        buf
    }

    #[test]
    fn starts_silent_until_master_is_ramped() {
        let mut graph = SignalGraph::new(SAMPLE_RATE, 220.0, 226.0, 0.05, 0.0);
        let buf = render_seconds(&mut graph, 0.01);
        assert!(buf.iter().all(|s| *s == 0.0));
        assert!(graph.is_silent());
    }

    #[test]
    fn master_fade_reaches_volume_after_window() {
        let mut graph = SignalGraph::new(SAMPLE_RATE, 220.0, 226.0, 0.05, 0.0);
        graph.ramp_master(0.5, FADE);
        assert_eq!(graph.master_gain(), 0.0);

        render_seconds(&mut graph, FADE / 2.0);
        let mid = graph.master_gain();
        assert!(mid > 0.2 && mid < 0.3, "mid-fade gain was {mid}");

        render_seconds(&mut graph, FADE);
        assert_eq!(graph.master_gain(), 0.5);

        let buf = render_seconds(&mut graph, 0.01);
        let peak = buf.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.0 && peak <= 0.05 * 0.5 + 1e-6);
    }

    #[test]
    fn frequency_ramp_lands_on_target() {
        let mut graph = SignalGraph::new(SAMPLE_RATE, 220.0, 226.0, 0.05, 0.0);
        graph.ramp_frequencies(230.0, 236.0, FADE);
        assert_eq!(graph.left_frequency(), 220.0);

        render_seconds(&mut graph, FADE / 2.0);
        let mid = graph.left_frequency();
        assert!(mid > 220.0 && mid < 230.0);

        render_seconds(&mut graph, FADE);
        assert_eq!(graph.left_frequency(), 230.0);
        assert_eq!(graph.right_frequency(), 236.0);
    }

    #[test]
    fn hard_left_pan_silences_right_channel() {
        let mut graph = SignalGraph::new(SAMPLE_RATE, 220.0, 226.0, 0.05, -1.0);
        graph.ramp_master(1.0, 0.0);
        let buf = render_seconds(&mut graph, 0.01);

        let right_peak = buf.iter().skip(1).step_by(2).fold(0.0_f32, |a, s| a.max(s.abs()));
        let left_peak = buf.iter().step_by(2).fold(0.0_f32, |a, s| a.max(s.abs()));
        assert!(right_peak < 1e-6);
        assert!(left_peak > 0.0);
    }

    #[test]
    fn centred_pan_keeps_channels_separate() {
        let (l, r) = equal_power_pan(0.3, -0.2, 0.0);
        assert!((l - 0.3).abs() < 1e-12);
        assert!((r + 0.2).abs() < 1e-12);
    }

    #[test]
    fn clock_advances_with_rendered_frames() {
        let mut graph = SignalGraph::new(SAMPLE_RATE, 220.0, 226.0, 0.05, 0.0);
        let mut buf = vec![0.0; 4_800 * 2];
        graph.render(&mut buf);
        assert!((graph.current_time() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn odd_trailing_sample_is_zeroed() {
        let mut graph = SignalGraph::new(SAMPLE_RATE, 220.0, 226.0, 0.05, 0.0);
        graph.ramp_master(1.0, 0.0);
        let mut buf = vec![1.0; 5];
        graph.render(&mut buf);
        assert_eq!(buf[4], 0.0);
    }
}
