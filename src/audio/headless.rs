//! Outputs that need no sound hardware.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::graph::{lock_graph, SharedGraph, CHANNELS};
use super::{ActiveOutput, AudioOutput};
use crate::error::{Result, SimbeatError};

const BLOCK_FRAMES: usize = 512;

/// Renders the graph in real time and throws the samples away.
///
/// Ramps and fades progress exactly as they would on a device, which makes
/// this useful for running on machines without audio.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl NullOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutput for NullOutput {
    fn open(&self, graph: SharedGraph) -> Result<Box<dyn ActiveOutput>> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let worker = thread::Builder::new()
            .name("simbeat-null-output".to_string())
            .spawn(move || {
                let mut scratch = vec![0.0_f32; BLOCK_FRAMES * usize::from(CHANNELS)];
                let block = {
                    let rate = lock_graph(&graph).sample_rate().max(1);
                    Duration::from_secs_f64(BLOCK_FRAMES as f64 / f64::from(rate))
                };
                while !stop_flag.load(Ordering::SeqCst) {
                    lock_graph(&graph).render(&mut scratch);
                    thread::sleep(block);
                }
            })
            .map_err(SimbeatError::unavailable)?;

        Ok(Box::new(NullStream {
            stop,
            worker: Some(worker),
        }))
    }
}

struct NullStream {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ActiveOutput for NullStream {
    fn backend(&self) -> &'static str {
        "null"
    }
}

impl Drop for NullStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

#[derive(Default)]
struct ManualState {
    attached: Mutex<Option<SharedGraph>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// An output whose clock only moves when the caller renders.
///
/// Clones share state, so a test can hand one clone to the engine and drive
/// the attached graph through another.
#[derive(Clone, Default)]
pub struct ManualOutput {
    state: Arc<ManualState>,
    failure: Option<String>,
}

impl ManualOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An output that refuses every `open`, like a host with no audio device.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: Arc::default(),
            failure: Some(reason.into()),
        }
    }

    /// The graph currently attached, if any.
    pub fn graph(&self) -> Option<SharedGraph> {
        self.state
            .attached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_attached(&self) -> bool {
        self.graph().is_some()
    }

    pub fn open_count(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Renders `frames` stereo frames from the attached graph.
    pub fn render(&self, frames: usize) -> Option<Vec<f32>> {
        let graph = self.graph()?;
        let mut buf = vec![0.0; frames * usize::from(CHANNELS)];
        lock_graph(&graph).render(&mut buf);
        Some(buf)
    }

    /// Renders enough frames to cover `seconds` of audio.
    pub fn render_seconds(&self, seconds: f64) -> Option<Vec<f32>> {
        let rate = lock_graph(&self.graph()?).sample_rate();
        self.render((seconds * f64::from(rate)).ceil() as usize)
    }
}

impl AudioOutput for ManualOutput {
    fn open(&self, graph: SharedGraph) -> Result<Box<dyn ActiveOutput>> {
        if let Some(reason) = &self.failure {
            return Err(SimbeatError::EngineUnavailable(reason.clone()));
        }

        *self
            .state
            .attached
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&graph));
        self.state.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(ManualStream {
            state: Arc::clone(&self.state),
            graph,
        }))
    }
}

struct ManualStream {
    state: Arc<ManualState>,
    graph: SharedGraph,
}

impl ActiveOutput for ManualStream {
    fn backend(&self) -> &'static str {
        "manual"
    }
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        let mut attached = self
            .state
            .attached
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(attached.as_ref(), Some(current) if Arc::ptr_eq(current, &self.graph)) {
            *attached = None;
        }
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::graph::SignalGraph;

    #[test]
    fn manual_output_detaches_on_drop() {
        let output = ManualOutput::new();
        let graph = SignalGraph::new(8_000, 220.0, 226.0, 0.05, 0.0).into_shared();

        let stream = output.open(graph).unwrap();
        assert_eq!(stream.backend(), "manual");
        assert!(output.is_attached());
        assert_eq!(output.render(16).map(|b| b.len()), Some(32));

        drop(stream);
        assert!(!output.is_attached());
        assert!(output.render(16).is_none());
        assert_eq!((output.open_count(), output.close_count()), (1, 1));
    }

    #[test]
    fn unavailable_output_refuses_to_open() {
        let output = ManualOutput::unavailable("no device");
        let graph = SignalGraph::new(8_000, 220.0, 226.0, 0.05, 0.0).into_shared();
        match output.open(graph) {
            Err(SimbeatError::EngineUnavailable(reason)) => assert_eq!(reason, "no device"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("output should be unavailable"),
        }
    }

    #[test]
    fn null_output_advances_the_graph_clock() {
        let graph = SignalGraph::new(8_000, 220.0, 226.0, 0.05, 0.0).into_shared();
        let stream = NullOutput::new().open(Arc::clone(&graph)).unwrap();
        thread::sleep(Duration::from_millis(150));
        drop(stream);
        assert!(lock_graph(&graph).current_time() > 0.0);
    }
}
