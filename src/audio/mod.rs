pub mod binaural;
pub mod graph;
pub mod headless;
pub mod ramp;

use binaural::GraphSource;

use rodio::{OutputStream, Sink};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::error::{Result, SimbeatError};
use crate::{log_error, log_info};

pub use graph::{lock_graph, SharedGraph, SignalGraph};
pub use headless::{ManualOutput, NullOutput};
pub use ramp::{RampedParam, ScheduledRamp};

const ENABLE_LOGS: bool = true;

/// A sink that a signal graph can be attached to.
///
/// Implementations render the graph on their own schedule. Opening fails with
/// [`SimbeatError::EngineUnavailable`] when the host cannot produce sound.
pub trait AudioOutput: Send + Sync {
    fn open(&self, graph: SharedGraph) -> Result<Box<dyn ActiveOutput>>;
}

/// A graph attached to an output. Dropping it detaches the graph and releases
/// the device.
pub trait ActiveOutput: Send {
    fn backend(&self) -> &'static str;
}

/// Plays through the host's default output device.
///
/// rodio's stream handle is not `Send` on every platform, so each opened
/// stream lives on its own audio thread for as long as the graph is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioOutput;

impl RodioOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutput for RodioOutput {
    fn open(&self, graph: SharedGraph) -> Result<Box<dyn ActiveOutput>> {
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<(), String>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        // Spawn dedicated audio thread holding non-Send audio objects
        let worker = thread::Builder::new()
            .name("simbeat-audio".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(err) => {
                        let _ = ready_tx
                            .send(Err(format!("Failed to create audio output stream: {}", err)));
                        return;
                    }
                };
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(err) => {
                        let _ = ready_tx.send(Err(format!("Failed to create audio sink: {}", err)));
                        return;
                    }
                };

                sink.append(GraphSource::new(graph));
                sink.play();

                if ready_tx.send(Ok(())).is_err() {
                    log_error!("Audio output opener went away before the stream was ready");
                    sink.stop();
                    return;
                }

                // Blocks until the handle is dropped or an explicit shutdown arrives.
                let _ = shutdown_rx.recv();
                sink.stop();
                log_info!("Audio output thread shutting down");
            })
            .map_err(SimbeatError::unavailable)?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(RodioStream {
                shutdown: shutdown_tx,
                worker: Some(worker),
            })),
            Ok(Err(message)) => {
                let _ = worker.join();
                Err(SimbeatError::EngineUnavailable(message))
            }
            Err(_) => {
                let _ = worker.join();
                Err(SimbeatError::unavailable(
                    "audio thread exited before signaling readiness",
                ))
            }
        }
    }
}

struct RodioStream {
    shutdown: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl ActiveOutput for RodioStream {
    fn backend(&self) -> &'static str {
        "rodio"
    }
}

impl Drop for RodioStream {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            if let Err(err) = self.shutdown.send(()) {
                log_error!("Failed to send shutdown to audio thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join audio thread: {join_err:?}");
            }
        }
    }
}
