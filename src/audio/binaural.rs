use rodio::Source;
use std::time::Duration;

use super::graph::{lock_graph, SharedGraph, CHANNELS};

/// Frames rendered per graph lock.
const BLOCK_FRAMES: usize = 512;

/// Binaural beat source for rodio.
///
/// Pulls interleaved stereo blocks out of the shared [`SignalGraph`] so the
/// left oscillator always lands in channel 0 and the right one in channel 1.
///
/// [`SignalGraph`]: super::graph::SignalGraph
pub struct GraphSource {
    graph: SharedGraph,
    sample_rate: u32,
    buffer: Vec<f32>,
    cursor: usize,
}

impl GraphSource {
    pub fn new(graph: SharedGraph) -> Self {
        let sample_rate = lock_graph(&graph).sample_rate();
        let buffer = vec![0.0; BLOCK_FRAMES * usize::from(CHANNELS)];
        let cursor = buffer.len();
        Self {
            graph,
            sample_rate,
            buffer,
            cursor,
        }
    }
}

impl Iterator for GraphSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.buffer.len() {
            lock_graph(&self.graph).render(&mut self.buffer);
            self.cursor = 0;
        }

        let sample = self.buffer[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl Source for GraphSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Infinite stream
    }

    fn channels(&self) -> u16 {
        CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::graph::SignalGraph;

    #[test]
    fn yields_interleaved_blocks_from_graph() {
        let graph = SignalGraph::new(44_100, 220.0, 226.0, 0.05, 0.0).into_shared();
        lock_graph(&graph).ramp_master(1.0, 0.0);

        let mut source = GraphSource::new(graph.clone());
        assert_eq!(source.channels(), 2);
        assert_eq!(source.sample_rate(), 44_100);

        let samples: Vec<f32> = source.by_ref().take(BLOCK_FRAMES * 2 + 2).collect();
        assert_eq!(samples.len(), BLOCK_FRAMES * 2 + 2);
        assert!(samples.iter().any(|s| *s != 0.0));

        // Two blocks have been pulled through the graph clock.
        let expected = (2 * BLOCK_FRAMES) as f64 / 44_100.0;
        assert!((lock_graph(&graph).current_time() - expected).abs() < 1e-9);
    }
}
