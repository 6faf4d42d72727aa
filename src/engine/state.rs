use serde::{Deserialize, Serialize};

use crate::audio::{lock_graph, ActiveOutput, SharedGraph};

/// What subscribers see of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub running: bool,
    pub volume: f64,
    pub pan: f64,
}

/// A fully wired graph attached to an output.
pub(crate) struct LiveGraph {
    pub(crate) graph: SharedGraph,
    output: Box<dyn ActiveOutput>,
}

impl LiveGraph {
    pub(crate) fn new(graph: SharedGraph, output: Box<dyn ActiveOutput>) -> Self {
        Self { graph, output }
    }

    pub(crate) fn backend(&self) -> &'static str {
        self.output.backend()
    }

    pub(crate) fn frequencies(&self) -> (f64, f64) {
        let graph = lock_graph(&self.graph);
        (graph.left_frequency(), graph.right_frequency())
    }

    /// Detaches the graph from its output and drops every node.
    pub(crate) fn release(self) {
        let Self { graph, output } = self;
        drop(output);
        drop(graph);
    }
}

/// Either nothing exists, or exactly one live graph does.
#[derive(Default)]
pub(crate) enum EngineMode {
    #[default]
    Idle,
    Running(LiveGraph),
}

impl EngineMode {
    pub(crate) fn is_running(&self) -> bool {
        matches!(self, EngineMode::Running(_))
    }

    pub(crate) fn live(&self) -> Option<&LiveGraph> {
        match self {
            EngineMode::Running(live) => Some(live),
            EngineMode::Idle => None,
        }
    }

    /// Leaves `Idle` behind and hands back whatever graph was live.
    pub(crate) fn take(&mut self) -> Option<LiveGraph> {
        match std::mem::take(self) {
            EngineMode::Running(live) => Some(live),
            EngineMode::Idle => None,
        }
    }
}

/// Clamps to `[min, max]`, treating NaN as `fallback`.
pub(crate) fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
