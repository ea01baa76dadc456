// Analysis module: from producer/consumer observations to a message flow graph

pub mod builder;
pub mod merge;
pub mod observations;
pub mod walker;

pub use builder::*;
pub use merge::*;
pub use observations::*;
pub use walker::*;

use crate::config::Config;
use crate::error::Result;
use crate::model::{MessageDefinition, MessageFlowGraph, MessageHandler};
use std::path::Path;
use tracing::info;

/// Result of analyzing a source location
#[derive(Debug)]
pub struct AnalysisResult {
    /// The canonical message flow graph
    pub graph: MessageFlowGraph,
    /// Merged handler -> sent messages
    pub producers: ObservationMap,
    /// Merged handler -> handled messages
    pub consumers: ObservationMap,
}

impl AnalysisResult {
    /// Build the graph for an already collected observation set
    pub fn from_observations(observations: &ObservationSet) -> Self {
        let producers = observations.producer_map();
        let consumers = observations.consumer_map();
        let graph = build(&producers, &consumers);
        Self {
            graph,
            producers,
            consumers,
        }
    }

    /// Produced messages without any consumer
    pub fn unconsumed(&self) -> Vec<(&MessageHandler, &MessageDefinition)> {
        unconsumed_messages(&self.producers, &self.consumers)
    }
}

/// Orchestrates collection, merging and graph building
pub struct FlowAnalyzer<C: ObservationCollector = ManifestCollector> {
    collector: C,
}

impl FlowAnalyzer<ManifestCollector> {
    /// Create an analyzer reading JSON manifests as configured
    pub fn from_config(config: &Config) -> Self {
        Self::new(ManifestCollector::from_config(config))
    }

    /// Create analyzer with verbose output
    pub fn with_verbose(self, verbose: bool) -> Self {
        Self::new(self.collector.with_verbose(verbose))
    }
}

impl<C: ObservationCollector> FlowAnalyzer<C> {
    pub fn new(collector: C) -> Self {
        Self { collector }
    }

    /// Analyze the given source location
    pub fn analyze(&self, source: &Path) -> Result<AnalysisResult> {
        let observations = self.collector.collect(source)?;
        let result = AnalysisResult::from_observations(&observations);

        info!(
            producers = result.producers.len(),
            produced_messages = merge::count_messages(&result.producers),
            consumers = result.consumers.len(),
            handled_messages = merge::count_messages(&result.consumers),
            edges = result.graph.edge_count(),
            "analysis complete"
        );
        Ok(result)
    }
}
