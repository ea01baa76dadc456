//! msgflow - Visualize asynchronous message flow between handlers
//!
//! Merges producer/consumer observations into a canonical message flow
//! graph, narrows it to what a given handler reaches, and renders it as a
//! clustered Graphviz diagram.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod store;

// Re-export main types
pub use analysis::{build, merge, walk_outbound_from, AnalysisResult, FlowAnalyzer};
pub use config::Config;
pub use error::{Error, Result};
pub use model::{FlowEdge, MessageDefinition, MessageFlowGraph, MessageHandler};
pub use output::DotRenderer;
