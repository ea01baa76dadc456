// Domain model: handlers, messages and the flow graph between them

pub mod graph;
pub mod handler;

pub use graph::*;
pub use handler::*;
