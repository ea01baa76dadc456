// Outbound reachability
//
// Narrows a graph to everything reachable from one handler by following
// outbound edges only. Uses an explicit stack and an expanded-vertex set,
// so cycles and diamonds are expanded once and deep chains cannot blow the
// call stack.

use crate::model::MessageFlowGraph;
use std::collections::HashSet;
use tracing::debug;

/// Subgraph of every edge reachable from `start` via outbound edges.
///
/// The input graph is left untouched. An absent start vertex yields an empty
/// graph; a start vertex without outbound edges yields just that vertex.
pub fn walk_outbound_from(graph: &MessageFlowGraph, start: &str) -> MessageFlowGraph {
    let mut walked = MessageFlowGraph::new();
    let Some(start_idx) = graph.node_index(start) else {
        debug!(start, "start vertex not in graph");
        return walked;
    };

    walked.add_vertex(graph.vertex_at(start_idx).clone());

    let mut expanded = HashSet::new();
    let mut pending = vec![start_idx];

    while let Some(current) = pending.pop() {
        if !expanded.insert(current) {
            continue;
        }

        let source = graph.vertex_at(current);
        let outbound = graph.outbound(current);

        // Reverse so the first outbound edge is expanded first
        for &(target, message) in outbound.iter().rev() {
            walked.add_flow(source, graph.vertex_at(target), message);
            if !expanded.contains(&target) {
                pending.push(target);
            }
        }
    }

    debug!(
        start,
        vertices = walked.vertex_count(),
        edges = walked.edge_count(),
        "walked outbound edges"
    );
    walked
}
