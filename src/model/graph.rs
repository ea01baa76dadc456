// Message flow graph
//
// A directed multigraph of handlers connected by message-tagged edges,
// backed by petgraph. Vertices are canonical per full name and edges are
// unique per (source, target, message) triple.

use super::handler::{MessageDefinition, MessageHandler};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A borrowed view of one edge: source sends `message`, target handles it
#[derive(Debug, Clone, Copy)]
pub struct FlowEdge<'a> {
    pub source: &'a MessageHandler,
    pub target: &'a MessageHandler,
    pub message: &'a MessageDefinition,
}

impl FlowEdge<'_> {
    /// Whether the edge crosses a module boundary
    pub fn is_inter_module(&self) -> bool {
        self.source.module_name() != self.target.module_name()
    }

    fn sort_key(&self) -> (&str, &str, &str) {
        (
            self.source.full_name(),
            self.target.full_name(),
            self.message.full_name(),
        )
    }
}

/// Directed graph of message handlers
#[derive(Debug, Clone, Default)]
pub struct MessageFlowGraph {
    graph: DiGraph<MessageHandler, MessageDefinition>,
    /// Full name -> canonical vertex
    index: HashMap<String, NodeIndex>,
    /// (source, target, message full name) of every edge
    edge_keys: HashSet<(NodeIndex, NodeIndex, String)>,
}

impl MessageFlowGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex, or reconcile metadata into the existing one with the same name
    pub fn add_vertex(&mut self, handler: MessageHandler) -> NodeIndex {
        if let Some(&idx) = self.index.get(handler.full_name()) {
            self.graph[idx].absorb(&handler);
            return idx;
        }

        let name = handler.full_name().to_string();
        let idx = self.graph.add_node(handler);
        self.index.insert(name, idx);
        idx
    }

    /// Connect two existing vertices with a message-tagged edge.
    ///
    /// Returns false if the identical (source, target, message) edge already exists.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, message: MessageDefinition) -> bool {
        let key = (source, target, message.full_name().to_string());
        if self.edge_keys.insert(key) {
            self.graph.add_edge(source, target, message);
            return true;
        }

        let existing = self
            .graph
            .edges_connecting(source, target)
            .find(|edge| edge.weight() == &message)
            .map(|edge| edge.id());
        if let Some(edge) = existing {
            self.graph[edge].absorb(&message);
        }
        false
    }

    /// Add an edge together with both endpoints
    pub fn add_flow(
        &mut self,
        source: &MessageHandler,
        target: &MessageHandler,
        message: &MessageDefinition,
    ) -> bool {
        let source = self.add_vertex(source.clone());
        let target = self.add_vertex(target.clone());
        self.add_edge(source, target, message.clone())
    }

    /// Look up a vertex by full name
    pub fn vertex(&self, full_name: &str) -> Option<&MessageHandler> {
        self.index.get(full_name).map(|&idx| &self.graph[idx])
    }

    pub fn contains_vertex(&self, full_name: &str) -> bool {
        self.index.contains_key(full_name)
    }

    /// Iterate over vertices in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = &MessageHandler> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Iterate over edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = FlowEdge<'_>> {
        self.graph.edge_references().map(move |edge| FlowEdge {
            source: &self.graph[edge.source()],
            target: &self.graph[edge.target()],
            message: edge.weight(),
        })
    }

    /// Edges sorted by (source, target, message) full names
    pub fn sorted_edges(&self) -> Vec<FlowEdge<'_>> {
        let mut edges: Vec<_> = self.edges().collect();
        edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        edges
    }

    /// Outbound edges of a vertex in insertion order (empty if the vertex is absent)
    pub fn outbound_edges(&self, full_name: &str) -> Vec<FlowEdge<'_>> {
        match self.index.get(full_name) {
            Some(&idx) => self
                .outbound(idx)
                .into_iter()
                .map(|(target, message)| FlowEdge {
                    source: &self.graph[idx],
                    target: &self.graph[target],
                    message,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Vertices marked as business process entry points, sorted by full name
    pub fn entry_points(&self) -> Vec<&MessageHandler> {
        let mut entry_points: Vec<_> = self.vertices().filter(|v| v.is_entry_point()).collect();
        entry_points.sort();
        entry_points
    }

    /// Distinct module keys, sorted lexicographically
    pub fn modules(&self) -> Vec<&str> {
        self.vertices()
            .map(|v| v.module_name())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Derived graph holding only edges whose endpoints sit in different modules.
    ///
    /// Vertices left without any such edge are dropped.
    pub fn inter_module_only(&self) -> MessageFlowGraph {
        let mut filtered = MessageFlowGraph::new();
        for edge in self.edges().filter(|e| e.is_inter_module()) {
            filtered.add_flow(edge.source, edge.target, edge.message);
        }
        filtered
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            vertices: self.vertex_count(),
            edges: self.edge_count(),
            modules: self.modules().len(),
            entry_points: self.entry_points().len(),
        }
    }

    pub(crate) fn node_index(&self, full_name: &str) -> Option<NodeIndex> {
        self.index.get(full_name).copied()
    }

    pub(crate) fn vertex_at(&self, idx: NodeIndex) -> &MessageHandler {
        &self.graph[idx]
    }

    /// Outbound (target, message) pairs of a vertex, in edge insertion order
    pub(crate) fn outbound(&self, idx: NodeIndex) -> Vec<(NodeIndex, &MessageDefinition)> {
        let mut edges: Vec<_> = self.graph.edges_directed(idx, Direction::Outgoing).collect();
        edges.sort_by_key(|edge| edge.id().index());
        edges
            .into_iter()
            .map(|edge| (edge.target(), edge.weight()))
            .collect()
    }

    /// Vertices in index order, for positional encoding
    pub(crate) fn indexed_vertices(&self) -> impl Iterator<Item = (usize, &MessageHandler)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx.index(), &self.graph[idx]))
    }

    /// Edges as (source index, target index, message), for positional encoding
    pub(crate) fn indexed_edges(&self) -> impl Iterator<Item = (usize, usize, &MessageDefinition)> {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index(), edge.weight()))
    }
}

/// Structural equality: same vertices with identical metadata and the same
/// edge multiset, independent of insertion order.
impl PartialEq for MessageFlowGraph {
    fn eq(&self, other: &Self) -> bool {
        if self.vertex_count() != other.vertex_count() || self.edge_count() != other.edge_count() {
            return false;
        }

        let vertices_match = self.vertices().all(|vertex| {
            other
                .vertex(vertex.full_name())
                .is_some_and(|theirs| vertex.same_metadata(theirs))
        });
        if !vertices_match {
            return false;
        }

        let ours = self.sorted_edges();
        let theirs = other.sorted_edges();
        ours.iter().zip(theirs.iter()).all(|(a, b)| {
            a.sort_key() == b.sort_key() && a.message.same_metadata(b.message)
        })
    }
}

impl Eq for MessageFlowGraph {}

/// Statistics about a message flow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub vertices: usize,
    pub edges: usize,
    pub modules: usize,
    pub entry_points: usize,
}
