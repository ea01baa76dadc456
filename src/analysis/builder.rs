// Graph construction
//
// Cross-references merged producer and consumer maps by message identity.
// Every (producer, message, consumer) match becomes one edge between the
// canonical vertices of the two handlers.

use super::merge::ObservationMap;
use crate::model::{MessageDefinition, MessageFlowGraph, MessageHandler};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Build the message flow graph from merged producer and consumer maps.
///
/// Every handler keyed in either map becomes a vertex, even one without
/// edges. Messages nobody consumes produce no edges.
pub fn build(producers: &ObservationMap, consumers: &ObservationMap) -> MessageFlowGraph {
    let mut graph = MessageFlowGraph::new();

    // A handler that both produces and consumes is observed twice; collapse
    // both observations into one canonical vertex before wiring edges.
    let mut canonical: BTreeMap<&str, MessageHandler> = BTreeMap::new();
    for handler in producers.handlers().chain(consumers.handlers()) {
        canonical
            .entry(handler.full_name())
            .and_modify(|existing| {
                existing.absorb(handler);
            })
            .or_insert_with(|| handler.clone());
    }

    let vertices: HashMap<&str, _> = canonical
        .into_iter()
        .map(|(name, handler)| (name, graph.add_vertex(handler)))
        .collect();

    let consumers_by_message = index_consumers(consumers);
    let mut dropped = 0usize;

    for (producer, messages) in producers {
        let source = vertices[producer.full_name()];
        for message in messages {
            let Some(handlers) = consumers_by_message.get(message.full_name()) else {
                debug!(producer = %producer, message = %message, "no consumer for message");
                dropped += 1;
                continue;
            };

            for (consumer, handled) in handlers {
                let target = vertices[consumer.full_name()];
                let mut tag = message.clone();
                tag.absorb(handled);
                graph.add_edge(source, target, tag);
            }
        }
    }

    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        unconsumed = dropped,
        "built message flow graph"
    );
    graph
}

/// Message full name -> consumers handling it, in consumer name order
fn index_consumers(
    consumers: &ObservationMap,
) -> HashMap<&str, Vec<(&MessageHandler, &MessageDefinition)>> {
    let mut index: HashMap<&str, Vec<_>> = HashMap::new();
    for (consumer, messages) in consumers {
        for message in messages {
            index
                .entry(message.full_name())
                .or_default()
                .push((consumer, message));
        }
    }
    index
}

/// Produced messages that no consumer handles, as (producer, message) pairs
pub fn unconsumed_messages<'a>(
    producers: &'a ObservationMap,
    consumers: &ObservationMap,
) -> Vec<(&'a MessageHandler, &'a MessageDefinition)> {
    let consumed = index_consumers(consumers);
    producers
        .iter()
        .flat_map(|(producer, messages)| messages.iter().map(move |m| (producer, m)))
        .filter(|(_, message)| !consumed.contains_key(message.full_name()))
        .collect()
}
