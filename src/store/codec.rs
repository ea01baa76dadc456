// Binary graph codec
//
// Layout:
//   magic    4 bytes  "MFGR"
//   version  u16 LE
//   length   u64 LE   payload length
//   payload  bincode snapshot (vertex list, positional edge list)
//   digest   32 bytes SHA-256 of payload
//
// Decoding either yields the complete graph or a DecodeError; no partially
// populated graph ever escapes.

use crate::error::{Error, Result};
use crate::model::{MessageDefinition, MessageFlowGraph, MessageHandler};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// File signature
pub const MAGIC: &[u8; 4] = b"MFGR";

/// Current format version
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 8;
const DIGEST_LEN: usize = 32;

/// Why a byte stream could not be decoded into a graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input truncated: need {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("not a message flow graph (bad magic bytes)")]
    BadMagic,

    #[error("unsupported format version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("payload checksum mismatch")]
    ChecksumMismatch,

    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("input exceeds {0} bytes")]
    TooLarge(u64),

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("corrupt graph: {0}")]
    Corrupt(String),
}

#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    vertices: Vec<MessageHandler>,
    edges: Vec<EdgeRecord>,
}

#[derive(Serialize, Deserialize)]
struct EdgeRecord {
    source: u32,
    target: u32,
    message: MessageDefinition,
}

impl GraphSnapshot {
    fn capture(graph: &MessageFlowGraph) -> Self {
        let vertices = graph
            .indexed_vertices()
            .map(|(_, handler)| handler.clone())
            .collect();
        let edges = graph
            .indexed_edges()
            .map(|(source, target, message)| EdgeRecord {
                source: source as u32,
                target: target as u32,
                message: message.clone(),
            })
            .collect();
        Self { vertices, edges }
    }

    fn restore(self) -> std::result::Result<MessageFlowGraph, DecodeError> {
        let mut graph = MessageFlowGraph::new();
        let vertex_count = self.vertices.len();

        for vertex in self.vertices {
            if graph.contains_vertex(vertex.full_name()) {
                return Err(DecodeError::Corrupt(format!(
                    "duplicate vertex {}",
                    vertex.full_name()
                )));
            }
            graph.add_vertex(vertex);
        }

        for edge in self.edges {
            let (source, target) = (edge.source as usize, edge.target as usize);
            if source >= vertex_count || target >= vertex_count {
                return Err(DecodeError::Corrupt(format!(
                    "edge {} -> {} references a missing vertex",
                    source, target
                )));
            }
            let message = edge.message.full_name().to_string();
            if !graph.add_edge(NodeIndex::new(source), NodeIndex::new(target), edge.message) {
                return Err(DecodeError::Corrupt(format!("duplicate edge tagged {}", message)));
            }
        }

        Ok(graph)
    }
}

/// Encode a graph into the self-describing binary format
pub fn encode(graph: &MessageFlowGraph) -> Result<Vec<u8>> {
    let snapshot = GraphSnapshot::capture(graph);
    let payload = bincode::serde::encode_to_vec(&snapshot, bincode::config::standard())
        .map_err(|e| Error::encode(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + DIGEST_LEN);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&payload);
    bytes.extend_from_slice(&Sha256::digest(&payload));
    Ok(bytes)
}

/// Decode a graph, rejecting foreign, truncated or corrupt input
pub fn decode(bytes: &[u8]) -> std::result::Result<MessageFlowGraph, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            expected: HEADER_LEN,
            found: bytes.len(),
        });
    }

    let (header, rest) = bytes.split_at(HEADER_LEN);
    if &header[0..4] != MAGIC {
        return Err(DecodeError::BadMagic);
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion {
            found: version,
            expected: FORMAT_VERSION,
        });
    }

    let mut length = [0u8; 8];
    length.copy_from_slice(&header[6..HEADER_LEN]);
    let payload_len = usize::try_from(u64::from_le_bytes(length))
        .map_err(|_| DecodeError::Payload("payload length overflows".to_string()))?;

    let expected = payload_len
        .checked_add(DIGEST_LEN)
        .ok_or_else(|| DecodeError::Payload("payload length overflows".to_string()))?;
    if rest.len() < expected {
        return Err(DecodeError::Truncated {
            expected: HEADER_LEN.saturating_add(expected),
            found: bytes.len(),
        });
    }
    if rest.len() > expected {
        return Err(DecodeError::TrailingBytes(rest.len() - expected));
    }

    let (payload, digest) = rest.split_at(payload_len);
    if Sha256::digest(payload).as_slice() != digest {
        return Err(DecodeError::ChecksumMismatch);
    }

    let (snapshot, consumed): (GraphSnapshot, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(|e| DecodeError::Payload(e.to_string()))?;
    if consumed != payload.len() {
        return Err(DecodeError::Payload(format!(
            "{} unread payload bytes",
            payload.len() - consumed
        )));
    }

    snapshot.restore()
}
