// Graph persistence
//
// Saves and loads the analyzed graph so later renders can skip analysis.

mod codec;

pub use codec::{decode, encode, DecodeError, FORMAT_VERSION, MAGIC};

use crate::error::{Error, Result};
use crate::model::MessageFlowGraph;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Largest encoded graph accepted by `read_from`
pub const MAX_ENCODED_LEN: u64 = 256 * 1024 * 1024;

/// Write an encoded graph to any sink
pub fn write_to<W: Write>(graph: &MessageFlowGraph, mut writer: W) -> Result<()> {
    let bytes = encode(graph)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read and decode a graph from any source
pub fn read_from<R: Read>(reader: R) -> Result<MessageFlowGraph> {
    let mut bytes = Vec::new();
    reader.take(MAX_ENCODED_LEN + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > MAX_ENCODED_LEN {
        return Err(DecodeError::TooLarge(MAX_ENCODED_LEN).into());
    }
    Ok(decode(&bytes)?)
}

/// Save a graph to `path`, creating parent directories as needed.
///
/// The graph is written to a temporary file next to `path` and renamed over
/// it, so a failed save leaves the previous file intact.
pub fn save(graph: &MessageFlowGraph, path: &Path) -> Result<()> {
    let bytes = encode(graph)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        writer.write_all(&bytes)?;
        writer.flush()?;
    }
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| e.error)?;

    debug!(
        path = %path.display(),
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "saved message flow graph"
    );
    Ok(())
}

/// Load a graph previously written by `save`
pub fn load(path: &Path) -> Result<MessageFlowGraph> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::InputNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let graph = read_from(BufReader::new(file))?;
    debug!(
        path = %path.display(),
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "loaded message flow graph"
    );
    Ok(graph)
}
