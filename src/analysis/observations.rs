// Producer/consumer observations
//
// The static analysis that discovers who publishes, sends, responds to and
// consumes which message types lives outside this crate. It hands over its
// findings as JSON manifests, which are read here into named observation
// sources.

use super::merge::{merge, ObservationMap};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{MessageDefinition, MessageHandler, DEFAULT_MODULE_DEPTH};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Named observation source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// Calls `Publish` on an endpoint
    Publisher,
    /// Publishes through an extension method on a publish context
    ExtensionPublisher,
    /// Responds to a consumed request
    Responder,
    /// Sends to a conventional endpoint
    Sender,
    /// Issues a request whose response it awaits
    ResponseSender,
    /// Implements a consumer for a message
    Consumer,
    /// Receives the response to its own request
    ResponseReceiver,
}

impl ObservationKind {
    /// Producer sources in merge order
    pub const PRODUCERS: [ObservationKind; 5] = [
        ObservationKind::Publisher,
        ObservationKind::ExtensionPublisher,
        ObservationKind::Responder,
        ObservationKind::Sender,
        ObservationKind::ResponseSender,
    ];

    /// Consumer sources in merge order
    pub const CONSUMERS: [ObservationKind; 2] =
        [ObservationKind::Consumer, ObservationKind::ResponseReceiver];
}

/// All observation sources of one analysis run
#[derive(Debug, Clone, Default)]
pub struct ObservationSet {
    sources: BTreeMap<ObservationKind, ObservationMap>,
}

impl ObservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `handler` produces or consumes `messages` as `kind`
    pub fn record<I>(&mut self, kind: ObservationKind, handler: MessageHandler, messages: I)
    where
        I: IntoIterator<Item = MessageDefinition>,
    {
        self.sources.entry(kind).or_default().insert(handler, messages);
    }

    pub fn source(&self, kind: ObservationKind) -> Option<&ObservationMap> {
        self.sources.get(&kind)
    }

    /// Merged handler -> sent messages map
    pub fn producer_map(&self) -> ObservationMap {
        merge(ObservationKind::PRODUCERS.iter().filter_map(|kind| self.sources.get(kind)))
    }

    /// Merged handler -> handled messages map
    pub fn consumer_map(&self) -> ObservationMap {
        merge(ObservationKind::CONSUMERS.iter().filter_map(|kind| self.sources.get(kind)))
    }

    pub fn is_empty(&self) -> bool {
        self.sources.values().all(|map| map.is_empty())
    }
}

/// Front-end that turns a source location into observations
pub trait ObservationCollector {
    fn collect(&self, source: &Path) -> Result<ObservationSet>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Manifest {
    handlers: BTreeMap<String, HandlerInfo>,
    messages: BTreeMap<String, MessageInfo>,
    observations: Vec<ObservationRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HandlerInfo {
    comment: Option<String>,
    entry_point: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessageInfo {
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObservationRecord {
    kind: ObservationKind,
    handler: String,
    #[serde(default)]
    messages: Vec<String>,
}

fn fill(slot: &mut Option<String>, value: &Option<String>) {
    let empty = slot.as_deref().map_or(true, |text| text.trim().is_empty());
    if empty && value.as_deref().is_some_and(|text| !text.trim().is_empty()) {
        slot.clone_from(value);
    }
}

impl Manifest {
    fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Fold a later manifest into this one. Metadata tables are shared
    /// across manifests, with the first non-empty value winning.
    fn absorb(&mut self, other: Manifest) {
        for (name, info) in other.handlers {
            let entry = self.handlers.entry(name).or_default();
            fill(&mut entry.comment, &info.comment);
            fill(&mut entry.entry_point, &info.entry_point);
        }
        for (name, info) in other.messages {
            fill(&mut self.messages.entry(name).or_default().comment, &info.comment);
        }
        self.observations.extend(other.observations);
    }

    fn into_observations(self, module_depth: usize) -> ObservationSet {
        let mut set = ObservationSet::new();

        for record in &self.observations {
            let handler = self.handler(&record.handler, module_depth);
            let messages: Vec<_> = record.messages.iter().map(|m| self.message(m)).collect();
            set.record(record.kind, handler, messages);
        }

        set
    }

    fn handler(&self, full_name: &str, module_depth: usize) -> MessageHandler {
        let mut handler = MessageHandler::with_module_depth(full_name, module_depth);
        if let Some(info) = self.handlers.get(full_name) {
            if let Some(comment) = &info.comment {
                handler = handler.with_comment(comment.as_str());
            }
            if let Some(entry_point) = &info.entry_point {
                handler = handler.with_entry_point(entry_point.as_str());
            }
        }
        handler
    }

    fn message(&self, full_name: &str) -> MessageDefinition {
        let message = MessageDefinition::new(full_name);
        match self.messages.get(full_name).and_then(|info| info.comment.as_deref()) {
            Some(comment) => message.with_comment(comment),
            None => message,
        }
    }
}

/// Parse manifest text into observations
pub fn parse_manifest(text: &str, module_depth: usize) -> serde_json::Result<ObservationSet> {
    Ok(Manifest::parse(text)?.into_observations(module_depth))
}

/// Reads observation manifests from a file or a directory tree
#[derive(Debug, Clone)]
pub struct ManifestCollector {
    module_depth: usize,
    suffix: String,
    verbose: bool,
}

impl ManifestCollector {
    pub fn new() -> Self {
        Self {
            module_depth: DEFAULT_MODULE_DEPTH,
            suffix: ".msgflow.json".to_string(),
            verbose: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            module_depth: config.graph.module_depth,
            suffix: config.analysis.manifest_suffix.clone(),
            verbose: false,
        }
    }

    pub fn with_module_depth(mut self, depth: usize) -> Self {
        self.module_depth = depth;
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Show a progress bar while reading manifests
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Find manifest files under a directory, sorted by path
    fn discover_manifests(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(&self.suffix));
            if matches {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    fn read_manifest(&self, path: &Path) -> Result<Manifest> {
        let text = std::fs::read_to_string(path)?;
        Manifest::parse(&text).map_err(|e| Error::manifest(path, e.to_string()))
    }
}

impl Default for ManifestCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationCollector for ManifestCollector {
    fn collect(&self, source: &Path) -> Result<ObservationSet> {
        if !source.exists() {
            return Err(Error::InputNotFound(source.to_path_buf()));
        }

        if source.is_file() {
            return Ok(self.read_manifest(source)?.into_observations(self.module_depth));
        }

        let files = self.discover_manifests(source)?;
        if files.is_empty() {
            return Err(Error::manifest(source, "no observation manifests found"));
        }

        let progress = if self.verbose {
            let pb = ProgressBar::new(files.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        let mut combined = Manifest::default();
        for path in &files {
            if let Some(ref pb) = progress {
                let msg = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                pb.set_message(msg);
                pb.inc(1);
            }

            debug!(manifest = %path.display(), "reading observation manifest");
            combined.absorb(self.read_manifest(path)?);
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Manifests read");
        }

        Ok(combined.into_observations(self.module_depth))
    }
}
