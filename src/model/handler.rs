// Identity-keyed domain entities
//
// Handlers and messages compare, hash and order by their full name only.
// Comments and entry point markers travel along as payload and never
// take part in identity.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Number of leading name segments forming a module key by default
pub const DEFAULT_MODULE_DEPTH: usize = 3;

/// Derive the module key from a qualified name: its first `depth` dot-separated segments
pub fn module_name_of(full_name: &str, depth: usize) -> String {
    full_name
        .split('.')
        .take(depth.max(1))
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a qualified name into (namespace, short name) at the last dot
pub fn split_full_name(full_name: &str) -> (&str, &str) {
    match full_name.rfind('.') {
        Some(idx) => (&full_name[..idx], &full_name[idx + 1..]),
        None => ("", full_name),
    }
}

fn non_empty(text: impl Into<String>) -> Option<String> {
    let text = text.into();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// A producer and/or consumer unit in the message flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHandler {
    full_name: String,
    module_name: String,
    comment: Option<String>,
    entry_point: Option<String>,
}

impl MessageHandler {
    /// Create a handler whose module key uses the default depth
    pub fn new(full_name: impl Into<String>) -> Self {
        Self::with_module_depth(full_name, DEFAULT_MODULE_DEPTH)
    }

    /// Create a handler whose module key is the first `depth` segments of its name
    pub fn with_module_depth(full_name: impl Into<String>, depth: usize) -> Self {
        let full_name = full_name.into();
        let module_name = module_name_of(&full_name, depth);
        Self {
            full_name,
            module_name,
            comment: None,
            entry_point: None,
        }
    }

    /// Attach a comment (blank text is ignored)
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = non_empty(comment);
        self
    }

    /// Mark as a business process entry point (blank text is ignored)
    pub fn with_entry_point(mut self, description: impl Into<String>) -> Self {
        self.entry_point = non_empty(description);
        self
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    pub fn is_entry_point(&self) -> bool {
        self.entry_point.is_some()
    }

    /// Namespace part of the full name (everything before the last dot)
    pub fn namespace(&self) -> &str {
        split_full_name(&self.full_name).0
    }

    /// Class part of the full name (the last segment)
    pub fn class_name(&self) -> &str {
        split_full_name(&self.full_name).1
    }

    /// Fill still-empty metadata from another observation of the same handler.
    ///
    /// The first non-empty value wins. Returns true if anything changed.
    pub fn absorb(&mut self, other: &MessageHandler) -> bool {
        debug_assert_eq!(self.full_name, other.full_name);
        let mut changed = false;
        if self.comment.is_none() && other.comment.is_some() {
            self.comment = other.comment.clone();
            changed = true;
        }
        if self.entry_point.is_none() && other.entry_point.is_some() {
            self.entry_point = other.entry_point.clone();
            changed = true;
        }
        changed
    }

    /// Compare every field, not just identity
    pub fn same_metadata(&self, other: &MessageHandler) -> bool {
        self.full_name == other.full_name
            && self.module_name == other.module_name
            && self.comment == other.comment
            && self.entry_point == other.entry_point
    }
}

impl PartialEq for MessageHandler {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
    }
}

impl Eq for MessageHandler {}

impl Hash for MessageHandler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name.hash(state);
    }
}

impl PartialOrd for MessageHandler {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageHandler {
    fn cmp(&self, other: &Self) -> Ordering {
        self.full_name.cmp(&other.full_name)
    }
}

impl Borrow<str> for MessageHandler {
    fn borrow(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Display for MessageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// A message payload type exchanged between handlers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDefinition {
    full_name: String,
    comment: Option<String>,
}

impl MessageDefinition {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            comment: None,
        }
    }

    /// Attach a comment (blank text is ignored)
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = non_empty(comment);
        self
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Last dot-separated segment, used as the edge label
    pub fn short_name(&self) -> &str {
        split_full_name(&self.full_name).1
    }

    /// Fill a missing comment from another observation of the same message
    pub fn absorb(&mut self, other: &MessageDefinition) -> bool {
        if self.comment.is_none() && other.comment.is_some() {
            self.comment = other.comment.clone();
            return true;
        }
        false
    }

    pub fn same_metadata(&self, other: &MessageDefinition) -> bool {
        self.full_name == other.full_name && self.comment == other.comment
    }
}

impl PartialEq for MessageDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
    }
}

impl Eq for MessageDefinition {}

impl Hash for MessageDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name.hash(state);
    }
}

impl PartialOrd for MessageDefinition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageDefinition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.full_name.cmp(&other.full_name)
    }
}

impl Borrow<str> for MessageDefinition {
    fn borrow(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Display for MessageDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}
