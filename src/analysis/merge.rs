// Observation merging
//
// Folds named observation sources (publishers, senders, consumers, ...)
// into a single handler -> messages map keyed by handler identity.

use crate::model::{MessageDefinition, MessageHandler};
use std::collections::{BTreeMap, BTreeSet};

/// Handler -> set of messages, deduplicated by full name on both sides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationMap {
    entries: BTreeMap<MessageHandler, BTreeSet<MessageDefinition>>,
}

impl ObservationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `messages` into the entry for `handler`.
    ///
    /// An existing handler or message keeps its instance; still-empty metadata
    /// is filled from the new observation.
    pub fn insert<I>(&mut self, handler: MessageHandler, messages: I)
    where
        I: IntoIterator<Item = MessageDefinition>,
    {
        let set = match self.entries.remove_entry(handler.full_name()) {
            Some((mut existing, set)) => {
                existing.absorb(&handler);
                self.entries.entry(existing).or_insert(set)
            }
            None => self.entries.entry(handler).or_default(),
        };

        for message in messages {
            union_message(set, message);
        }
    }

    /// Look up a handler and its messages by full name
    pub fn get(&self, full_name: &str) -> Option<(&MessageHandler, &BTreeSet<MessageDefinition>)> {
        self.entries.get_key_value(full_name)
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.entries.contains_key(full_name)
    }

    /// Iterate in handler name order
    pub fn iter(&self) -> impl Iterator<Item = (&MessageHandler, &BTreeSet<MessageDefinition>)> {
        self.entries.iter()
    }

    pub fn handlers(&self) -> impl Iterator<Item = &MessageHandler> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union every entry of `other` into this map
    pub fn merge_from(&mut self, other: &ObservationMap) {
        for (handler, messages) in other.iter() {
            self.insert(handler.clone(), messages.iter().cloned());
        }
    }
}

impl<'a> IntoIterator for &'a ObservationMap {
    type Item = (&'a MessageHandler, &'a BTreeSet<MessageDefinition>);
    type IntoIter = std::collections::btree_map::Iter<'a, MessageHandler, BTreeSet<MessageDefinition>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn union_message(set: &mut BTreeSet<MessageDefinition>, message: MessageDefinition) {
    match set.get(message.full_name()) {
        Some(existing) if existing.comment().is_none() && message.comment().is_some() => {
            let mut updated = existing.clone();
            updated.absorb(&message);
            set.replace(updated);
        }
        Some(_) => {}
        None => {
            set.insert(message);
        }
    }
}

/// Merge observation maps in the given order into one map
pub fn merge<'a, I>(sources: I) -> ObservationMap
where
    I: IntoIterator<Item = &'a ObservationMap>,
{
    sources.into_iter().fold(ObservationMap::new(), |mut merged, source| {
        merged.merge_from(source);
        merged
    })
}

/// Total number of (handler, message) observations in a map
pub(crate) fn count_messages(map: &ObservationMap) -> usize {
    map.iter().map(|(_, messages)| messages.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe(map: &mut ObservationMap, handler: &str, messages: &[&str]) {
        map.insert(
            MessageHandler::new(handler),
            messages.iter().map(|m| MessageDefinition::new(*m)),
        );
    }

    fn names(map: &ObservationMap, handler: &str) -> Vec<String> {
        map.get(handler)
            .map(|(_, messages)| messages.iter().map(|m| m.full_name().to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_merge_empty_input() {
        let merged = merge(Vec::<&ObservationMap>::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_unions_messages_per_handler() {
        let mut publishers = ObservationMap::new();
        observe(&mut publishers, "a.b.c.P", &["m.One", "m.Two"]);
        let mut senders = ObservationMap::new();
        observe(&mut senders, "a.b.c.P", &["m.Two", "m.Three"]);
        observe(&mut senders, "a.b.c.Q", &["m.One"]);

        let merged = merge([&publishers, &senders]);

        assert_eq!(merged.len(), 2);
        assert_eq!(names(&merged, "a.b.c.P"), vec!["m.One", "m.Three", "m.Two"]);
        assert_eq!(names(&merged, "a.b.c.Q"), vec!["m.One"]);
    }

    #[test]
    fn test_merge_collapses_distinct_handler_instances() {
        let mut first = ObservationMap::new();
        first.insert(
            MessageHandler::new("a.b.c.P").with_comment("from publishers"),
            Vec::<MessageDefinition>::new(),
        );
        let mut second = ObservationMap::new();
        second.insert(
            MessageHandler::new("a.b.c.P")
                .with_comment("from senders")
                .with_entry_point("Checkout"),
            [MessageDefinition::new("m.One")],
        );

        let merged = merge([&first, &second]);

        assert_eq!(merged.len(), 1);
        let (handler, messages) = merged.get("a.b.c.P").unwrap();
        assert_eq!(handler.comment(), Some("from publishers"));
        assert_eq!(handler.entry_point(), Some("Checkout"));
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_message_comment_first_non_empty_wins() {
        let mut map = ObservationMap::new();
        let handler = MessageHandler::new("a.b.c.P");
        map.insert(handler.clone(), [MessageDefinition::new("m.One")]);
        map.insert(handler.clone(), [MessageDefinition::new("m.One").with_comment("described")]);
        map.insert(handler, [MessageDefinition::new("m.One").with_comment("ignored")]);

        let (_, messages) = map.get("a.b.c.P").unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages.iter().next().unwrap().comment(), Some("described"));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let mut a = ObservationMap::new();
        observe(&mut a, "z.Z", &["m.B", "m.A"]);
        observe(&mut a, "a.A", &["m.C"]);
        let mut b = ObservationMap::new();
        observe(&mut b, "m.M", &["m.A"]);

        let first: Vec<_> = merge([&a, &b]).iter().map(|(h, _)| h.full_name().to_string()).collect();
        let second: Vec<_> = merge([&a, &b]).iter().map(|(h, _)| h.full_name().to_string()).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["a.A", "m.M", "z.Z"]);
    }

    #[test]
    fn test_count_messages() {
        let mut merged = ObservationMap::new();
        observe(&mut merged, "a.A", &["m.One", "m.Two"]);
        observe(&mut merged, "b.B", &["m.One"]);
        assert_eq!(count_messages(&merged), 3);
    }
}
