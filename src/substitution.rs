//! Character substitution engine for the IPA character inventory.
//!
//! Replacements run in two phases. Every matched input grapheme is first
//! swapped for a slot in a local arena, then each slot is expanded to its
//! target. Slots are not text, so a target can never be re-matched as another
//! key within the same pass, and no codepoint can collide with a slot.

use std::cmp::Reverse;
use std::fmt;
use std::ops::Index;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TextnormError, TextnormResult};

/// One entry of the replacement-map configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementEntry {
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicode_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicode_point: Option<String>,
}

/// The replacement-map file: grapheme keys with their entries, in file order.
///
/// Order matters. Among keys of equal length, the earlier one wins where two
/// of them overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementEntries(Vec<(String, ReplacementEntry)>);

impl ReplacementEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ReplacementEntry> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, entry)| entry)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replace the entry for `key` in place, or append it.
    pub fn insert(&mut self, key: impl Into<String>, entry: ReplacementEntry) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = entry,
            None => self.0.push((key, entry)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReplacementEntry)> {
        self.0.iter().map(|(k, entry)| (k.as_str(), entry))
    }
}

impl Index<&str> for ReplacementEntries {
    type Output = ReplacementEntry;

    fn index(&self, key: &str) -> &ReplacementEntry {
        match self.get(key) {
            Some(entry) => entry,
            None => panic!("no replacement entry for {key:?}"),
        }
    }
}

impl Serialize for ReplacementEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, entry)| (k, entry)))
    }
}

impl<'de> Deserialize<'de> for ReplacementEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = ReplacementEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of grapheme to replacement entry")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(pair) = access.next_entry::<String, ReplacementEntry>()? {
                    entries.push(pair);
                }
                Ok(ReplacementEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Input grapheme to canonical grapheme, ready to apply.
#[derive(Debug, Clone, Default)]
pub struct ReplacementMap {
    /// `(key, target)`, longest key first.
    rules: Vec<(String, String)>,
}

/// Working text during a pass: untouched input or an arena slot.
enum Piece<'t> {
    Raw(&'t str),
    Slot(usize),
}

/// Result of [`ReplacementMap::apply_until_stable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    pub text: String,
    pub passes: usize,
    pub stable: bool,
}

impl ReplacementMap {
    /// Build a map from `(key, target)` pairs.
    ///
    /// Empty keys are rejected. Pairs whose target is empty or equal to the
    /// key are no-ops and are dropped.
    pub fn new<I, K, V>(pairs: I) -> TextnormResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut rules: Vec<(String, String)> = Vec::new();
        for (key, target) in pairs {
            let key = key.into();
            let target = target.into();
            if key.is_empty() {
                return Err(TextnormError::InvalidConfig(format!(
                    "replacement map has an empty key (target {target:?})"
                )));
            }
            if target.is_empty() || target == key {
                continue;
            }
            if rules.iter().any(|(k, _)| *k == key) {
                return Err(TextnormError::InvalidConfig(format!(
                    "replacement map lists {key:?} more than once"
                )));
            }
            rules.push((key, target));
        }
        // Stable sort keeps configuration order among equal lengths.
        rules.sort_by_key(|(key, _)| Reverse(key.chars().count()));
        Ok(Self { rules })
    }

    pub fn from_entries(entries: &ReplacementEntries) -> TextnormResult<Self> {
        Self::new(entries.iter().map(|(key, entry)| (key, entry.target.as_str())))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every replacement once, without transitive chaining.
    pub fn apply(&self, text: &str) -> String {
        if self.rules.is_empty() || text.is_empty() {
            return text.to_string();
        }

        let mut pieces = vec![Piece::Raw(text)];
        for (slot, (key, _)) in self.rules.iter().enumerate() {
            let mut next = Vec::with_capacity(pieces.len());
            for piece in pieces {
                match piece {
                    Piece::Raw(raw) => split_on_key(raw, key, slot, &mut next),
                    slot @ Piece::Slot(_) => next.push(slot),
                }
            }
            pieces = next;
        }

        let mut out = String::with_capacity(text.len());
        for piece in pieces {
            match piece {
                Piece::Raw(raw) => out.push_str(raw),
                Piece::Slot(slot) => out.push_str(&self.rules[slot].1),
            }
        }
        out
    }

    /// Re-apply the map until the text stops changing.
    ///
    /// A pass can expose a new match, e.g. when a replaced combining mark
    /// lands next to a base character that forms a digraph key. The loop
    /// stops after `max_passes` applications even if the text still changes.
    pub fn apply_until_stable(&self, text: &str, max_passes: usize) -> Substituted {
        let mut current = text.to_string();
        let mut passes = 0;
        while passes < max_passes {
            let next = self.apply(&current);
            passes += 1;
            if next == current {
                return Substituted {
                    text: current,
                    passes,
                    stable: true,
                };
            }
            current = next;
        }
        Substituted {
            text: current,
            passes,
            stable: false,
        }
    }
}

fn split_on_key<'t>(raw: &'t str, key: &str, slot: usize, out: &mut Vec<Piece<'t>>) {
    let mut last = 0;
    for (start, matched) in raw.match_indices(key) {
        if start > last {
            out.push(Piece::Raw(&raw[last..start]));
        }
        out.push(Piece::Slot(slot));
        last = start + matched.len();
    }
    if last < raw.len() {
        out.push(Piece::Raw(&raw[last..]));
    }
}

/// One-shot helper mirroring the Python-facing API.
pub fn make_replacements<'a, I>(text: &str, reps: I) -> TextnormResult<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    Ok(ReplacementMap::new(reps)?.apply(text))
}
