//! Terminal validation gate over the normalized character set.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use crate::corpus::{Corpus, TEXT_COLUMN};
use crate::error::{TextnormError, TextnormResult};

/// Characters allowed in normalized output.
#[derive(Debug, Clone, Default)]
pub struct CharInventory {
    chars: HashSet<char>,
}

/// Characters outside the inventory and the rows they occur in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharsetViolations {
    pub chars: BTreeSet<char>,
    pub rows: Vec<usize>,
}

impl CharInventory {
    /// Each entry must be exactly one character, since the gate checks text
    /// one character at a time. Longer entries can never match and are
    /// skipped with a warning; their parts are not allowed on their own.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut chars = HashSet::new();
        for entry in entries {
            let entry = entry.as_ref();
            let mut it = entry.chars();
            match (it.next(), it.next()) {
                (Some(c), None) => {
                    chars.insert(c);
                }
                _ => tracing::warn!(
                    entry,
                    "inventory entry is not a single character, ignoring"
                ),
            }
        }
        Self { chars }
    }

    /// Load a JSON array of graphemes.
    pub fn from_path(path: &Path) -> TextnormResult<Self> {
        if !path.exists() {
            return Err(TextnormError::MissingConfig {
                what: "expected character inventory",
                path: path.to_path_buf(),
            });
        }
        let graphemes: Vec<String> = serde_json::from_str(&fs::read_to_string(path)?)?;
        if graphemes.is_empty() {
            return Err(TextnormError::InvalidConfig(format!(
                "character inventory {} is empty",
                path.display()
            )));
        }
        let inventory = Self::new(graphemes);
        tracing::info!(path = %path.display(), chars = inventory.len(), "loaded character inventory");
        Ok(inventory)
    }

    /// Also allow the punctuation kept during normalization.
    pub fn with_punctuation(mut self, keep: Option<&str>) -> Self {
        if let Some(keep) = keep {
            self.chars.extend(keep.chars());
        }
        self
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Collect every offending character across the whole corpus.
    pub fn scan(&self, corpus: &Corpus) -> CharsetViolations {
        let mut violations = CharsetViolations::default();
        for record in &corpus.records {
            let before = violations.chars.len();
            let mut found = false;
            for c in record.text.chars().filter(|c| !self.contains(*c)) {
                violations.chars.insert(c);
                found = true;
            }
            if found {
                tracing::debug!(
                    index = record.index,
                    new_chars = violations.chars.len() - before,
                    text = %record.text,
                    "unexpected characters"
                );
                violations.rows.push(record.index);
            }
        }
        violations
    }

    /// Fail if any record holds a character outside the inventory.
    pub fn check(&self, corpus: &Corpus) -> TextnormResult<()> {
        let violations = self.scan(corpus);
        if violations.chars.is_empty() {
            return Ok(());
        }
        Err(TextnormError::UnexpectedCharacters {
            chars: violations.chars,
            rows: violations.rows,
            column: TEXT_COLUMN,
        })
    }
}
