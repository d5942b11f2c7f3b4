//! Hunspell dictionary lookup as a foreign-word classifier.
//!
//! Loads one or more Hunspell dictionaries (e.g. `en_US`) plus optional
//! plain word lists from a directory. A token accepted by ANY of them is
//! classed as foreign.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use zspell::Dictionary;

use crate::error::{TextnormError, TextnormResult};
use crate::language::{LanguageClassifier, TokenClass};

/// Loaded dictionaries keyed by their file stem.
#[derive(Debug)]
pub struct DictionaryClassifier {
    hunspell: Vec<(String, Dictionary)>,
    wordlists: Vec<(String, HashSet<String>)>,
}

impl DictionaryClassifier {
    /// Load every named dictionary from `dict_dir`.
    ///
    /// For each name, `<name>.aff` + `<name>.dic` are used when present,
    /// otherwise `<name>_words.txt` as a plain word list. Names with
    /// neither are skipped with a warning; loading nothing at all is an
    /// error.
    pub fn load(dict_dir: &Path, names: &[String]) -> TextnormResult<Self> {
        if !dict_dir.is_dir() {
            return Err(TextnormError::MissingConfig {
                what: "dictionary directory",
                path: dict_dir.to_path_buf(),
            });
        }

        let mut hunspell = Vec::new();
        let mut wordlists = Vec::new();
        for name in names {
            if let Some(dict) = load_dict(dict_dir, name)? {
                hunspell.push((name.clone(), dict));
            } else if let Some(words) = load_wordlist(dict_dir, name)? {
                wordlists.push((name.clone(), words));
            } else {
                tracing::warn!(dictionary = %name, "dictionary not found, skipping");
            }
        }

        let classifier = Self {
            hunspell,
            wordlists,
        };
        if classifier.is_empty() {
            return Err(TextnormError::Classifier(format!(
                "no dictionaries loaded from {}",
                dict_dir.display()
            )));
        }
        tracing::info!("{}", classifier.stats());
        Ok(classifier)
    }

    /// Build from in-memory word lists only.
    pub fn from_wordlists<I>(lists: I) -> Self
    where
        I: IntoIterator<Item = (String, HashSet<String>)>,
    {
        Self {
            hunspell: Vec::new(),
            wordlists: lists.into_iter().collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.hunspell.is_empty() && self.wordlists.is_empty()
    }

    /// Check if a word exists in ANY loaded dictionary.
    pub fn check(&self, word: &str) -> bool {
        if self.check_exact(word) {
            return true;
        }
        let lower = word.to_lowercase();
        lower != word && self.check_exact(&lower)
    }

    fn check_exact(&self, word: &str) -> bool {
        self.hunspell.iter().any(|(_, d)| d.check_word(word))
            || self.wordlists.iter().any(|(_, w)| w.contains(word))
    }

    /// Names of the dictionaries that accept a word.
    pub fn languages(&self, word: &str) -> Vec<&str> {
        let lower = word.to_lowercase();
        let hunspell = self
            .hunspell
            .iter()
            .filter(|(_, d)| d.check_word(word) || d.check_word(&lower))
            .map(|(name, _)| name.as_str());
        let lists = self
            .wordlists
            .iter()
            .filter(|(_, w)| w.contains(word) || w.contains(&lower))
            .map(|(name, _)| name.as_str());
        hunspell.chain(lists).collect()
    }

    pub fn stats(&self) -> String {
        let names: Vec<&str> = self
            .hunspell
            .iter()
            .map(|(n, _)| n.as_str())
            .chain(self.wordlists.iter().map(|(n, _)| n.as_str()))
            .collect();
        format!("Dictionaries loaded: {}", names.join(", "))
    }
}

impl LanguageClassifier for DictionaryClassifier {
    fn classify(&self, token: &str) -> TokenClass {
        if self.check(token) {
            tracing::debug!(token, languages = ?self.languages(token), "dictionary hit");
            TokenClass::Foreign
        } else {
            TokenClass::InLanguage
        }
    }
}

/// Load a plain word list, one word per line, `#` comments allowed.
fn load_wordlist(dict_dir: &Path, name: &str) -> TextnormResult<Option<HashSet<String>>> {
    let wordlist_path = dict_dir.join(format!("{name}_words.txt"));
    if !wordlist_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&wordlist_path)?;
    let words: HashSet<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    tracing::info!(dictionary = %name, words = words.len(), "loaded word list");
    Ok(Some(words))
}

/// Load a single Hunspell dictionary using the zspell builder.
fn load_dict(dict_dir: &Path, name: &str) -> TextnormResult<Option<Dictionary>> {
    let aff_path = dict_dir.join(format!("{name}.aff"));
    let dic_path = dict_dir.join(format!("{name}.dic"));

    if !aff_path.exists() || !dic_path.exists() {
        return Ok(None);
    }

    let aff_content = fs::read_to_string(&aff_path)?;
    let dic_content = fs::read_to_string(&dic_path)?;

    let dict = zspell::builder()
        .config_str(&aff_content)
        .dict_str(&dic_content)
        .build()
        .map_err(|e| TextnormError::Classifier(format!("failed to build dictionary {name}: {e}")))?;
    tracing::info!(dictionary = %name, "loaded hunspell dictionary");
    Ok(Some(dict))
}
