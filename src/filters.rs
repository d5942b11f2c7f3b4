//! Row filters and per-record rewrites.
//!
//! Filters return the number of rows they removed; the orchestrator turns
//! those counts into Preprocessing Log entries.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::corpus::Corpus;
use crate::language::{ForeignWordDetector, LanguageClassifier};
use crate::text::{self, NormalizationForm};

/// Marks an utterance the annotator judged ungrammatical.
pub const UNGRAMMATICAL_MARKER: char = '*';

/// High, mid and low tone letters.
pub const DEFAULT_TONE_SYMBOLS: &str = "hml";

lazy_static! {
    static ref DEFAULT_TONE_WORD: Regex = Regex::new(r"(?i)^[hml]+$").unwrap();
}

/// Drop rows whose text contains the ungrammaticality marker.
pub fn drop_ungrammatical(corpus: &mut Corpus) -> usize {
    let before = corpus.len();
    corpus.retain(|r| !r.text.contains(UNGRAMMATICAL_MARKER));
    before - corpus.len()
}

/// Unicode-normalize, lowercase and strip punctuation from every record.
pub fn normalize_strings(corpus: &mut Corpus, form: NormalizationForm, keep_punct: Option<&str>) {
    corpus.map_text(|t| {
        let normalized = text::unicode_normalize(t, form);
        text::remove_punct(&text::lowercase(&normalized), keep_punct)
    });
}

/// Drop rows without a tone diacritic.
pub fn drop_toneless(corpus: &mut Corpus) -> usize {
    let before = corpus.len();
    corpus.retain(|r| text::has_tone_diacritic(&r.text));
    before - corpus.len()
}

/// Words seen by the contamination filter, split by class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyPartition {
    pub foreign: BTreeSet<String>,
    pub in_language: BTreeSet<String>,
}

/// Drop every row containing a foreign word.
///
/// The partition covers tokens from all rows, dropped or kept.
pub fn drop_foreign<C: LanguageClassifier>(
    corpus: &mut Corpus,
    detector: &ForeignWordDetector<C>,
) -> (usize, VocabularyPartition) {
    let mut vocab = VocabularyPartition::default();
    let before = corpus.len();
    corpus.retain(|record| {
        let mut has_foreign = false;
        for word in record.text.split_whitespace() {
            if detector.is_foreign(word) {
                vocab.foreign.insert(word.to_string());
                has_foreign = true;
            } else {
                vocab.in_language.insert(word.to_string());
            }
        }
        if has_foreign {
            tracing::debug!(index = record.index, text = %record.text, "foreign word found");
        }
        !has_foreign
    });
    (before - corpus.len(), vocab)
}

/// Recognizes tokens made only of tone letters, e.g. `HLL` or `lhl`.
#[derive(Debug, Clone)]
pub struct ToneWords {
    pattern: Regex,
}

impl Default for ToneWords {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TONE_WORD.clone(),
        }
    }
}

impl ToneWords {
    /// Build a matcher for a custom tone alphabet (case-insensitive).
    pub fn new(symbols: &str) -> Result<Self, regex::Error> {
        let class: String = symbols.chars().map(|c| regex::escape(&c.to_string())).collect();
        Ok(Self {
            pattern: Regex::new(&format!("(?i)^[{class}]+$"))?,
        })
    }

    pub fn is_tone_word(&self, word: &str) -> bool {
        self.pattern.is_match(word)
    }

    /// Remove tone words and rejoin the rest with single spaces.
    pub fn strip(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|w| !self.is_tone_word(w))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Strip tone words from every record; returns how many records had one.
///
/// Every record is re-tokenized, so runs of whitespace collapse to single
/// spaces even where no tone word was present.
pub fn remove_tone_words(corpus: &mut Corpus, tone_words: &ToneWords) -> usize {
    let mut affected = 0;
    for record in &mut corpus.records {
        if record.text.split_whitespace().any(|w| tone_words.is_tone_word(w)) {
            affected += 1;
        }
        record.text = tone_words.strip(&record.text);
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusRecord;
    use crate::language::FrequencyClassifier;

    fn corpus(texts: &[&str]) -> Corpus {
        Corpus::new(
            texts
                .iter()
                .enumerate()
                .map(|(index, text)| CorpusRecord {
                    index,
                    audio_reference: "a.wav".into(),
                    start: 0.0,
                    end: 1000.0,
                    duration: 1000.0,
                    text: text.to_string(),
                    source_file: "a.eaf".into(),
                })
                .collect(),
        )
    }

    #[test]
    fn ungrammatical_rows_are_removed() {
        let mut c = corpus(&["*bad row", "tó lò", "fine*"]);
        assert_eq!(drop_ungrammatical(&mut c), 2);
        assert_eq!(c.texts().collect::<Vec<_>>(), vec!["tó lò"]);
    }

    #[test]
    fn normalization_lowercases_and_strips_punctuation() {
        let mut c = corpus(&["Tó, LÒ!", "a-b"]);
        normalize_strings(&mut c, NormalizationForm::Nfkd, Some("-"));
        assert_eq!(c.records[0].text, "to\u{0301} lo\u{0300}");
        assert_eq!(c.records[1].text, "a-b");
    }

    #[test]
    fn toneless_rows_are_removed() {
        let mut c = corpus(&["to\u{0301}", "ta", "ã"]);
        assert_eq!(drop_toneless(&mut c), 2);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn foreign_rows_are_removed_but_all_words_are_partitioned() {
        let classifier = FrequencyClassifier::new(
            [("word".to_string(), 1e-4), ("laugh".to_string(), 1e-5)].into(),
            1e-9,
        );
        let detector = ForeignWordDetector::new(classifier);
        let mut c = corpus(&["ŋá laugh", "kó ŋá", "downstep lò"]);
        let (removed, vocab) = drop_foreign(&mut c, &detector);
        assert_eq!(removed, 2);
        assert_eq!(c.texts().collect::<Vec<_>>(), vec!["kó ŋá"]);
        assert_eq!(
            vocab.foreign,
            ["downstep", "laugh"]
                .iter()
                .map(|w| w.to_string())
                .collect::<BTreeSet<String>>()
        );
        assert!(vocab.in_language.contains("lò"));
        assert!(vocab.in_language.contains("kó"));
        assert!(vocab.foreign.is_disjoint(&vocab.in_language));
    }

    #[test]
    fn tone_words_are_stripped_without_dropping_rows() {
        let tone_words = ToneWords::default();
        assert_eq!(tone_words.strip("hml word lhl"), "word");
        assert!(tone_words.is_tone_word("HLL"));
        assert!(!tone_words.is_tone_word("hello"));

        let mut c = corpus(&["hml word lhl", "LHL", "kó  ŋá"]);
        assert_eq!(remove_tone_words(&mut c, &tone_words), 2);
        assert_eq!(c.len(), 3);
        assert_eq!(c.records[0].text, "word");
        assert_eq!(c.records[1].text, "");
        assert_eq!(c.records[2].text, "kó ŋá");
    }

    #[test]
    fn custom_tone_alphabet() {
        let tone_words = ToneWords::new("HL").unwrap();
        assert!(tone_words.is_tone_word("hl"));
        assert!(!tone_words.is_tone_word("hml"));
    }
}
