//! Foreign-word detection.
//!
//! The contamination filter only asks one question per token: is this a
//! foreign (English) word? [`LanguageClassifier`] answers it for a bare
//! token, and [`ForeignWordDetector`] wraps any classifier with the fixed
//! policy that applies to every backend (denylist, ASCII heuristic,
//! minimum length).

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use lazy_static::lazy_static;
use whatlang::{Detector, Lang};

use crate::error::{TextnormError, TextnormResult};
use crate::text::strip_punct;

lazy_static! {
    // Tokens that are foreign regardless of what the classifier says
    static ref DEFAULT_DENYLIST: HashSet<&'static str> = {
        let words = ["downstep"];
        words.iter().cloned().collect()
    };
}

/// Frequency above which a word counts as English.
pub const DEFAULT_FREQUENCY_THRESHOLD: f64 = 1e-9;

/// Shorter tokens are never classed as foreign by the classifier.
pub const MIN_FOREIGN_TOKEN_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    InLanguage,
    Foreign,
}

pub trait LanguageClassifier {
    fn classify(&self, token: &str) -> TokenClass;
}

impl<C: LanguageClassifier + ?Sized> LanguageClassifier for Box<C> {
    fn classify(&self, token: &str) -> TokenClass {
        (**self).classify(token)
    }
}

impl<C: LanguageClassifier + ?Sized> LanguageClassifier for &C {
    fn classify(&self, token: &str) -> TokenClass {
        (**self).classify(token)
    }
}

/// Word-frequency lookup against a general English frequency table.
#[derive(Debug, Clone)]
pub struct FrequencyClassifier {
    frequencies: HashMap<String, f64>,
    threshold: f64,
}

impl FrequencyClassifier {
    pub fn new(frequencies: HashMap<String, f64>, threshold: f64) -> Self {
        let frequencies = frequencies
            .into_iter()
            .map(|(word, freq)| (word.to_lowercase(), freq))
            .collect();
        Self {
            frequencies,
            threshold,
        }
    }

    /// Load a two-column `word<delim>frequency` table without a header.
    /// Lines starting with `#` are ignored.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8, threshold: f64) -> TextnormResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut frequencies = HashMap::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let (Some(word), Some(freq)) = (record.get(0), record.get(1)) else {
                return Err(TextnormError::InvalidConfig(format!(
                    "frequency table row {} needs `word` and `frequency` columns",
                    line + 1
                )));
            };
            let freq: f64 = freq.parse().map_err(|_| {
                TextnormError::InvalidConfig(format!(
                    "frequency table row {}: `{freq}` is not a number",
                    line + 1
                ))
            })?;
            frequencies.insert(word.to_string(), freq);
        }
        Ok(Self::new(frequencies, threshold))
    }

    /// Load from a file; `.tsv` files are tab separated, anything else comma.
    pub fn from_path(path: &Path, threshold: f64) -> TextnormResult<Self> {
        if !path.exists() {
            return Err(TextnormError::MissingConfig {
                what: "word frequency table",
                path: path.to_path_buf(),
            });
        }
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") | Some("txt") => b'\t',
            _ => b',',
        };
        let classifier = Self::from_reader(File::open(path)?, delimiter, threshold)?;
        tracing::info!(
            path = %path.display(),
            words = classifier.frequencies.len(),
            "loaded word frequency table"
        );
        Ok(classifier)
    }

    pub fn frequency(&self, word: &str) -> f64 {
        self.frequencies
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(0.0)
    }
}

impl LanguageClassifier for FrequencyClassifier {
    fn classify(&self, token: &str) -> TokenClass {
        if self.frequency(token) > self.threshold {
            TokenClass::Foreign
        } else {
            TokenClass::InLanguage
        }
    }
}

/// Statistical language identification with `whatlang`.
pub struct WhatlangClassifier {
    detector: Detector,
    foreign: Lang,
    min_confidence: f64,
}

impl WhatlangClassifier {
    pub fn new(foreign: Lang, min_confidence: f64) -> Self {
        Self {
            detector: Detector::new(),
            foreign,
            min_confidence,
        }
    }

    /// Build from an ISO 639-3 code such as `eng`.
    pub fn from_code(code: &str, min_confidence: f64) -> TextnormResult<Self> {
        let lang = Lang::from_code(code).ok_or_else(|| {
            TextnormError::Classifier(format!("whatlang does not know language `{code}`"))
        })?;
        Ok(Self::new(lang, min_confidence))
    }
}

impl LanguageClassifier for WhatlangClassifier {
    fn classify(&self, token: &str) -> TokenClass {
        match self.detector.detect(token) {
            Some(info) if info.lang() == self.foreign && info.confidence() >= self.min_confidence => {
                TokenClass::Foreign
            }
            _ => TokenClass::InLanguage,
        }
    }
}

/// Applies the fixed foreign-word policy on top of a classifier.
pub struct ForeignWordDetector<C> {
    classifier: C,
    denylist: HashSet<String>,
    min_chars: usize,
}

impl<C: LanguageClassifier> ForeignWordDetector<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            denylist: DEFAULT_DENYLIST.iter().map(|w| w.to_string()).collect(),
            min_chars: MIN_FOREIGN_TOKEN_CHARS,
        }
    }

    pub fn with_denylist<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist.extend(words.into_iter().map(Into::into));
        self
    }

    /// Whether a whitespace-delimited token is a foreign word.
    pub fn is_foreign(&self, word: &str) -> bool {
        if self.denylist.contains(word) {
            return true;
        }
        if word.chars().count() < self.min_chars {
            return false;
        }
        let stripped = strip_punct(word);
        // anything outside ASCII is taken to be orthography, not English
        if stripped.is_empty() || !stripped.is_ascii() {
            return false;
        }
        self.classifier.classify(stripped) == TokenClass::Foreign
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(words: &[(&str, f64)]) -> FrequencyClassifier {
        FrequencyClassifier::new(
            words.iter().map(|(w, f)| (w.to_string(), *f)).collect(),
            DEFAULT_FREQUENCY_THRESHOLD,
        )
    }

    #[test]
    fn frequency_threshold_is_strict() {
        let classifier = table(&[("word", 1e-4), ("rare", 1e-9)]);
        assert_eq!(classifier.classify("word"), TokenClass::Foreign);
        assert_eq!(classifier.classify("WORD"), TokenClass::Foreign);
        assert_eq!(classifier.classify("rare"), TokenClass::InLanguage);
        assert_eq!(classifier.classify("absent"), TokenClass::InLanguage);
    }

    #[test]
    fn frequency_table_loads_tsv_with_comments() {
        let data = "# word\tfreq\nthe\t0.05\nLaugh\t2e-5\n";
        let classifier = FrequencyClassifier::from_reader(data.as_bytes(), b'\t', 1e-9).unwrap();
        assert_eq!(classifier.frequency("laugh"), 2e-5);
        assert_eq!(classifier.frequency("the"), 0.05);
    }

    #[test]
    fn frequency_table_rejects_bad_numbers() {
        let err = FrequencyClassifier::from_reader("the,lots\n".as_bytes(), b',', 1e-9).unwrap_err();
        assert!(matches!(err, TextnormError::InvalidConfig(_)));
    }

    #[test]
    fn missing_frequency_table_is_a_config_error() {
        let err = FrequencyClassifier::from_path(Path::new("no/such/table.tsv"), 1e-9).unwrap_err();
        assert!(matches!(err, TextnormError::MissingConfig { .. }));
    }

    #[test]
    fn detector_skips_non_ascii_tokens() {
        // "to" is frequent English, but with a tone mark it is orthography
        let detector = ForeignWordDetector::new(table(&[("to", 0.02)]));
        assert!(detector.is_foreign("to"));
        assert!(!detector.is_foreign("to\u{0301}"));
        assert!(!detector.is_foreign("ŋa"));
    }

    #[test]
    fn detector_ignores_single_characters() {
        let detector = ForeignWordDetector::new(table(&[("a", 0.03), ("i", 0.01)]));
        assert!(!detector.is_foreign("a"));
        assert!(!detector.is_foreign("i"));
    }

    #[test]
    fn detector_strips_edge_punctuation_before_lookup() {
        let detector = ForeignWordDetector::new(table(&[("word", 1e-4)]));
        assert!(detector.is_foreign("(word)"));
        assert!(!detector.is_foreign("()"));
    }

    #[test]
    fn denylist_overrides_classifier() {
        let detector = ForeignWordDetector::new(table(&[])).with_denylist(["sg"]);
        assert!(detector.is_foreign("downstep"));
        assert!(detector.is_foreign("sg"));
        assert!(!detector.is_foreign("kwa"));
    }

    #[test]
    fn boxed_classifiers_are_interchangeable() {
        let boxed: Box<dyn LanguageClassifier> = Box::new(table(&[("hello", 1e-5)]));
        let detector = ForeignWordDetector::new(boxed);
        assert!(detector.is_foreign("hello"));
    }

    #[test]
    fn whatlang_flags_english_text() {
        let classifier = WhatlangClassifier::from_code("eng", 0.0).unwrap();
        let sentence = "the quick brown fox jumps over the lazy dog while the children are watching";
        assert_eq!(classifier.classify(sentence), TokenClass::Foreign);
        assert_eq!(classifier.classify("привет как дела"), TokenClass::InLanguage);
    }

    #[test]
    fn whatlang_rejects_unknown_codes() {
        assert!(WhatlangClassifier::from_code("zzz", 0.5).is_err());
    }
}
