//! Dataset summary document (`README.md`).

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::corpus::Corpus;
use crate::error::{TextnormError, TextnormResult};
use crate::pipeline::PreprocessingLog;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Separates morphemes inside an analysed word.
pub const MORPHEME_SEPARATOR: char = '-';

/// Counts over the unique sentences of the output corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    pub num_sentences: usize,
    pub num_words: usize,
    pub num_unique_words: usize,
    pub mean_sentence_len: f64,
}

impl CorpusStats {
    pub fn from_sentences(sentences: &BTreeSet<String>) -> Self {
        let mut num_words = 0;
        let mut unique = HashSet::new();
        for sentence in sentences {
            for word in sentence.split_whitespace() {
                num_words += 1;
                unique.insert(word);
            }
        }
        let mean_sentence_len = if sentences.is_empty() {
            0.0
        } else {
            num_words as f64 / sentences.len() as f64
        };
        Self {
            num_sentences: sentences.len(),
            num_words,
            num_unique_words: unique.len(),
            mean_sentence_len,
        }
    }
}

/// Distinct non-empty texts of the corpus.
pub fn unique_sentences(corpus: &Corpus) -> BTreeSet<String> {
    corpus
        .texts()
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
struct AnalysisRow {
    text: String,
    morphs: String,
}

/// Coverage of a morphological analysis table over the output sentences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MorphStats {
    pub num_analyses: usize,
    pub num_words_analyzed: usize,
    pub num_morphs: usize,
}

impl MorphStats {
    /// Read a `text,morphs` table; `morphs` holds space-separated words with
    /// morphemes joined by `-`. Only rows whose text is one of `sentences`
    /// are counted.
    pub fn from_reader<R: Read>(reader: R, sentences: &BTreeSet<String>) -> TextnormResult<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut analysed = BTreeSet::new();
        let mut words = HashSet::new();
        let mut morphs = HashSet::new();
        for row in rdr.deserialize::<AnalysisRow>() {
            let row = row?;
            if !sentences.contains(&row.text) {
                continue;
            }
            for word in row.morphs.split_whitespace() {
                words.insert(word.replace(MORPHEME_SEPARATOR, ""));
                morphs.extend(
                    word.split(MORPHEME_SEPARATOR)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string),
                );
            }
            analysed.insert(row.text);
        }
        Ok(Self {
            num_analyses: analysed.len(),
            num_words_analyzed: words.len(),
            num_morphs: morphs.len(),
        })
    }

    pub fn from_path(path: &Path, sentences: &BTreeSet<String>) -> TextnormResult<Self> {
        if !path.exists() {
            return Err(TextnormError::MissingConfig {
                what: "morphological analysis table",
                path: path.to_path_buf(),
            });
        }
        Self::from_reader(File::open(path)?, sentences)
    }
}

/// Templated header followed by the full preprocessing log.
pub fn render_summary(
    stats: &CorpusStats,
    morph: Option<&MorphStats>,
    log: &PreprocessingLog,
) -> String {
    let mut out = format!(
        "\n# tira_asr\n\
         Dataset of Tira transcriptions (v{VERSION}) for training ASR and morphological \
         segmentation. Contains {} unique sentences for a total of {} words \
         ({} unique words) averaging {:.2} words per sentence.",
        stats.num_sentences, stats.num_words, stats.num_unique_words, stats.mean_sentence_len,
    );
    if let Some(morph) = morph {
        out.push_str(&format!(
            " Of these, {} sentences have morphological decompositions, for {} unique \
             analyzed words and {} unique morphemes.",
            morph.num_analyses, morph.num_words_analyzed, morph.num_morphs,
        ));
    }
    out.push_str("\n\n## Preprocessing\n");
    out.push_str(&log.to_string());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(texts: &[&str]) -> BTreeSet<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn stats_count_unique_sentences() {
        let s = sentences(&["ká lò", "ká", "ká lò"]);
        let stats = CorpusStats::from_sentences(&s);
        assert_eq!(stats.num_sentences, 2);
        assert_eq!(stats.num_words, 3);
        assert_eq!(stats.num_unique_words, 2);
        assert!((stats.mean_sentence_len - 1.5).abs() < 1e-9);
    }

    #[test]
    fn empty_corpus_has_zero_mean() {
        let stats = CorpusStats::from_sentences(&BTreeSet::new());
        assert_eq!(stats.num_sentences, 0);
        assert_eq!(stats.mean_sentence_len, 0.0);
    }

    #[test]
    fn morph_stats_only_count_known_sentences() {
        let table = "text,morphs\nká lò,k-á l-ò\nká,k-á\nzzz,z-z\n";
        let s = sentences(&["ká lò", "ká"]);
        let morph = MorphStats::from_reader(table.as_bytes(), &s).unwrap();
        assert_eq!(morph.num_analyses, 2);
        assert_eq!(morph.num_words_analyzed, 2);
        assert_eq!(morph.num_morphs, 4);
    }

    #[test]
    fn summary_contains_header_and_log() {
        let stats = CorpusStats::from_sentences(&sentences(&["ká lò"]));
        let mut log = PreprocessingLog::new();
        log.push("- removed 1 ungrammatical rows");
        log.push("- removed 0 rows with no tone marked");

        let plain = render_summary(&stats, None, &log);
        assert!(plain.contains("Contains 1 unique sentences for a total of 2 words"));
        assert!(!plain.contains("morphological decompositions"));
        assert!(plain.ends_with("- removed 1 ungrammatical rows\n- removed 0 rows with no tone marked\n"));

        let morph = MorphStats {
            num_analyses: 1,
            num_words_analyzed: 2,
            num_morphs: 3,
        };
        let with_morph = render_summary(&stats, Some(&morph), &log);
        assert!(with_morph.contains("1 sentences have morphological decompositions"));
    }
}
