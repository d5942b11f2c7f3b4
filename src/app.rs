//! End-to-end runs: load configuration and the raw table, drive the
//! pipeline, write every artifact.
//!
//! All configuration is loaded before the first stage runs, so a missing or
//! malformed file aborts the run without touching the output directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::charset::CharInventory;
use crate::config::{self, EnvPaths};
use crate::corpus::{Corpus, RawTable};
use crate::dictionary::DictionaryClassifier;
use crate::error::{TextnormError, TextnormResult};
use crate::filters::VocabularyPartition;
use crate::language::{
    ForeignWordDetector, FrequencyClassifier, LanguageClassifier, WhatlangClassifier,
};
use crate::pipeline::{Pipeline, PipelineOptions, PreprocessingLog};
use crate::substitution::ReplacementMap;
use crate::summary::{self, CorpusStats, MorphStats};

pub const TRANSCRIPTIONS_FILE: &str = "transcriptions.csv";
pub const README_FILE: &str = "README.md";
pub const ENGLISH_WORDS_FILE: &str = "english_words.txt";
pub const TIRA_WORDS_FILE: &str = "tira_words.txt";
pub const SENTENCES_FILE: &str = "sentences.txt";

/// Which backend answers "is this token English?".
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierSettings {
    Frequency { table: PathBuf, threshold: f64 },
    Dictionary { dir: PathBuf, names: Vec<String> },
    Whatlang { lang: String, min_confidence: f64 },
}

impl ClassifierSettings {
    pub fn build(&self) -> TextnormResult<Box<dyn LanguageClassifier>> {
        Ok(match self {
            Self::Frequency { table, threshold } => {
                Box::new(FrequencyClassifier::from_path(table, *threshold)?)
            }
            Self::Dictionary { dir, names } => Box::new(DictionaryClassifier::load(dir, names)?),
            Self::Whatlang {
                lang,
                min_confidence,
            } => Box::new(WhatlangClassifier::from_code(lang, *min_confidence)?),
        })
    }
}

/// Everything a run needs, resolved from environment and command line.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub paths: EnvPaths,
    pub input: PathBuf,
    pub tier: String,
    pub options: PipelineOptions,
    pub classifier: ClassifierSettings,
    pub replacements: PathBuf,
    pub inventory: PathBuf,
    pub morphology: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub out_dir: PathBuf,
    pub rows: usize,
    pub log: PreprocessingLog,
}

/// Load the raw table, keep one tier and drop rows with missing values.
pub fn load_corpus(path: &Path, tier: &str, log: &mut PreprocessingLog) -> TextnormResult<Corpus> {
    let table = RawTable::from_path(path)?;
    let total = table.len();
    let table = table.select_tier(tier);
    tracing::info!(total, kept = table.len(), tier, "dropped non-transcription annotations");
    let corpus = table.into_corpus();
    log.push(format!("- {} non-NaN transcriptions in dataset", corpus.len()));
    Ok(corpus)
}

/// Write both vocabulary classes, sorted and newline separated.
pub fn write_wordlists(out_dir: &Path, vocabulary: &VocabularyPartition) -> TextnormResult<()> {
    write_lines(&out_dir.join(ENGLISH_WORDS_FILE), &vocabulary.foreign)?;
    write_lines(&out_dir.join(TIRA_WORDS_FILE), &vocabulary.in_language)?;
    Ok(())
}

fn write_lines(path: &Path, lines: &BTreeSet<String>) -> TextnormResult<()> {
    let body: Vec<&str> = lines.iter().map(String::as_str).collect();
    fs::write(path, body.join("\n"))?;
    Ok(())
}

/// Full pipeline run.
pub fn run(settings: &RunSettings) -> TextnormResult<RunOutcome> {
    settings.paths.validate()?;
    let out_dir = settings.paths.require_clips_dir()?.to_path_buf();
    let keep = settings.options.keep_punct.as_deref();

    let replacements = config::load_replacement_map(&settings.replacements)?;
    let inventory = CharInventory::from_path(&settings.inventory)?.with_punctuation(keep);
    let detector = ForeignWordDetector::new(settings.classifier.build()?);
    if let Some(path) = &settings.morphology {
        if !path.exists() {
            return Err(TextnormError::MissingConfig {
                what: "morphological analysis table",
                path: path.clone(),
            });
        }
    }

    let mut log = PreprocessingLog::new();
    let corpus = load_corpus(&settings.input, &settings.tier, &mut log)?;

    let pipeline = Pipeline::new(settings.options.clone(), &detector, &replacements, &inventory);
    let normalized = pipeline.normalize(corpus, &mut log);

    // diagnostics for manual review, kept even if validation fails below
    write_wordlists(&out_dir, &normalized.vocabulary)?;
    log.push(format!(
        "- saved all detected English words to {ENGLISH_WORDS_FILE} and Tira words to {TIRA_WORDS_FILE}"
    ));

    pipeline.validate(&normalized.corpus, &mut log)?;

    let sentences = summary::unique_sentences(&normalized.corpus);
    let stats = CorpusStats::from_sentences(&sentences);
    let morph = settings
        .morphology
        .as_deref()
        .map(|path| MorphStats::from_path(path, &sentences))
        .transpose()?;

    normalized
        .corpus
        .write_csv_path(&out_dir.join(TRANSCRIPTIONS_FILE))?;
    fs::write(
        out_dir.join(README_FILE),
        summary::render_summary(&stats, morph.as_ref(), &log),
    )?;
    if let Some(dataset_dir) = &settings.paths.dataset_dir {
        fs::create_dir_all(dataset_dir)?;
        write_lines(&dataset_dir.join(SENTENCES_FILE), &sentences)?;
    }

    tracing::info!(
        rows = normalized.corpus.len(),
        sentences = stats.num_sentences,
        out_dir = %out_dir.display(),
        "dataset written"
    );
    Ok(RunOutcome {
        out_dir,
        rows: normalized.corpus.len(),
        log,
    })
}

/// Collect the characters left after tone-word stripping and merge identity
/// entries for them into the replacement map at `output`.
///
/// Returns the number of distinct characters found.
pub fn scaffold_replacements(
    input: &Path,
    tier: &str,
    options: &PipelineOptions,
    classifier: &ClassifierSettings,
    output: &Path,
) -> TextnormResult<usize> {
    let detector = ForeignWordDetector::new(classifier.build()?);
    let existing = if output.exists() {
        config::load_replacement_entries(output)?
    } else {
        Default::default()
    };

    let mut log = PreprocessingLog::new();
    let corpus = load_corpus(input, tier, &mut log)?;
    let replacements = ReplacementMap::default();
    let inventory = CharInventory::default();
    let pipeline = Pipeline::new(options.clone(), &detector, &replacements, &inventory);
    let normalized = pipeline.normalize(corpus, &mut log);

    let chars: BTreeSet<char> = normalized.corpus.texts().flat_map(str::chars).collect();
    let entries = config::scaffold_entries(&chars, existing);
    config::write_replacement_entries(output, &entries)?;
    tracing::info!(
        chars = chars.len(),
        entries = entries.len(),
        path = %output.display(),
        "wrote replacement map scaffold"
    );
    Ok(chars.len())
}
