//! Text normalization pipeline.
//!
//! Seven stages run in a fixed order over the whole corpus. Each stage
//! commits before the next starts and appends one entry to the
//! [`PreprocessingLog`]:
//!
//! 1. drop ungrammatical rows (`*`)
//! 2. Unicode normalization, lowercasing, punctuation removal
//! 3. drop rows without tone diacritics
//! 4. drop rows with foreign words, partitioning the vocabulary
//! 5. strip tone words (`HLL`, `lhl`, ...)
//! 6. rewrite the character set through the replacement map
//! 7. validate against the expected character inventory
//!
//! Stages 1–6 live in [`Pipeline::normalize`]; stage 7 is
//! [`Pipeline::validate`] so that callers can persist diagnostics (the
//! vocabulary word lists) before the gate decides the run's fate.

use std::fmt;

use crate::charset::CharInventory;
use crate::corpus::{Corpus, format_duration};
use crate::error::TextnormResult;
use crate::filters::{self, ToneWords, VocabularyPartition};
use crate::language::{ForeignWordDetector, LanguageClassifier};
use crate::substitution::ReplacementMap;
use crate::text::NormalizationForm;

/// Default cap on replacement-map passes per record.
pub const DEFAULT_MAX_SUBSTITUTION_PASSES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Ungrammatical,
    StringNormalization,
    ToneMarking,
    ForeignWords,
    ToneWords,
    CharsetNormalization,
    CharsetValidation,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Ungrammatical,
        Stage::StringNormalization,
        Stage::ToneMarking,
        Stage::ForeignWords,
        Stage::ToneWords,
        Stage::CharsetNormalization,
        Stage::CharsetValidation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ungrammatical => "ungrammatical",
            Self::StringNormalization => "string_normalization",
            Self::ToneMarking => "tone_marking",
            Self::ForeignWords => "foreign_words",
            Self::ToneWords => "tone_words",
            Self::CharsetNormalization => "charset_normalization",
            Self::CharsetValidation => "charset_validation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only, human-readable record of what each step did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessingLog {
    entries: Vec<String>,
}

impl PreprocessingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        tracing::info!("{entry}");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for PreprocessingLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entries.join("\n"))
    }
}

/// Row counts around one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub rows_in: usize,
    pub rows_out: usize,
    /// Rows whose text changed (rewrite stages) or rows removed (filters).
    pub affected: usize,
}

impl StageReport {
    pub fn removed(&self) -> usize {
        self.rows_in - self.rows_out
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub form: NormalizationForm,
    pub keep_punct: Option<String>,
    pub tone_words: ToneWords,
    pub max_substitution_passes: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            form: NormalizationForm::default(),
            keep_punct: None,
            tone_words: ToneWords::default(),
            max_substitution_passes: DEFAULT_MAX_SUBSTITUTION_PASSES,
        }
    }
}

/// Output of stages 1–6.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub corpus: Corpus,
    pub vocabulary: VocabularyPartition,
    pub reports: Vec<StageReport>,
}

pub struct Pipeline<'a, C> {
    options: PipelineOptions,
    detector: &'a ForeignWordDetector<C>,
    replacements: &'a ReplacementMap,
    inventory: &'a CharInventory,
}

impl<'a, C: LanguageClassifier> Pipeline<'a, C> {
    pub fn new(
        options: PipelineOptions,
        detector: &'a ForeignWordDetector<C>,
        replacements: &'a ReplacementMap,
        inventory: &'a CharInventory,
    ) -> Self {
        Self {
            options,
            detector,
            replacements,
            inventory,
        }
    }

    /// Run stages 1–6.
    pub fn normalize(&self, mut corpus: Corpus, log: &mut PreprocessingLog) -> Normalized {
        let mut reports = Vec::with_capacity(Stage::ALL.len());

        let rows_in = corpus.len();
        let removed = filters::drop_ungrammatical(&mut corpus);
        log.push(format!("- removed {removed} ungrammatical rows"));
        reports.push(report(Stage::Ungrammatical, rows_in, &corpus, removed));

        let rows_in = corpus.len();
        let keep = self.options.keep_punct.as_deref();
        filters::normalize_strings(&mut corpus, self.options.form, keep);
        log.push(format!(
            "- applied {} unicode normalization to text, set to lowercase and removed punctuation{}",
            self.options.form,
            keep.map(|k| format!(" (kept `{k}`)")).unwrap_or_default()
        ));
        reports.push(report(Stage::StringNormalization, rows_in, &corpus, rows_in));

        let rows_in = corpus.len();
        let removed = filters::drop_toneless(&mut corpus);
        log.push(format!(
            "- removed {removed} rows with no tone marked, {} rows remaining, {}",
            corpus.len(),
            format_duration(corpus.total_duration())
        ));
        reports.push(report(Stage::ToneMarking, rows_in, &corpus, removed));

        let rows_in = corpus.len();
        let (removed, vocabulary) = filters::drop_foreign(&mut corpus, self.detector);
        log.push(format!(
            "- removed {removed} rows with English words, {} rows remaining, {}",
            corpus.len(),
            format_duration(corpus.total_duration())
        ));
        tracing::info!(
            stage = %Stage::ForeignWords,
            foreign = vocabulary.foreign.len(),
            in_language = vocabulary.in_language.len(),
            "partitioned vocabulary"
        );
        reports.push(report(Stage::ForeignWords, rows_in, &corpus, removed));

        let rows_in = corpus.len();
        let affected = filters::remove_tone_words(&mut corpus, &self.options.tone_words);
        log.push(format!(
            "- removed tone words (e.g. HLL, LHL, LLHH) from transcription, {affected} rows affected"
        ));
        reports.push(report(Stage::ToneWords, rows_in, &corpus, affected));

        let rows_in = corpus.len();
        let changed = self.normalize_charset(&mut corpus);
        log.push(format!(
            "- normalized IPA character set with {} replacement rules, {changed} rows changed",
            self.replacements.len()
        ));
        reports.push(report(Stage::CharsetNormalization, rows_in, &corpus, changed));

        Normalized {
            corpus,
            vocabulary,
            reports,
        }
    }

    fn normalize_charset(&self, corpus: &mut Corpus) -> usize {
        let max_passes = self.options.max_substitution_passes;
        let mut changed = 0;
        let mut unstable = 0;
        for record in &mut corpus.records {
            let result = self.replacements.apply_until_stable(&record.text, max_passes);
            if !result.stable {
                unstable += 1;
                tracing::warn!(
                    index = record.index,
                    passes = result.passes,
                    text = %record.text,
                    "replacement map did not stabilize"
                );
            }
            if result.text != record.text {
                changed += 1;
                record.text = result.text;
            }
        }
        if unstable > 0 {
            tracing::warn!(
                unstable,
                max_passes,
                "replacement map looks cyclic for some records; check char_replacements"
            );
        }
        changed
    }

    /// Stage 7: fail on any character outside the inventory.
    pub fn validate(&self, corpus: &Corpus, log: &mut PreprocessingLog) -> TextnormResult<()> {
        self.inventory.check(corpus)?;
        log.push(
            "- checked that only expected IPA chars are found in dataset, \
             as defined by the expected character inventory",
        );
        Ok(())
    }

    /// All seven stages.
    pub fn run(&self, corpus: Corpus, log: &mut PreprocessingLog) -> TextnormResult<Normalized> {
        let mut normalized = self.normalize(corpus, log);
        let rows = normalized.corpus.len();
        self.validate(&normalized.corpus, log)?;
        normalized.reports.push(StageReport {
            stage: Stage::CharsetValidation,
            rows_in: rows,
            rows_out: rows,
            affected: 0,
        });
        Ok(normalized)
    }
}

fn report(stage: Stage, rows_in: usize, corpus: &Corpus, affected: usize) -> StageReport {
    tracing::info!(%stage, rows_in, remaining = corpus.len(), affected, "stage finished");
    StageReport {
        stage,
        rows_in,
        rows_out: corpus.len(),
        affected,
    }
}
