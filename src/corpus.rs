//! Corpus records and tabular I/O.
//!
//! The raw table comes from the ELAN scraper: one row per annotation with
//! `audio_basename, start, end, duration, text, eaf_basename, tier`. Time
//! offsets are milliseconds.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TextnormError, TextnormResult};

/// Tier holding the phonetic transcription.
pub const DEFAULT_TIER: &str = "IPA Transcription";

/// Name of the column the pipeline normalizes.
pub const TEXT_COLUMN: &str = "text";

/// A raw scraper row; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    #[serde(alias = "audio_basename")]
    pub audio_reference: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub duration: Option<f64>,
    pub text: Option<String>,
    #[serde(alias = "eaf_basename")]
    pub source_file: Option<String>,
    pub tier: Option<String>,
}

/// One annotated span after tier selection and missing-value removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    /// Row position in the raw table.
    pub index: usize,
    pub audio_reference: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub text: String,
    pub source_file: String,
}

/// Raw rows as loaded, tagged with their original position.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<(usize, RawRow)>,
}

impl RawTable {
    pub fn from_reader<R: Read>(reader: R) -> TextnormResult<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let has = |names: &[&str]| headers.iter().any(|h| names.contains(&h));
        if !has(&["tier"]) {
            return Err(TextnormError::MissingColumn("tier"));
        }
        if !has(&[TEXT_COLUMN]) {
            return Err(TextnormError::MissingColumn(TEXT_COLUMN));
        }

        let mut rows = Vec::new();
        for (index, row) in rdr.deserialize::<RawRow>().enumerate() {
            rows.push((index, row?));
        }
        Ok(Self { rows })
    }

    pub fn from_path(path: &Path) -> TextnormResult<Self> {
        if !path.exists() {
            return Err(TextnormError::MissingConfig {
                what: "raw annotation table",
                path: path.to_path_buf(),
            });
        }
        let table = Self::from_reader(File::open(path)?)?;
        tracing::info!(path = %path.display(), rows = table.len(), "loaded raw annotations");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only rows annotated on `tier`.
    pub fn select_tier(self, tier: &str) -> Self {
        let rows = self
            .rows
            .into_iter()
            .filter(|(_, row)| row.tier.as_deref() == Some(tier))
            .collect();
        Self { rows }
    }

    /// Drop rows with missing fields and build records, discarding the tier.
    ///
    /// `duration` is derived from `end - start` when absent. Rows whose
    /// duration would be negative are dropped as invalid.
    pub fn into_corpus(self) -> Corpus {
        let mut records = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows {
            match row.into_record(index) {
                Some(record) => records.push(record),
                None => tracing::debug!(index, "dropping row with missing or invalid fields"),
            }
        }
        Corpus { records }
    }
}

impl RawRow {
    fn into_record(self, index: usize) -> Option<CorpusRecord> {
        let text = self.text.filter(|t| !t.is_empty())?;
        let (start, end) = (self.start?, self.end?);
        let duration = self.duration.unwrap_or(end - start);
        if duration < 0.0 || duration.is_nan() {
            tracing::warn!(index, start, end, "negative duration, dropping row");
            return None;
        }
        Some(CorpusRecord {
            index,
            audio_reference: self.audio_reference?,
            start,
            end,
            duration,
            text,
            source_file: self.source_file?,
        })
    }
}

/// The ordered collection every stage consumes and returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub records: Vec<CorpusRecord>,
}

impl Corpus {
    pub fn new(records: Vec<CorpusRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.text.as_str())
    }

    /// Sum of `duration` over all records, in milliseconds.
    pub fn total_duration(&self) -> f64 {
        self.records.iter().map(|r| r.duration).sum()
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&CorpusRecord) -> bool,
    {
        self.records.retain(keep);
    }

    pub fn map_text<F>(&mut self, mut f: F)
    where
        F: FnMut(&str) -> String,
    {
        for record in &mut self.records {
            record.text = f(&record.text);
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> TextnormResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path) -> TextnormResult<()> {
        self.write_csv(File::create(path)?)?;
        tracing::info!(path = %path.display(), rows = self.len(), "wrote transcriptions");
        Ok(())
    }
}

/// Format a millisecond total as `H:MM:SS`.
pub fn format_duration(millis: f64) -> String {
    let total_secs = (millis / 1000.0).round() as u64;
    let (hours, rem) = (total_secs / 3600, total_secs % 3600);
    format!("{hours}:{:02}:{:02}", rem / 60, rem % 60)
}
