//! Environment paths and JSON configuration files.
//!
//! Paths are read once at startup. Missing input files or directories are
//! fatal before any stage runs.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{TextnormError, TextnormResult};
use crate::substitution::{ReplacementEntries, ReplacementEntry, ReplacementMap};
use crate::text::unicode_point;

/// Directory of source `.wav` elicitation recordings.
pub const ENV_RECORDINGS_DIR: &str = "TIRA_ELICITATION_WAVS";
/// Directory receiving clips, transcriptions and reports.
pub const ENV_CLIPS_DIR: &str = "TIRA_ASR_CLIPS";
/// Directory of the derived (pyarrow) dataset.
pub const ENV_DATASET_DIR: &str = "TIRA_ASR_PYARROW";
/// Directory holding the scraped annotation list.
pub const ENV_DATA_DIR: &str = "TIRA_MORPH_DATA_DIR";

pub const RAW_LIST_FILE: &str = "tira_elan_raw.csv";
pub const REPLACEMENTS_FILE: &str = "char_replacements.json";
pub const DEFAULT_INVENTORY_PATH: &str = "meta/tira_asr_unique_chars.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPaths {
    pub recordings_dir: Option<PathBuf>,
    pub clips_dir: Option<PathBuf>,
    pub dataset_dir: Option<PathBuf>,
    pub data_dir: PathBuf,
}

impl EnvPaths {
    /// Read paths from the process environment, after loading `.env`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            recordings_dir: path(ENV_RECORDINGS_DIR),
            clips_dir: path(ENV_CLIPS_DIR),
            dataset_dir: path(ENV_DATASET_DIR),
            data_dir: path(ENV_DATA_DIR).unwrap_or_else(|| PathBuf::from("data")),
        }
    }

    pub fn raw_list_path(&self) -> PathBuf {
        self.data_dir.join(RAW_LIST_FILE)
    }

    /// Output directory, required for a pipeline run.
    pub fn require_clips_dir(&self) -> TextnormResult<&Path> {
        self.clips_dir.as_deref().ok_or_else(|| {
            TextnormError::InvalidConfig(format!(
                "set {ENV_CLIPS_DIR} or pass --out-dir to choose an output directory"
            ))
        })
    }

    /// Check that configured input directories exist.
    pub fn validate(&self) -> TextnormResult<()> {
        if let Some(dir) = &self.recordings_dir {
            if !dir.is_dir() {
                return Err(TextnormError::MissingConfig {
                    what: "recordings directory",
                    path: dir.clone(),
                });
            }
        }
        if let Some(dir) = &self.clips_dir {
            if !dir.is_dir() {
                return Err(TextnormError::MissingConfig {
                    what: "clips directory",
                    path: dir.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Load the replacement-map configuration with its audit metadata.
pub fn load_replacement_entries(path: &Path) -> TextnormResult<ReplacementEntries> {
    if !path.exists() {
        return Err(TextnormError::MissingConfig {
            what: "character replacement map",
            path: path.to_path_buf(),
        });
    }
    let entries: ReplacementEntries = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(entries)
}

pub fn load_replacement_map(path: &Path) -> TextnormResult<ReplacementMap> {
    let entries = load_replacement_entries(path)?;
    let map = ReplacementMap::from_entries(&entries)?;
    tracing::info!(
        path = %path.display(),
        entries = entries.len(),
        active = map.len(),
        "loaded character replacement map"
    );
    Ok(map)
}

/// Shown when a character has no name in the Unicode database.
pub const NO_UNICODE_NAME: &str = "No unicode name found";

/// Unicode name of `c`, for auditing replacement entries by hand.
pub fn unicode_name(c: char) -> String {
    unicode_names2::name(c)
        .map(|name| name.to_string())
        .unwrap_or_else(|| NO_UNICODE_NAME.to_string())
}

/// Identity entries for every character, appended after the entries already
/// present, which are kept as they are.
pub fn scaffold_entries(
    chars: &BTreeSet<char>,
    mut existing: ReplacementEntries,
) -> ReplacementEntries {
    for c in chars {
        let key = c.to_string();
        if existing.contains_key(&key) {
            continue;
        }
        let entry = ReplacementEntry {
            target: key.clone(),
            comment: String::new(),
            unicode_name: Some(unicode_name(*c)),
            unicode_point: Some(unicode_point(*c)),
        };
        existing.insert(key, entry);
    }
    existing
}

/// Write a replacement map as ASCII-escaped, indented JSON.
pub fn write_replacement_entries(
    path: &Path,
    entries: &ReplacementEntries,
) -> TextnormResult<()> {
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, escape_non_ascii(&json))?;
    Ok(())
}

/// Escape non-ASCII characters as `\uXXXX` (surrogate pairs above the BMP),
/// so combining marks stay visible when the file is edited by hand.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}
