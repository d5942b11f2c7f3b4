use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

pub type TextnormResult<T> = Result<T, TextnormError>;

#[derive(Debug, Error)]
pub enum TextnormError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("json failure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing {what} at `{path}`")]
    MissingConfig { what: &'static str, path: PathBuf },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("input table has no `{0}` column")]
    MissingColumn(&'static str),

    #[error(
        "found unexpected chars after normalizing IPA: {} (inspect `{column}` column, rows {})",
        format_chars(.chars),
        format_rows(.rows)
    )]
    UnexpectedCharacters {
        chars: BTreeSet<char>,
        rows: Vec<usize>,
        column: &'static str,
    },

    #[error("language classifier unavailable: {0}")]
    Classifier(String),
}

impl TextnormError {
    /// Stable machine-readable code for every variant.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "TN-IO",
            Self::Json(_) => "TN-JSON",
            Self::Csv(_) => "TN-CSV",
            Self::MissingConfig { .. } => "TN-CONFIG-MISSING",
            Self::InvalidConfig(_) => "TN-CONFIG-INVALID",
            Self::MissingColumn(_) => "TN-COLUMN-MISSING",
            Self::UnexpectedCharacters { .. } => "TN-UNEXPECTED-CHARS",
            Self::Classifier(_) => "TN-CLASSIFIER",
        }
    }

    /// Process exit status: validation failures are distinguished from
    /// configuration and I/O failures.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnexpectedCharacters { .. } => 2,
            _ => 1,
        }
    }
}

fn format_chars(chars: &BTreeSet<char>) -> String {
    chars
        .iter()
        .map(|c| format!("{c:?} (U+{:04X})", *c as u32))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
