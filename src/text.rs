//! Unicode and string helpers shared by every pipeline stage.
//!
//! Normalization defaults to NFKD so that tone diacritics always surface as
//! separate combining marks, which is what the diacritic predicates and the
//! replacement map expect.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Unicode normalization form applied to transcriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NormalizationForm {
    Nfc,
    Nfd,
    Nfkc,
    #[default]
    Nfkd,
}

impl NormalizationForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nfc => "NFC",
            Self::Nfd => "NFD",
            Self::Nfkc => "NFKC",
            Self::Nfkd => "NFKD",
        }
    }
}

impl fmt::Display for NormalizationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NFC" => Ok(Self::Nfc),
            "NFD" => Ok(Self::Nfd),
            "NFKC" => Ok(Self::Nfkc),
            "NFKD" => Ok(Self::Nfkd),
            other => Err(format!("unknown normalization form `{other}`")),
        }
    }
}

/// Combining marks used in the orthography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diacritic {
    Grave,
    Macron,
    Acute,
    Circumflex,
    Caron,
    Tilde,
    Bridge,
}

impl Diacritic {
    /// Whether the mark encodes pitch tone.
    pub fn is_tone(&self) -> bool {
        matches!(
            self,
            Self::Grave | Self::Macron | Self::Acute | Self::Circumflex | Self::Caron
        )
    }
}

pub const COMBINING: [(Diacritic, char); 7] = [
    (Diacritic::Grave, '\u{0300}'),
    (Diacritic::Macron, '\u{0304}'),
    (Diacritic::Acute, '\u{0301}'),
    (Diacritic::Circumflex, '\u{0302}'),
    (Diacritic::Caron, '\u{030C}'),
    (Diacritic::Tilde, '\u{0303}'),
    (Diacritic::Bridge, '\u{032A}'),
];

/// Normalize `text` to the requested form.
pub fn unicode_normalize(text: &str, form: NormalizationForm) -> String {
    match form {
        NormalizationForm::Nfc => text.nfc().collect(),
        NormalizationForm::Nfd => text.nfd().collect(),
        NormalizationForm::Nfkc => text.nfkc().collect(),
        NormalizationForm::Nfkd => text.nfkd().collect(),
    }
}

/// Remove every ASCII punctuation character except those listed in `keep`.
pub fn remove_punct(text: &str, keep: Option<&str>) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation() || keep.is_some_and(|k| k.contains(*c)))
        .collect()
}

/// Trim ASCII punctuation from both ends of a token.
pub fn strip_punct(token: &str) -> &str {
    token.trim_matches(|c: char| c.is_ascii_punctuation())
}

pub fn lowercase(text: &str) -> String {
    text.to_lowercase()
}

/// Detect combining marks from [`COMBINING`] in `text`.
///
/// The input is re-normalized to NFKD first, so precomposed characters such
/// as `ó` are seen as `o` + U+0301 regardless of how the caller stored them.
/// With `tone_only` the check is restricted to tone diacritics.
pub fn has_diac(text: &str, tone_only: bool) -> bool {
    let decomposed = unicode_normalize(text, NormalizationForm::Nfkd);
    COMBINING
        .iter()
        .filter(|(name, _)| !tone_only || name.is_tone())
        .any(|(_, mark)| decomposed.contains(*mark))
}

pub fn has_tone_diacritic(text: &str) -> bool {
    has_diac(text, true)
}

/// Codepoint rendered the way the replacement map records it, e.g. `0x301`.
pub fn unicode_point(c: char) -> String {
    format!("{:#x}", c as u32)
}
