use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::{ClassifierSettings, RunSettings};
use crate::config::{self, EnvPaths};
use crate::corpus::DEFAULT_TIER;
use crate::error::{TextnormError, TextnormResult};
use crate::filters::{DEFAULT_TONE_SYMBOLS, ToneWords};
use crate::language::DEFAULT_FREQUENCY_THRESHOLD;
use crate::pipeline::{DEFAULT_MAX_SUBSTITUTION_PASSES, PipelineOptions};
use crate::text::NormalizationForm;

#[derive(Debug, Parser)]
#[command(name = "tira-textnorm")]
#[command(about = "Normalize and filter Tira transcriptions into an ASR/morphology dataset")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full normalization pipeline and write the dataset.
    Run(RunArgs),
    /// Write identity replacement entries for every character in the corpus.
    #[command(name = "scaffold-replacements")]
    ScaffoldReplacements(ScaffoldArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassifierKind {
    /// Word frequency table lookup.
    Frequency,
    /// Hunspell dictionaries.
    Dictionary,
    /// Statistical language identification.
    Whatlang,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct CorpusArgs {
    /// Raw annotation table; defaults to $TIRA_MORPH_DATA_DIR/tira_elan_raw.csv.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output directory; overrides $TIRA_ASR_CLIPS.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Annotation tier holding the transcriptions.
    #[arg(long, default_value = DEFAULT_TIER)]
    pub tier: String,

    /// Punctuation characters to keep (and allow in the output).
    #[arg(long)]
    pub keep_punct: Option<String>,

    /// Unicode normalization form.
    #[arg(long, default_value_t = NormalizationForm::Nfkd)]
    pub form: NormalizationForm,

    /// Letters that make up tone words, e.g. `hml` for HLL, LHL.
    #[arg(long, default_value = DEFAULT_TONE_SYMBOLS)]
    pub tone_symbols: String,

    #[arg(long, value_enum, default_value_t = ClassifierKind::Frequency)]
    pub classifier: ClassifierKind,

    /// Word frequency table (`word<TAB>frequency`).
    #[arg(long, default_value = "meta/en_word_frequencies.tsv")]
    pub frequencies: PathBuf,

    /// Frequency above which a word counts as English.
    #[arg(long, default_value_t = DEFAULT_FREQUENCY_THRESHOLD)]
    pub threshold: f64,

    /// Directory of Hunspell dictionaries or `<name>_words.txt` lists.
    #[arg(long, default_value = "dictionaries")]
    pub dict_dir: PathBuf,

    /// Dictionaries to load from --dict-dir.
    #[arg(long, value_delimiter = ',', default_value = "en_US")]
    pub dictionaries: Vec<String>,

    /// ISO 639-3 code of the foreign language for the whatlang classifier.
    #[arg(long, default_value = "eng")]
    pub foreign_lang: String,

    /// Minimum whatlang confidence to call a token foreign.
    #[arg(long, default_value_t = 0.5)]
    pub min_confidence: f64,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Replacement map; defaults to <out-dir>/char_replacements.json.
    #[arg(long)]
    pub replacements: Option<PathBuf>,

    /// Expected character inventory (JSON array).
    #[arg(long, default_value = config::DEFAULT_INVENTORY_PATH)]
    pub inventory: PathBuf,

    /// Upper bound on replacement-map passes per record.
    #[arg(long, default_value_t = DEFAULT_MAX_SUBSTITUTION_PASSES)]
    pub max_passes: usize,

    /// Morphological analyses (`text,morphs`) to report coverage for.
    #[arg(long)]
    pub morphology: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ScaffoldArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Map to create or extend; defaults to <out-dir>/char_replacements.json.
    #[arg(long)]
    pub replacements: Option<PathBuf>,
}

impl CorpusArgs {
    /// Environment paths with command-line overrides applied.
    pub fn env_paths(&self) -> EnvPaths {
        let mut paths = EnvPaths::from_env();
        if let Some(out_dir) = &self.out_dir {
            paths.clips_dir = Some(out_dir.clone());
        }
        paths
    }

    pub fn input_path(&self, paths: &EnvPaths) -> PathBuf {
        self.input.clone().unwrap_or_else(|| paths.raw_list_path())
    }

    pub fn classifier_settings(&self) -> ClassifierSettings {
        match self.classifier {
            ClassifierKind::Frequency => ClassifierSettings::Frequency {
                table: self.frequencies.clone(),
                threshold: self.threshold,
            },
            ClassifierKind::Dictionary => ClassifierSettings::Dictionary {
                dir: self.dict_dir.clone(),
                names: self.dictionaries.clone(),
            },
            ClassifierKind::Whatlang => ClassifierSettings::Whatlang {
                lang: self.foreign_lang.clone(),
                min_confidence: self.min_confidence,
            },
        }
    }

    pub fn pipeline_options(&self, max_passes: usize) -> TextnormResult<PipelineOptions> {
        if self.tone_symbols.is_empty() {
            return Err(TextnormError::InvalidConfig(
                "--tone-symbols must not be empty".into(),
            ));
        }
        let tone_words = ToneWords::new(&self.tone_symbols)
            .map_err(|e| TextnormError::InvalidConfig(format!("bad tone symbols: {e}")))?;
        Ok(PipelineOptions {
            form: self.form,
            keep_punct: self.keep_punct.clone().filter(|k| !k.is_empty()),
            tone_words,
            max_substitution_passes: max_passes,
        })
    }
}

/// Default replacement-map location inside the output directory.
fn replacements_path(explicit: &Option<PathBuf>, paths: &EnvPaths) -> TextnormResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path.clone()),
        None => Ok(paths.require_clips_dir()?.join(config::REPLACEMENTS_FILE)),
    }
}

impl RunArgs {
    pub fn to_settings(&self) -> TextnormResult<RunSettings> {
        if self.max_passes < 2 {
            return Err(TextnormError::InvalidConfig(format!(
                "--max-passes must be at least 2, got {}",
                self.max_passes
            )));
        }
        let paths = self.corpus.env_paths();
        Ok(RunSettings {
            input: self.corpus.input_path(&paths),
            tier: self.corpus.tier.clone(),
            options: self.corpus.pipeline_options(self.max_passes)?,
            classifier: self.corpus.classifier_settings(),
            replacements: replacements_path(&self.replacements, &paths)?,
            inventory: self.inventory.clone(),
            morphology: self.morphology.clone(),
            paths,
        })
    }
}

impl ScaffoldArgs {
    pub fn replacements_path(&self, paths: &EnvPaths) -> TextnormResult<PathBuf> {
        replacements_path(&self.replacements, paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from([
            "tira-textnorm",
            "run",
            "--out-dir",
            "/tmp/clips",
            "--input",
            "raw.csv",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.corpus.tier, "IPA Transcription");
        assert_eq!(args.corpus.form, NormalizationForm::Nfkd);
        assert_eq!(args.max_passes, DEFAULT_MAX_SUBSTITUTION_PASSES);

        let settings = args.to_settings().unwrap();
        assert_eq!(settings.input, PathBuf::from("raw.csv"));
        assert_eq!(
            settings.replacements,
            PathBuf::from("/tmp/clips").join("char_replacements.json")
        );
        assert_eq!(
            settings.classifier,
            ClassifierSettings::Frequency {
                table: PathBuf::from("meta/en_word_frequencies.tsv"),
                threshold: 1e-9,
            }
        );
    }

    #[test]
    fn dictionaries_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "tira-textnorm",
            "scaffold-replacements",
            "--classifier",
            "dictionary",
            "--dictionaries",
            "en_US,en_GB",
        ])
        .unwrap();
        let Command::ScaffoldReplacements(args) = cli.command else {
            panic!("expected scaffold");
        };
        assert_eq!(
            args.corpus.classifier_settings(),
            ClassifierSettings::Dictionary {
                dir: PathBuf::from("dictionaries"),
                names: vec!["en_US".into(), "en_GB".into()],
            }
        );
    }

    #[test]
    fn options_carry_keep_punct_and_form() {
        let cli = Cli::try_parse_from([
            "tira-textnorm",
            "run",
            "--out-dir",
            "/tmp/clips",
            "--keep-punct",
            "-",
            "--form",
            "nfc",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let options = args.corpus.pipeline_options(4).unwrap();
        assert_eq!(options.keep_punct.as_deref(), Some("-"));
        assert_eq!(options.form, NormalizationForm::Nfc);
        assert_eq!(options.max_substitution_passes, 4);
    }

    #[test]
    fn a_single_pass_cap_is_rejected() {
        let cli = Cli::try_parse_from([
            "tira-textnorm",
            "run",
            "--out-dir",
            "/tmp/clips",
            "--max-passes",
            "1",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(matches!(
            args.to_settings(),
            Err(TextnormError::InvalidConfig(_))
        ));
    }
}
