use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tira_textnorm::app::{self, ClassifierSettings, RunSettings};
use tira_textnorm::config::{self, EnvPaths};
use tira_textnorm::corpus::DEFAULT_TIER;
use tira_textnorm::{PipelineOptions, TextnormError};

const HEADER: &str = "audio_basename,start,end,duration,text,eaf_basename,tier\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(rows: &[(&str, &str)], inventory: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let mut raw = String::from(HEADER);
        for (i, (text, tier)) in rows.iter().enumerate() {
            let start = i * 1000;
            raw.push_str(&format!(
                "clip{i}.wav,{start},{},1000,{text},session.eaf,{tier}\n",
                start + 1000
            ));
        }
        fs::write(root.join("raw.csv"), raw).unwrap();
        fs::write(root.join("freq.tsv"), "the\t0.05\nand\t0.03\n").unwrap();
        fs::write(
            root.join("inventory.json"),
            serde_json::to_string(inventory).unwrap(),
        )
        .unwrap();
        fs::create_dir(root.join("clips")).unwrap();
        fs::write(root.join("clips").join(config::REPLACEMENTS_FILE), "{}").unwrap();

        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn out(&self, name: &str) -> PathBuf {
        self.path("clips").join(name)
    }

    fn settings(&self) -> RunSettings {
        let mut paths = EnvPaths::from_lookup(|_| None);
        paths.clips_dir = Some(self.path("clips"));
        paths.dataset_dir = Some(self.path("dataset"));
        RunSettings {
            paths,
            input: self.path("raw.csv"),
            tier: DEFAULT_TIER.to_string(),
            options: PipelineOptions::default(),
            classifier: ClassifierSettings::Frequency {
                table: self.path("freq.tsv"),
                threshold: 1e-9,
            },
            replacements: self.out(config::REPLACEMENTS_FILE),
            inventory: self.path("inventory.json"),
            morphology: None,
        }
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Characters of `tó lò` after NFKD decomposition.
const TO_LO_CHARS: &[&str] = &["t", "o", "l", " ", "\u{301}", "\u{300}"];

#[test]
fn tier_filter_and_ungrammatical_rows_leave_one_record() {
    let fixture = Fixture::new(
        &[
            ("*bad row", DEFAULT_TIER),
            ("t\u{f3} l\u{f2}", DEFAULT_TIER),
            ("ignored", "Gloss"),
        ],
        TO_LO_CHARS,
    );

    let outcome = app::run(&fixture.settings()).unwrap();
    assert_eq!(outcome.rows, 1);

    let mut rdr = csv::Reader::from_path(fixture.out(app::TRANSCRIPTIONS_FILE)).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "index");
    let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "1");
    assert_eq!(&rows[0][5], "to\u{301} lo\u{300}");

    let readme = read(&fixture.out(app::README_FILE));
    assert!(readme.contains("# tira_asr"));
    assert!(readme.contains("- 2 non-NaN transcriptions in dataset"));
    assert!(readme.contains("- removed 1 ungrammatical rows"));
    assert!(readme.contains("- removed 0 rows with English words"));

    assert_eq!(read(&fixture.out(app::ENGLISH_WORDS_FILE)), "");
    assert_eq!(
        read(&fixture.out(app::TIRA_WORDS_FILE)),
        "lo\u{300}\nto\u{301}"
    );
    assert_eq!(
        read(&fixture.path("dataset").join(app::SENTENCES_FILE)),
        "to\u{301} lo\u{300}"
    );
}

#[test]
fn english_rows_are_dropped_and_listed() {
    let fixture = Fixture::new(
        &[("the t\u{f3}", DEFAULT_TIER), ("t\u{f3} l\u{f2}", DEFAULT_TIER)],
        TO_LO_CHARS,
    );

    let outcome = app::run(&fixture.settings()).unwrap();
    assert_eq!(outcome.rows, 1);
    assert_eq!(read(&fixture.out(app::ENGLISH_WORDS_FILE)), "the");
    assert!(
        outcome
            .log
            .entries()
            .iter()
            .any(|e| e.starts_with("- removed 1 rows with English words, 1 rows remaining"))
    );
}

#[test]
fn tone_words_are_stripped_from_output() {
    let fixture = Fixture::new(
        &[("HML w\u{f3}rd LHL", DEFAULT_TIER)],
        &["w", "o", "r", "d", "\u{301}"],
    );

    app::run(&fixture.settings()).unwrap();

    let mut rdr = csv::Reader::from_path(fixture.out(app::TRANSCRIPTIONS_FILE)).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
    assert_eq!(&rows[0][5], "wo\u{301}rd");
}

#[test]
fn replacement_map_is_applied_before_the_gate() {
    let fixture = Fixture::new(&[("t\u{f3} l\u{f2}", DEFAULT_TIER)], &["t", "ɔ", "l", " ", "\u{301}", "\u{300}"]);
    fs::write(
        fixture.out(config::REPLACEMENTS_FILE),
        r#"{"o": {"target": "ɔ", "comment": "open o"}}"#,
    )
    .unwrap();

    let outcome = app::run(&fixture.settings()).unwrap();
    assert_eq!(outcome.rows, 1);
    let csv = read(&fixture.out(app::TRANSCRIPTIONS_FILE));
    assert!(csv.contains("t\u{254}\u{301} l\u{254}\u{300}"));
}

#[test]
fn unexpected_characters_fail_the_run_after_wordlists() {
    let fixture = Fixture::new(
        &[("t\u{f3} l\u{f2}", DEFAULT_TIER)],
        &["t", "o", " ", "\u{301}", "\u{300}"],
    );

    let err = app::run(&fixture.settings()).unwrap_err();
    match &err {
        TextnormError::UnexpectedCharacters { chars, rows, column } => {
            assert!(chars.contains(&'l'));
            assert_eq!(rows, &vec![0]);
            assert_eq!(*column, "text");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 2);

    assert!(fixture.out(app::TIRA_WORDS_FILE).exists());
    assert!(!fixture.out(app::TRANSCRIPTIONS_FILE).exists());
    assert!(!fixture.out(app::README_FILE).exists());
}

#[test]
fn missing_replacement_map_aborts_before_writing() {
    let fixture = Fixture::new(&[("t\u{f3} l\u{f2}", DEFAULT_TIER)], TO_LO_CHARS);
    fs::remove_file(fixture.out(config::REPLACEMENTS_FILE)).unwrap();

    let err = app::run(&fixture.settings()).unwrap_err();
    assert!(matches!(err, TextnormError::MissingConfig { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(!fixture.out(app::TIRA_WORDS_FILE).exists());
}

#[test]
fn scaffold_lists_every_character_once() {
    let fixture = Fixture::new(
        &[("t\u{f3} l\u{f2}", DEFAULT_TIER), ("*x", DEFAULT_TIER)],
        TO_LO_CHARS,
    );
    let settings = fixture.settings();
    let output = fixture.path("scaffold.json");

    let found = app::scaffold_replacements(
        &settings.input,
        &settings.tier,
        &settings.options,
        &settings.classifier,
        &output,
    )
    .unwrap();
    assert_eq!(found, 6);

    let raw = read(&output);
    assert!(raw.contains("\\u0301"));
    let entries = config::load_replacement_entries(&output).unwrap();
    assert_eq!(entries.len(), 6);
    assert!(!entries.contains_key("x"));
    assert_eq!(entries["\u{301}"].target, "\u{301}");
    assert_eq!(entries["\u{301}"].unicode_point.as_deref(), Some("0x301"));
    assert_eq!(
        entries["\u{301}"].unicode_name.as_deref(),
        Some("COMBINING ACUTE ACCENT")
    );
}
