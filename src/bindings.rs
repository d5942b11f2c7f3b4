use std::path::Path;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config;
use crate::error::TextnormError;
use crate::filters::ToneWords;
use crate::substitution;
use crate::text::{self, NormalizationForm};

fn to_py_err(err: TextnormError) -> PyErr {
    match err {
        TextnormError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Apply a Unicode normalization form (default NFKD)
#[pyfunction]
#[pyo3(signature = (text, form = "NFKD"))]
fn unicode_normalize(text: String, form: &str) -> PyResult<String> {
    let form: NormalizationForm = form.parse().map_err(PyValueError::new_err)?;
    Ok(text::unicode_normalize(&text, form))
}

/// Remove ASCII punctuation, keeping any characters listed in `keep`
#[pyfunction]
#[pyo3(signature = (text, keep = None))]
fn remove_punct(text: String, keep: Option<String>) -> String {
    text::remove_punct(&text, keep.as_deref())
}

/// True if the text carries a combining diacritic (tone marks only by default)
#[pyfunction]
#[pyo3(signature = (text, tone_only = true))]
fn has_diac(text: String, tone_only: bool) -> bool {
    text::has_diac(&text, tone_only)
}

/// Simultaneous longest-match substitution with a {source: target} dict
/// Equal-length keys are tried in the dict's insertion order
#[pyfunction]
fn make_replacements(text: String, reps: &Bound<'_, PyDict>) -> PyResult<String> {
    let mut pairs: Vec<(String, String)> = Vec::with_capacity(reps.len());
    for (key, target) in reps.iter() {
        pairs.push((key.extract()?, target.extract()?));
    }
    let pairs = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    substitution::make_replacements(&text, pairs).map_err(to_py_err)
}

/// Substitute with a `char_replacements.json` file until the text stops changing
/// Returns: (text, passes, stable)
#[pyfunction]
#[pyo3(signature = (text, path, max_passes = 8))]
fn make_replacements_file(text: String, path: String, max_passes: usize) -> PyResult<(String, usize, bool)> {
    let map = config::load_replacement_map(Path::new(&path)).map_err(to_py_err)?;
    let out = map.apply_until_stable(&text, max_passes);
    Ok((out.text, out.passes, out.stable))
}

/// Drop whitespace-separated words made only of tone letters (HLL, LHL, ...)
#[pyfunction]
#[pyo3(signature = (text, symbols = "hml"))]
fn remove_tone_words(text: String, symbols: &str) -> PyResult<String> {
    let tone_words = ToneWords::new(symbols).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(tone_words.strip(&text))
}

#[pymodule]
fn tira_textnorm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(unicode_normalize, m)?)?;
    m.add_function(wrap_pyfunction!(remove_punct, m)?)?;
    m.add_function(wrap_pyfunction!(has_diac, m)?)?;
    m.add_function(wrap_pyfunction!(make_replacements, m)?)?;
    m.add_function(wrap_pyfunction!(make_replacements_file, m)?)?;
    m.add_function(wrap_pyfunction!(remove_tone_words, m)?)?;
    Ok(())
}
