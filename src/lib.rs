//! Normalization and filtering of Tira transcriptions for ASR training and
//! morphological segmentation.
//!
//! [`pipeline::Pipeline`] runs the stages in order; [`app::run`] wraps it with
//! configuration loading and artifact writing for the command line.

pub mod app;
pub mod charset;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod filters;
pub mod language;
pub mod logging;
pub mod pipeline;
pub mod substitution;
pub mod summary;
pub mod text;

#[cfg(feature = "python")]
mod bindings;

pub use error::{TextnormError, TextnormResult};
pub use pipeline::{Pipeline, PipelineOptions, PreprocessingLog};
pub use substitution::{ReplacementMap, make_replacements};
