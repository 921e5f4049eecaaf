//! `input.nn` settings: defaults, overrides, writer and reader.

mod model;
mod parser;
mod writer;

pub use model::{
    GeneralSettings, HeaderValue, NnpSettings, ScaleFeatures, SymmetryFunction,
    SymmetryFunctionSettings, TrainingSettings, merge_json,
};
pub use parser::{InputDocument, parse_input};
pub use writer::render_input;

use super::serialization::{read_text_artifact, write_text_artifact};
use crate::common::Element;
use crate::domain::{NnpError, NnpResult};
use std::fs;
use std::path::Path;

pub const INPUT_NN_FILE: &str = "input.nn";

pub fn write_input(path: &Path, settings: &NnpSettings, element: Element) -> NnpResult<()> {
    write_text_artifact(path, &render_input(settings, element))
}

pub fn load_input(path: &Path) -> NnpResult<InputDocument> {
    let content = read_text_artifact(path)?;
    Ok(parse_input(&content)?)
}

/// Defaults overlaid with an optional JSON settings file.
pub fn load_settings(path: Option<&Path>) -> NnpResult<NnpSettings> {
    let Some(path) = path else {
        return NnpSettings::defaults();
    };

    let source = fs::read_to_string(path).map_err(|source| {
        NnpError::io_system(
            "IO.SETTINGS_READ",
            format!("failed to read settings '{}': {}", path.display(), source),
        )
    })?;
    let overrides = serde_json::from_str(&source).map_err(|source| {
        NnpError::input_validation(
            "INPUT.SETTINGS",
            format!("failed to parse settings '{}': {}", path.display(), source),
        )
    })?;
    NnpSettings::with_overrides(overrides)
}
