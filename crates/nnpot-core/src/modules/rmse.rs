//! Learning-curve extraction from the trainer's stdout.

use super::serialization::{data_lines, read_text_artifact};
use crate::domain::{FormatError, FormatResult, NnpResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const TRAINING_OUTPUT_FILE: &str = "training_output";

static ENERGY_RMSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ENERGY\s*\S*\s*(\S*)\s*(\S*)").expect("energy RMSE regex must compile")
});
static FORCES_RMSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"FORCES\s*\S*\s*(\S*)\s*(\S*)").expect("force RMSE regex must compile")
});

/// Per-epoch train/test RMSE for energies and forces, in trainer units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RmseHistory {
    pub train_energy: Vec<f64>,
    pub test_energy: Vec<f64>,
    pub train_forces: Vec<f64>,
    pub test_forces: Vec<f64>,
}

impl RmseHistory {
    pub fn epochs(&self) -> usize {
        self.train_energy.len()
    }

    /// `(train_energy, test_energy, train_forces, test_forces)` of the last epoch.
    pub fn last(&self) -> Option<(f64, f64, f64, f64)> {
        Some((
            *self.train_energy.last()?,
            *self.test_energy.last()?,
            *self.train_forces.last()?,
            *self.test_forces.last()?,
        ))
    }
}

pub fn parse_rmse(content: &str) -> FormatResult<RmseHistory> {
    let mut history = RmseHistory::default();

    for (line, text) in data_lines(content) {
        if let Some((train, test)) = capture_pair(&ENERGY_RMSE, text, line)? {
            history.train_energy.push(train);
            history.test_energy.push(test);
        }
        if let Some((train, test)) = capture_pair(&FORCES_RMSE, text, line)? {
            history.train_forces.push(train);
            history.test_forces.push(test);
        }
    }

    Ok(history)
}

fn capture_pair(pattern: &Regex, text: &str, line: usize) -> FormatResult<Option<(f64, f64)>> {
    let Some(captures) = pattern.captures(text) else {
        return Ok(None);
    };

    let parse = |index: usize| {
        let token = captures.get(index).map_or("", |found| found.as_str());
        token.parse::<f64>().map_err(|_| FormatError::InvalidToken {
            file: TRAINING_OUTPUT_FILE,
            line,
            token: token.to_string(),
            kind: "RMSE value",
        })
    };

    Ok(Some((parse(1)?, parse(2)?)))
}

pub fn load_rmse(path: &Path) -> NnpResult<RmseHistory> {
    let content = read_text_artifact(path)?;
    Ok(parse_rmse(&content)?)
}
