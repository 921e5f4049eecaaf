//! `scaling.data`: per symmetry function min/max/mean/sigma statistics.

use super::serialization::{data_lines, read_text_artifact, write_text_artifact};
use crate::domain::{FormatError, FormatResult, NnpError, NnpResult};
use std::path::Path;

pub const SCALING_FILE: &str = "scaling.data";
const SCALING_COLUMNS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingEntry {
    pub element_index: usize,
    pub sf_index: usize,
    pub sf_min: f64,
    pub sf_max: f64,
    pub sf_mean: f64,
    pub sf_sigma: f64,
    /// min, max, mean and sigma as printed by the trainer.
    pub value_tokens: [String; 4],
}

impl ScalingEntry {
    pub fn render(&self) -> String {
        let [min, max, mean, sigma] = &self.value_tokens;
        format!(
            "{:>4}{:>5}  {:>22} {:>22} {:>22} {:>22}",
            self.element_index, self.sf_index, min, max, mean, sigma
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalingTable {
    pub entries: Vec<ScalingEntry>,
}

impl ScalingTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the first `num_symm_functions` rows.
    pub fn render(&self, num_symm_functions: usize) -> NnpResult<String> {
        if self.entries.len() < num_symm_functions {
            return Err(NnpError::input_validation(
                "INPUT.SCALING_SHAPE",
                format!(
                    "scaling table has {} rows but the network has {} symmetry functions",
                    self.entries.len(),
                    num_symm_functions
                ),
            ));
        }

        Ok(self.entries[..num_symm_functions]
            .iter()
            .map(ScalingEntry::render)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

pub fn parse_scaling(content: &str) -> FormatResult<ScalingTable> {
    let mut entries = Vec::new();

    for (line, raw_line) in data_lines(content) {
        let tokens = raw_line.split_whitespace().collect::<Vec<_>>();
        if tokens.len() != SCALING_COLUMNS {
            return Err(FormatError::ColumnCount {
                file: SCALING_FILE,
                line,
                expected: SCALING_COLUMNS,
                found: tokens.len(),
            });
        }

        let index = |position: usize| {
            tokens[position]
                .parse::<usize>()
                .map_err(|_| invalid_token(line, tokens[position], "index"))
        };
        let value = |position: usize| {
            tokens[position]
                .parse::<f64>()
                .map_err(|_| invalid_token(line, tokens[position], "float"))
        };

        entries.push(ScalingEntry {
            element_index: index(0)?,
            sf_index: index(1)?,
            sf_min: value(2)?,
            sf_max: value(3)?,
            sf_mean: value(4)?,
            sf_sigma: value(5)?,
            value_tokens: [2, 3, 4, 5].map(|position| tokens[position].to_string()),
        });
    }

    Ok(ScalingTable { entries })
}

fn invalid_token(line: usize, token: &str, kind: &'static str) -> FormatError {
    FormatError::InvalidToken {
        file: SCALING_FILE,
        line,
        token: token.to_string(),
        kind,
    }
}

pub fn load_scaling(path: &Path) -> NnpResult<ScalingTable> {
    let content = read_text_artifact(path)?;
    Ok(parse_scaling(&content)?)
}

pub fn write_scaling(
    path: &Path,
    table: &ScalingTable,
    num_symm_functions: usize,
) -> NnpResult<()> {
    write_text_artifact(path, &table.render(num_symm_functions)?)
}
