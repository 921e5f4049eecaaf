use super::model::{WeightEntry, WeightKind, WeightTable};
use crate::domain::{FormatError, FormatResult};
use crate::modules::serialization::data_lines;

const WEIGHTS_FILE: &str = "weights file";
const CONNECTION_COLUMNS: usize = 7;
const BIAS_COLUMNS: usize = 5;

pub fn parse_weights(content: &str) -> FormatResult<WeightTable> {
    let mut entries = Vec::new();

    for (line, raw_line) in data_lines(content) {
        let tokens = raw_line.split_whitespace().collect::<Vec<_>>();
        let kind = match tokens.get(1).copied() {
            Some("a") => WeightKind::Connection,
            Some("b") => WeightKind::Bias,
            Some(other) => {
                return Err(FormatError::InvalidToken {
                    file: WEIGHTS_FILE,
                    line,
                    token: other.to_string(),
                    kind: "weight type",
                });
            }
            None => {
                return Err(FormatError::ColumnCount {
                    file: WEIGHTS_FILE,
                    line,
                    expected: BIAS_COLUMNS,
                    found: tokens.len(),
                });
            }
        };

        let expected = match kind {
            WeightKind::Connection => CONNECTION_COLUMNS,
            WeightKind::Bias => BIAS_COLUMNS,
        };
        if tokens.len() != expected {
            return Err(FormatError::ColumnCount {
                file: WEIGHTS_FILE,
                line,
                expected,
                found: tokens.len(),
            });
        }

        let value = tokens[0]
            .parse::<f64>()
            .map_err(|_| invalid_token(line, tokens[0], "float"))?;
        let indices = tokens[2..]
            .iter()
            .map(|token| {
                token
                    .parse::<usize>()
                    .map_err(|_| invalid_token(line, token, "index"))
            })
            .collect::<FormatResult<Vec<_>>>()?;

        entries.push(WeightEntry {
            value_token: tokens[0].to_string(),
            value,
            kind,
            index: indices[0],
            start_layer: indices[1],
            start_neuron: indices[2],
            end: match kind {
                WeightKind::Connection => Some((indices[3], indices[4])),
                WeightKind::Bias => None,
            },
        });
    }

    Ok(WeightTable { entries })
}

fn invalid_token(line: usize, token: &str, kind: &'static str) -> FormatError {
    FormatError::InvalidToken {
        file: WEIGHTS_FILE,
        line,
        token: token.to_string(),
        kind,
    }
}
