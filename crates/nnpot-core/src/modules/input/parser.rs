use super::model::{
    GeneralSettings, HeaderValue, NnpSettings, ScaleFeatures, SymmetryFunctionSettings,
    TrainingSettings,
};
use crate::common::Element;
use crate::common::units::bohr_to_angstrom;
use crate::domain::{FormatError, FormatResult};
use crate::modules::serialization::data_lines;
use crate::numerics::{round_to, unique_sorted};
use std::collections::BTreeSet;

const INPUT_FILE: &str = "input.nn";

/// A decoded `input.nn`: the network's element plus every recovered setting.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDocument {
    pub element: Element,
    pub settings: NnpSettings,
}

#[derive(Debug, Default)]
struct SymmetryRows {
    r_cut: Option<f64>,
    r_etas: Vec<f64>,
    r_shift: Vec<f64>,
    a_etas: Vec<f64>,
    lambdas: BTreeSet<i32>,
    zetas: Vec<f64>,
}

pub fn parse_input(content: &str) -> FormatResult<InputDocument> {
    let mut element = None;
    let mut atom_energy = None;
    let mut cutoff_type = None;
    let mut scale_features = ScaleFeatures::None;
    let mut scale_min_short = None;
    let mut scale_max_short = None;
    let mut hidden_layers = None;
    let mut activations = None;
    let mut normalize_nodes = false;
    let mut training = TrainingSettings::default();
    let mut seen_training_keys = BTreeSet::new();
    let mut rows = SymmetryRows::default();

    for (line, raw_line) in data_lines(content) {
        let tokens = raw_line.split_whitespace().collect::<Vec<_>>();
        let Some(&keyword) = tokens.first() else {
            continue;
        };

        match keyword {
            "elements" => {
                let symbol = token_at(&tokens, 1, line)?;
                element = Some(
                    Element::from_symbol(symbol)
                        .ok_or_else(|| invalid_token(line, symbol, "element symbol"))?,
                );
            }
            "atom_energy" => atom_energy = Some(parse_float(token_at(&tokens, 2, line)?, line)?),
            "cutoff_type" => cutoff_type = Some(parse_int(token_at(&tokens, 1, line)?, line)?),
            "scale_min_short" => {
                scale_min_short = Some(parse_float(token_at(&tokens, 1, line)?, line)?)
            }
            "scale_max_short" => {
                scale_max_short = Some(parse_float(token_at(&tokens, 1, line)?, line)?)
            }
            "global_nodes_short" => {
                hidden_layers = Some(
                    tokens[1..]
                        .iter()
                        .map(|token| {
                            token
                                .parse::<usize>()
                                .map_err(|_| invalid_token(line, token, "layer width"))
                        })
                        .collect::<FormatResult<Vec<_>>>()?,
                );
            }
            "global_activation_short" => {
                activations = Some(token_at(&tokens, 1, line)?.to_string());
            }
            "normalize_nodes" => normalize_nodes = true,
            "symfunction_short" => parse_symmetry_row(&tokens, line, &mut rows)?,
            _ => {
                if let Some(scaling) = ScaleFeatures::from_keyword(keyword) {
                    scale_features = scaling;
                } else if let Some(key) = TrainingSettings::KEYS
                    .iter()
                    .find(|candidate| **candidate == keyword)
                {
                    let token = token_at(&tokens, 1, line)?;
                    training
                        .assign(key, parse_header_value(token, line)?)
                        .map_err(|kind| invalid_token(line, token, kind))?;
                    seen_training_keys.insert(*key);
                }
            }
        }
    }

    if let Some(missing) = TrainingSettings::KEYS
        .iter()
        .find(|key| !seen_training_keys.contains(*key))
    {
        return Err(missing_key(missing));
    }

    let general = GeneralSettings {
        cutoff_type: cutoff_type.ok_or_else(|| missing_key("cutoff_type"))?,
        scale_features,
        scale_min_short: scale_min_short.ok_or_else(|| missing_key("scale_min_short"))?,
        scale_max_short: scale_max_short.ok_or_else(|| missing_key("scale_max_short"))?,
        hidden_layers: hidden_layers.ok_or_else(|| missing_key("global_nodes_short"))?,
        activations: activations.ok_or_else(|| missing_key("global_activation_short"))?,
        normalize_nodes,
    };

    Ok(InputDocument {
        element: element.ok_or_else(|| missing_key("elements"))?,
        settings: NnpSettings {
            atom_energy,
            general,
            additional: training,
            symmetry_function: rows.finish()?,
        },
    })
}

fn parse_symmetry_row(
    tokens: &[&str],
    line: usize,
    rows: &mut SymmetryRows,
) -> FormatResult<()> {
    match token_at(tokens, 2, line)? {
        "2" => {
            expect_min_columns(tokens, 7, line)?;
            rows.r_etas.push(parse_float(tokens[4], line)?);
            rows.r_shift.push(parse_float(tokens[5], line)?);
            let r_cut = parse_float(tokens[6], line)?;
            rows.r_cut = rows.r_cut.or(Some(r_cut));
        }
        "3" => {
            expect_min_columns(tokens, 9, line)?;
            rows.a_etas.push(parse_float(tokens[5], line)?);
            let lambda = tokens[6]
                .parse::<i32>()
                .map_err(|_| invalid_token(line, tokens[6], "integer"))?;
            rows.lambdas.insert(lambda);
            rows.zetas.push(parse_float(tokens[7], line)?);
            let r_cut = parse_float(tokens[8], line)?;
            rows.r_cut = rows.r_cut.or(Some(r_cut));
        }
        other => return Err(invalid_token(line, other, "symmetry function type")),
    }
    Ok(())
}

impl SymmetryRows {
    fn finish(self) -> FormatResult<SymmetryFunctionSettings> {
        let r_cut = self.r_cut.ok_or_else(|| missing_key("symfunction_short"))?;
        let to_angstrom = |value: f64| round_to(bohr_to_angstrom(value), 1);

        Ok(SymmetryFunctionSettings {
            r_cut: to_angstrom(r_cut),
            r_etas: unique_sorted(self.r_etas),
            r_shift: unique_sorted(self.r_shift.into_iter().map(to_angstrom)),
            a_etas: unique_sorted(self.a_etas),
            zetas: unique_sorted(self.zetas),
            lambdas: self.lambdas.into_iter().collect(),
        })
    }
}

fn token_at<'a>(tokens: &[&'a str], index: usize, line: usize) -> FormatResult<&'a str> {
    tokens.get(index).copied().ok_or(FormatError::ColumnCount {
        file: INPUT_FILE,
        line,
        expected: index + 1,
        found: tokens.len(),
    })
}

fn expect_min_columns(tokens: &[&str], expected: usize, line: usize) -> FormatResult<()> {
    if tokens.len() < expected {
        return Err(FormatError::ColumnCount {
            file: INPUT_FILE,
            line,
            expected,
            found: tokens.len(),
        });
    }
    Ok(())
}

/// Integers stay integers; anything with a decimal point or exponent is a float.
fn parse_header_value(token: &str, line: usize) -> FormatResult<HeaderValue> {
    if token.contains(&['.', 'e', 'E'][..]) {
        parse_float(token, line).map(HeaderValue::Float)
    } else {
        parse_int(token, line).map(HeaderValue::Int)
    }
}

fn parse_int(token: &str, line: usize) -> FormatResult<i64> {
    token
        .parse::<i64>()
        .map_err(|_| invalid_token(line, token, "integer"))
}

fn parse_float(token: &str, line: usize) -> FormatResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| invalid_token(line, token, "float"))
}

fn invalid_token(line: usize, token: &str, kind: &'static str) -> FormatError {
    FormatError::InvalidToken {
        file: INPUT_FILE,
        line,
        token: token.to_string(),
        kind,
    }
}

fn missing_key(key: &str) -> FormatError {
    FormatError::MissingKey {
        file: INPUT_FILE,
        key: key.to_string(),
    }
}
