use crate::common::units::{BOHR_TO_ANGSTROM, FORCE_EV_ANG_TO_HA_BOHR, HARTREE_TO_EV};
use crate::data::doc_from;
use crate::domain::{DataDoc, FormatError, FormatResult, Lattice, Site, Structure};

const ATOM_COLUMNS: usize = 9;

#[derive(Debug, Default)]
struct BlockBuilder {
    start_line: usize,
    lattice: Vec<[f64; 3]>,
    sites: Vec<Site>,
    forces: Vec<[f64; 3]>,
    energy: Option<f64>,
    charge: f64,
}

impl BlockBuilder {
    fn finish(self, file: &'static str) -> FormatResult<DataDoc> {
        let matrix: [[f64; 3]; 3] = self.lattice.try_into().map_err(|rows: Vec<[f64; 3]>| {
            FormatError::Inconsistent {
                file,
                message: format!(
                    "block starting at line {} has {} lattice rows, expected 3",
                    self.start_line,
                    rows.len()
                ),
            }
        })?;

        let energy = self.energy.ok_or_else(|| FormatError::Inconsistent {
            file,
            message: format!(
                "block starting at line {} has no energy line",
                self.start_line
            ),
        })?;

        let structure = Structure::new(Lattice::new(matrix), self.sites).with_charge(self.charge);
        Ok(doc_from(structure, Some(energy), Some(self.forces), None))
    }
}

/// Parses every `begin ... end` block of an `input.data`/`output.data` file
/// back into eV/Angstrom documents.
pub fn parse_cfgs(file: &'static str, content: &str) -> FormatResult<Vec<DataDoc>> {
    let mut docs = Vec::new();
    let mut current: Option<BlockBuilder> = None;

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let mut tokens = raw_line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        let values = tokens.collect::<Vec<_>>();

        match keyword {
            "begin" => {
                current = Some(BlockBuilder {
                    start_line: line_number,
                    ..BlockBuilder::default()
                });
            }
            "end" => {
                if let Some(block) = current.take() {
                    docs.push(block.finish(file)?);
                }
            }
            _ => {
                let Some(block) = current.as_mut() else {
                    continue;
                };
                match keyword {
                    "lattice" => {
                        let row = parse_vector(file, line_number, &values, 3)?;
                        block
                            .lattice
                            .push(row_to_array(&row).map(|value| value * BOHR_TO_ANGSTROM));
                    }
                    "atom" => {
                        expect_columns(file, line_number, &values, ATOM_COLUMNS)?;
                        let xyz = parse_vector(file, line_number, &values[0..3], 3)?;
                        let force = parse_vector(file, line_number, &values[6..9], 3)?;
                        block.sites.push(Site::new(
                            values[3],
                            row_to_array(&xyz).map(|value| value * BOHR_TO_ANGSTROM),
                        ));
                        block.forces.push(
                            row_to_array(&force).map(|value| value / FORCE_EV_ANG_TO_HA_BOHR),
                        );
                    }
                    "energy" => {
                        let energy = parse_vector(file, line_number, &values, 1)?;
                        block.energy = Some(energy[0] * HARTREE_TO_EV);
                    }
                    "charge" => {
                        let charge = parse_vector(file, line_number, &values, 1)?;
                        block.charge = charge[0];
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(docs)
}

fn expect_columns(
    file: &'static str,
    line: usize,
    values: &[&str],
    expected: usize,
) -> FormatResult<()> {
    if values.len() != expected {
        return Err(FormatError::ColumnCount {
            file,
            line,
            expected,
            found: values.len(),
        });
    }
    Ok(())
}

fn parse_vector(
    file: &'static str,
    line: usize,
    values: &[&str],
    expected: usize,
) -> FormatResult<Vec<f64>> {
    expect_columns(file, line, values, expected)?;
    values
        .iter()
        .map(|token| {
            token.parse::<f64>().map_err(|_| FormatError::InvalidToken {
                file,
                line,
                token: (*token).to_string(),
                kind: "float",
            })
        })
        .collect()
}

fn row_to_array(values: &[f64]) -> [f64; 3] {
    [values[0], values[1], values[2]]
}
