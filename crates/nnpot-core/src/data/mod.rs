//! Dataset plumbing: bundles structures with their reference properties and
//! flattens them into per-target tables.

use crate::domain::{DataDoc, NnpError, NnpResult, Outputs, Structure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Energy,
    Force,
    Stress,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRow {
    pub value: f64,
    /// Atom count for energy rows, 1 for force and stress rows.
    pub n: usize,
    pub dtype: TargetKind,
}

/// Flat table with one row per scalar target, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetTable {
    pub rows: Vec<TargetRow>,
}

impl TargetTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values(&self, dtype: TargetKind) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|row| row.dtype == dtype)
            .map(|row| row.value)
            .collect()
    }

    /// Energy rows divided by their atom counts.
    pub fn per_atom_energies(&self) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|row| row.dtype == TargetKind::Energy)
            .map(|row| row.value / row.n.max(1) as f64)
            .collect()
    }

    pub fn extend(&mut self, other: TargetTable) {
        self.rows.extend(other.rows);
    }
}

/// Bundles a structure with its properties; missing properties become zeros.
pub fn doc_from(
    structure: Structure,
    energy: Option<f64>,
    forces: Option<Vec<[f64; 3]>>,
    stress: Option<[f64; 6]>,
) -> DataDoc {
    let num_atoms = structure.num_sites();
    let outputs = Outputs {
        energy: energy.unwrap_or(0.0),
        forces: forces.unwrap_or_else(|| vec![[0.0; 3]; num_atoms]),
        virial_stress: stress.unwrap_or([0.0; 6]),
    };

    DataDoc {
        structure,
        num_atoms,
        outputs,
    }
}

pub fn pool_from(
    structures: Vec<Structure>,
    energies: Option<Vec<f64>>,
    forces: Option<Vec<Vec<[f64; 3]>>>,
    stresses: Option<Vec<[f64; 6]>>,
) -> NnpResult<Vec<DataDoc>> {
    let count = structures.len();
    check_sequence_length("energies", energies.as_ref().map(Vec::len), count)?;
    check_sequence_length("forces", forces.as_ref().map(Vec::len), count)?;
    check_sequence_length("stresses", stresses.as_ref().map(Vec::len), count)?;

    let mut energies = energies.map(Vec::into_iter);
    let mut forces = forces.map(Vec::into_iter);
    let mut stresses = stresses.map(Vec::into_iter);

    Ok(structures
        .into_iter()
        .map(|structure| {
            doc_from(
                structure,
                energies.as_mut().and_then(Iterator::next),
                forces.as_mut().and_then(Iterator::next),
                stresses.as_mut().and_then(Iterator::next),
            )
        })
        .collect())
}

fn check_sequence_length(name: &str, length: Option<usize>, expected: usize) -> NnpResult<()> {
    match length {
        Some(length) if length != expected => Err(NnpError::input_validation(
            "INPUT.POOL_SHAPE",
            format!(
                "{} has {} entries but {} structures were given",
                name, length, expected
            ),
        )),
        _ => Ok(()),
    }
}

/// Splits documents into structures and a flat target table.
pub fn convert_docs(
    docs: &[DataDoc],
    include_stress: bool,
) -> NnpResult<(Vec<Structure>, TargetTable)> {
    let mut structures = Vec::with_capacity(docs.len());
    let mut table = TargetTable::default();

    for (index, doc) in docs.iter().enumerate() {
        let num_sites = doc.structure.num_sites();
        if doc.outputs.forces.len() != num_sites {
            return Err(NnpError::input_validation(
                "INPUT.FORCE_SHAPE",
                format!(
                    "document {} has {} force rows for {} sites",
                    index,
                    doc.outputs.forces.len(),
                    num_sites
                ),
            ));
        }

        table.rows.push(TargetRow {
            value: doc.outputs.energy,
            n: doc.num_atoms,
            dtype: TargetKind::Energy,
        });
        table.rows.extend(doc.outputs.forces.iter().flatten().map(|&value| TargetRow {
            value,
            n: 1,
            dtype: TargetKind::Force,
        }));
        if include_stress {
            table
                .rows
                .extend(doc.outputs.virial_stress.iter().map(|&value| TargetRow {
                    value,
                    n: 1,
                    dtype: TargetKind::Stress,
                }));
        }

        structures.push(doc.structure.clone());
    }

    Ok((structures, table))
}

/// Reads a JSON array of documents.
pub fn load_dataset(path: &Path) -> NnpResult<Vec<DataDoc>> {
    let source = fs::read_to_string(path).map_err(|source| {
        NnpError::io_system(
            "IO.DATASET_READ",
            format!("failed to read dataset '{}': {}", path.display(), source),
        )
    })?;
    serde_json::from_str(&source).map_err(|source| {
        NnpError::input_validation(
            "INPUT.DATASET_PARSE",
            format!("failed to parse dataset '{}': {}", path.display(), source),
        )
    })
}

pub fn save_dataset(path: &Path, docs: &[DataDoc]) -> NnpResult<()> {
    let rendered = serde_json::to_string_pretty(docs).map_err(|source| {
        NnpError::internal(
            "SYS.DATASET_SERIALIZE",
            format!("failed to serialize dataset: {}", source),
        )
    })?;
    fs::write(path, rendered).map_err(|source| {
        NnpError::io_system(
            "IO.DATASET_WRITE",
            format!("failed to write dataset '{}': {}", path.display(), source),
        )
    })
}
