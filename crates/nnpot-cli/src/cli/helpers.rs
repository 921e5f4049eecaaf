use super::CliError;
use anyhow::Context;
use nnpot_core::common::Element;
use nnpot_core::data::{TargetKind, TargetTable};
use nnpot_core::domain::NnpError;
use nnpot_core::numerics::{mae, rmse};
use nnpot_core::potential::PotentialSummary;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub(super) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let value = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    Ok(value)
}

pub(super) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    fs::write(path, rendered).with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

pub(super) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    println!("{}", rendered);
    Ok(())
}

pub(super) fn parse_element(symbol: &str) -> Result<Element, CliError> {
    Element::from_symbol(symbol).ok_or_else(|| {
        CliError::Compute(NnpError::input_validation(
            "INPUT.ELEMENT",
            format!("'{}' is not an element symbol", symbol),
        ))
    })
}

/// Error metrics of one target kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(super) struct ErrorMetrics {
    pub(super) count: usize,
    pub(super) rmse: f64,
    pub(super) mae: f64,
}

impl ErrorMetrics {
    fn between(reference: &[f64], predicted: &[f64]) -> Option<Self> {
        Some(Self {
            count: reference.len(),
            rmse: rmse(reference, predicted)?,
            mae: mae(reference, predicted)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct EvaluationReport {
    /// Per-atom energies, eV/atom.
    pub(super) energy: Option<ErrorMetrics>,
    /// Force components, eV/Angstrom.
    pub(super) forces: Option<ErrorMetrics>,
    pub(super) reference: TargetTable,
    pub(super) predicted: TargetTable,
}

impl EvaluationReport {
    pub(super) fn new(reference: TargetTable, predicted: TargetTable) -> Self {
        let energy = ErrorMetrics::between(
            &reference.per_atom_energies(),
            &predicted.per_atom_energies(),
        );
        let forces = ErrorMetrics::between(
            &reference.values(TargetKind::Force),
            &predicted.values(TargetKind::Force),
        );

        Self {
            energy,
            forces,
            reference,
            predicted,
        }
    }
}

pub(super) fn render_evaluation(report: &EvaluationReport) -> String {
    let mut lines = Vec::new();
    for (label, unit, metrics) in [
        ("Energy", "eV/atom", report.energy),
        ("Forces", "eV/A", report.forces),
    ] {
        match metrics {
            Some(metrics) => lines.push(format!(
                "{label:<8}n={:<8} RMSE={:.6} MAE={:.6} {unit}",
                metrics.count, metrics.rmse, metrics.mae
            )),
            None => lines.push(format!("{label:<8}no comparable values")),
        }
    }
    lines.join("\n")
}

pub(super) fn render_summary(summary: &PotentialSummary) -> String {
    let layers = summary
        .layer_sizes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-");

    let mut lines = vec![
        format!("Name:               {}", summary.name),
        format!("Element:            {} ({})", summary.element, summary.suffix),
        format!("Cutoff radius:      {} A", summary.r_cut),
        format!("Symmetry functions: {}", summary.num_symm_functions),
        format!("Network:            {}", layers),
        format!("Parameters:         {}", summary.num_parameters),
    ];
    match summary.final_rmse {
        Some(last) => {
            lines.push(format!("Epochs trained:     {}", summary.epochs_trained));
            lines.push(format!(
                "Energy RMSE:        train {:.5E} / test {:.5E} Ha/atom",
                last.train_energy, last.test_energy
            ));
            lines.push(format!(
                "Force RMSE:         train {:.5E} / test {:.5E} Ha/bohr",
                last.train_forces, last.test_forces
            ));
        }
        None => lines.push("Training history:   not available".to_string()),
    }
    lines.join("\n")
}
