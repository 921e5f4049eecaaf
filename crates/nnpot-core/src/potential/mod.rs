//! The `NnPotential` object: trains through n2p2, carries the fitted
//! parameters, and evaluates them through `nnp-predict` or LAMMPS.

use crate::common::Element;
use crate::data::TargetTable;
use crate::domain::{DataDoc, NnpError, NnpResult, Structure};
use crate::lammps::{LammpsCalculator, Prediction};
use crate::modules::configs::{INPUT_DATA_FILE, OUTPUT_DATA_FILE, read_cfgs, write_cfgs};
use crate::modules::input::{INPUT_NN_FILE, InputDocument, NnpSettings, load_input, write_input};
use crate::modules::rmse::{RmseHistory, TRAINING_OUTPUT_FILE, load_rmse};
use crate::modules::scaling::{SCALING_FILE, ScalingTable, load_scaling, write_scaling};
use crate::modules::weights::{
    NetworkWeights, WeightTable, load_weights, network_sizes, weights_file_name, write_weights,
};
use crate::numerics::format_trainer_float;
use crate::runner::{OutputSink, Tool, Toolchain};
use globset::Glob;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DEFAULT_NAME: &str = "NNPotential";

pub const PAIR_STYLE: &str = "pair_style        nnp dir \"./\" showew no showewsum 0 maxew 10000000 resetew yes cflength 1.8897261328 cfenergy 0.0367493254";

/// Per-epoch RMSE kept next to a saved parameter bundle.
pub const RMSE_HISTORY_FILE: &str = "rmse.json";

const PAIR_COEFF_PREFIX: &str = "pair_coeff        * * ";
const CUTOFF_PADDING: f64 = 1.0e-2;

/// Everything needed to write a usable parameter bundle.
#[derive(Debug, Clone)]
struct FittedParameters {
    element: Element,
    settings: NnpSettings,
    suffix: String,
    weight_table: WeightTable,
    network: NetworkWeights,
    scaling: ScalingTable,
}

#[derive(Debug, Clone, Serialize)]
pub struct PotentialSummary {
    pub name: String,
    pub element: String,
    pub suffix: String,
    pub r_cut: f64,
    pub num_symm_functions: usize,
    pub layer_sizes: Vec<usize>,
    pub num_parameters: usize,
    pub epochs_trained: usize,
    pub final_rmse: Option<FinalRmse>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FinalRmse {
    pub train_energy: f64,
    pub test_energy: f64,
    pub train_forces: f64,
    pub test_forces: f64,
}

#[derive(Debug, Clone)]
pub struct NnPotential {
    name: String,
    toolchain: Toolchain,
    fitted: Option<FittedParameters>,
    rmse: Option<RmseHistory>,
}

impl Default for NnPotential {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl NnPotential {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            toolchain: Toolchain::from_env(),
            fitted: None,
            rmse: None,
        }
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn element(&self) -> Option<Element> {
        self.fitted.as_ref().map(|fitted| fitted.element)
    }

    pub fn settings(&self) -> Option<&NnpSettings> {
        self.fitted.as_ref().map(|fitted| &fitted.settings)
    }

    pub fn suffix(&self) -> Option<&str> {
        self.fitted.as_ref().map(|fitted| fitted.suffix.as_str())
    }

    pub fn layer_sizes(&self) -> Option<Vec<usize>> {
        self.settings().map(NnpSettings::layer_sizes)
    }

    pub fn network(&self) -> Option<&NetworkWeights> {
        self.fitted.as_ref().map(|fitted| &fitted.network)
    }

    pub fn weight_table(&self) -> Option<&WeightTable> {
        self.fitted.as_ref().map(|fitted| &fitted.weight_table)
    }

    pub fn scaling(&self) -> Option<&ScalingTable> {
        self.fitted.as_ref().map(|fitted| &fitted.scaling)
    }

    pub fn rmse_history(&self) -> Option<&RmseHistory> {
        self.rmse.as_ref()
    }

    /// Fits the network with `nnp-scaling` and `nnp-train` in a scratch
    /// directory and loads the final epoch's weights. Returns the trainer's
    /// exit code.
    pub fn train(&mut self, pool: &[DataDoc], settings: NnpSettings) -> NnpResult<i32> {
        self.toolchain.require(Tool::NnpTrain)?;
        self.toolchain.require(Tool::NnpScaling)?;
        settings.validate()?;

        let scratch = scratch_dir()?;
        let dir = scratch.path();
        tracing::info!(
            name = %self.name,
            structures = pool.len(),
            epochs = settings.epochs(),
            "training neural network potential"
        );

        let element = write_cfgs(&dir.join(INPUT_DATA_FILE), pool)?;
        write_input(&dir.join(INPUT_NN_FILE), &settings, element)?;

        self.toolchain
            .run(Tool::NnpScaling, &[INPUT_NN_FILE], dir, OutputSink::Capture)?;
        self.toolchain.run(
            Tool::NnpTrain,
            &[INPUT_NN_FILE],
            dir,
            OutputSink::File(PathBuf::from(TRAINING_OUTPUT_FILE)),
        )?;

        let rmse = load_rmse(&dir.join(TRAINING_OUTPUT_FILE))?;
        let weights_path = find_trained_weights(dir, settings.epochs())?;
        let suffix = weights_suffix(&weights_path)?;
        let weight_table = load_weights(&weights_path)?;
        let network =
            NetworkWeights::from_table(&weight_table, &network_sizes(&settings.layer_sizes()))?;
        let scaling = load_scaling(&dir.join(SCALING_FILE))?;

        tracing::info!(
            name = %self.name,
            element = %element,
            epochs = rmse.epochs(),
            parameters = network.num_parameters(),
            "training finished"
        );

        self.fitted = Some(FittedParameters {
            element,
            settings,
            suffix,
            weight_table,
            network,
            scaling,
        });
        self.rmse = Some(rmse);

        Ok(0)
    }

    /// Writes `weights.<suffix>.data`, `scaling.data` and `input.nn` into
    /// `dir` and returns the LAMMPS `pair_style`/`pair_coeff` lines.
    pub fn write_param(&self, dir: &Path) -> NnpResult<Vec<String>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            NnpError::input_validation(
                "INPUT.PARAMS_MISSING",
                "the weights and scaling parameters should be provided",
            )
        })?;

        write_weights(
            &dir.join(weights_file_name(&fitted.suffix)),
            &fitted.weight_table,
        )?;
        write_scaling(
            &dir.join(SCALING_FILE),
            &fitted.scaling,
            fitted.settings.num_symm_functions(),
        )?;
        write_input(&dir.join(INPUT_NN_FILE), &fitted.settings, fitted.element)?;

        Ok(vec![
            PAIR_STYLE.to_string(),
            format!(
                "{}{}",
                PAIR_COEFF_PREFIX,
                format_trainer_float(fitted.settings.r_cut() + CUTOFF_PADDING)
            ),
        ])
    }

    /// Runs `nnp-predict` structure by structure. Returns the reference table
    /// (as re-read from the trainer format) and the predicted table.
    pub fn evaluate(&self, pool: &[DataDoc]) -> NnpResult<(TargetTable, TargetTable)> {
        self.toolchain.require(Tool::NnpPredict)?;
        let element = self.require_element()?;

        let scratch = scratch_dir()?;
        let dir = scratch.path();
        let input_data = dir.join(INPUT_DATA_FILE);

        self.write_param(dir)?;
        let pool_element = write_cfgs(&input_data, pool)?;
        check_species(element, pool_element)?;
        let (_, reference) = read_cfgs(&input_data)?;

        let mut predicted = TargetTable::default();
        for (index, doc) in pool.iter().enumerate() {
            tracing::debug!(structure = index, "predicting structure");
            write_cfgs(&input_data, std::slice::from_ref(doc))?;
            self.toolchain
                .run(Tool::NnpPredict, &[INPUT_NN_FILE], dir, OutputSink::Capture)?;
            let (_, table) = read_cfgs(&dir.join(OUTPUT_DATA_FILE))?;
            predicted.extend(table);
        }

        Ok((reference, predicted))
    }

    /// Energy, forces and stress of one structure through LAMMPS.
    pub fn predict(&self, structure: &Structure) -> NnpResult<Prediction> {
        let element = self.require_element()?;
        for symbol in structure.symbol_set() {
            if symbol != element.symbol() {
                return Err(NnpError::input_validation(
                    "INPUT.SPECIES_MISMATCH",
                    format!(
                        "structure contains '{}' but the potential was fitted for '{}'",
                        symbol, element
                    ),
                ));
            }
        }

        let scratch = scratch_dir()?;
        let ff_settings = self.write_param(scratch.path())?;
        LammpsCalculator::new(&self.toolchain, ff_settings, element.atomic_mass())
            .calculate(structure, scratch.path())
    }

    /// Loads a fitted potential from its three parameter files.
    pub fn from_config(input: &Path, scaling: &Path, weights: &Path) -> NnpResult<Self> {
        Self::from_document(load_input(input)?, scaling, weights)
    }

    fn from_document(document: InputDocument, scaling: &Path, weights: &Path) -> NnpResult<Self> {
        let scaling = load_scaling(scaling)?;
        let weight_table = load_weights(weights)?;
        let network = NetworkWeights::from_table(
            &weight_table,
            &network_sizes(&document.settings.layer_sizes()),
        )?;

        Ok(Self {
            fitted: Some(FittedParameters {
                element: document.element,
                suffix: document.element.file_suffix(),
                settings: document.settings,
                weight_table,
                network,
                scaling,
            }),
            ..Self::default()
        })
    }

    /// Writes the parameter bundle into `dir`, creating it when needed.
    pub fn save(&self, dir: &Path) -> NnpResult<Vec<String>> {
        fs::create_dir_all(dir).map_err(|source| {
            NnpError::io_system(
                "IO.PARAMS_DIR",
                format!("failed to create '{}': {}", dir.display(), source),
            )
        })?;
        let ff_settings = self.write_param(dir)?;
        if let Some(rmse) = &self.rmse {
            save_rmse_history(&dir.join(RMSE_HISTORY_FILE), rmse)?;
        }
        Ok(ff_settings)
    }

    /// Reads a bundle written by [`NnPotential::save`]. The RMSE history is
    /// optional; bundles assembled by hand carry only the three trainer files.
    pub fn load(dir: &Path) -> NnpResult<Self> {
        let document = load_input(&dir.join(INPUT_NN_FILE))?;
        let weights = dir.join(weights_file_name(&document.element.file_suffix()));
        let mut potential = Self::from_document(document, &dir.join(SCALING_FILE), &weights)?;

        let history = dir.join(RMSE_HISTORY_FILE);
        if history.is_file() {
            potential.rmse = Some(load_rmse_history(&history)?);
        }
        Ok(potential)
    }

    pub fn summary(&self) -> NnpResult<PotentialSummary> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            NnpError::input_validation("INPUT.PARAMS_MISSING", "the potential is not fitted")
        })?;

        Ok(PotentialSummary {
            name: self.name.clone(),
            element: fitted.element.symbol().to_string(),
            suffix: fitted.suffix.clone(),
            r_cut: fitted.settings.r_cut(),
            num_symm_functions: fitted.settings.num_symm_functions(),
            layer_sizes: fitted.network.sizes().to_vec(),
            num_parameters: fitted.network.num_parameters(),
            epochs_trained: self.rmse.as_ref().map_or(0, RmseHistory::epochs),
            final_rmse: self.rmse.as_ref().and_then(RmseHistory::last).map(
                |(train_energy, test_energy, train_forces, test_forces)| FinalRmse {
                    train_energy,
                    test_energy,
                    train_forces,
                    test_forces,
                },
            ),
        })
    }

    fn require_element(&self) -> NnpResult<Element> {
        self.element().ok_or_else(|| {
            NnpError::input_validation(
                "INPUT.PARAMS_MISSING",
                "the weights and scaling parameters should be provided",
            )
        })
    }
}

fn scratch_dir() -> NnpResult<TempDir> {
    TempDir::new().map_err(|source| {
        NnpError::io_system(
            "IO.SCRATCH_DIR",
            format!("failed to create scratch directory: {}", source),
        )
    })
}

fn save_rmse_history(path: &Path, history: &RmseHistory) -> NnpResult<()> {
    let rendered = serde_json::to_string_pretty(history).map_err(|source| {
        NnpError::internal(
            "SYS.RMSE_SERIALIZE",
            format!("failed to serialize RMSE history: {}", source),
        )
    })?;
    fs::write(path, rendered).map_err(|source| {
        NnpError::io_system(
            "IO.ARTIFACT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

fn load_rmse_history(path: &Path) -> NnpResult<RmseHistory> {
    let source = fs::read_to_string(path).map_err(|source| {
        NnpError::io_system(
            "IO.ARTIFACT_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    serde_json::from_str(&source).map_err(|source| {
        NnpError::input_validation(
            "INPUT.RMSE_HISTORY",
            format!("failed to parse '{}': {}", path.display(), source),
        )
    })
}

fn check_species(expected: Element, found: Element) -> NnpResult<()> {
    if expected != found {
        return Err(NnpError::input_validation(
            "INPUT.SPECIES_MISMATCH",
            format!(
                "configurations contain '{}' but the potential was fitted for '{}'",
                found, expected
            ),
        ));
    }
    Ok(())
}

/// The `weights.<ZZZ>.<epochs:06>.out` file the trainer wrote last.
pub fn find_trained_weights(dir: &Path, epochs: i64) -> NnpResult<PathBuf> {
    let pattern = format!("weights.*.{:06}.out", epochs);
    let matcher = Glob::new(&pattern)
        .map_err(|source| {
            NnpError::internal(
                "SYS.WEIGHTS_GLOB",
                format!("invalid weights pattern '{}': {}", pattern, source),
            )
        })?
        .compile_matcher();

    let entries = fs::read_dir(dir).map_err(|source| {
        NnpError::io_system(
            "IO.SCRATCH_DIR",
            format!("failed to list '{}': {}", dir.display(), source),
        )
    })?;

    let mut candidates = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| matcher.is_match(Path::new(name)))
        })
        .collect::<Vec<_>>();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        NnpError::computation(
            "RUN.NNP_TRAIN_WEIGHTS",
            format!("trainer wrote no weights file matching '{}'", pattern),
        )
    })
}

/// `029` out of `weights.029.000010.out`.
fn weights_suffix(path: &Path) -> NnpResult<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').nth(1))
        .map(str::to_string)
        .ok_or_else(|| {
            NnpError::computation(
                "RUN.NNP_TRAIN_WEIGHTS",
                format!("cannot read element suffix from '{}'", path.display()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{NnPotential, PAIR_STYLE, find_trained_weights, weights_suffix};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn pair_style_matches_trainer_unit_conversions() {
        assert!(PAIR_STYLE.starts_with("pair_style        nnp dir \"./\""));
        assert!(PAIR_STYLE.ends_with("cflength 1.8897261328 cfenergy 0.0367493254"));
    }

    #[test]
    fn final_epoch_weights_are_located_by_pattern() {
        let temp = TempDir::new().expect("tempdir should be created");
        for name in [
            "weights.029.000009.out",
            "weights.029.000010.out",
            "weights.029.data",
        ] {
            fs::write(temp.path().join(name), "").expect("file staged");
        }

        let path = find_trained_weights(temp.path(), 10).expect("final epoch exists");
        assert!(path.ends_with("weights.029.000010.out"));
        assert_eq!(weights_suffix(&path).expect("suffix parses"), "029");

        let error = find_trained_weights(temp.path(), 11).expect_err("epoch 11 missing");
        assert_eq!(error.placeholder(), "RUN.NNP_TRAIN_WEIGHTS");
        assert!(weights_suffix(Path::new("weights")).is_err());
    }

    #[test]
    fn unfitted_potentials_refuse_to_write_parameters() {
        let temp = TempDir::new().expect("tempdir should be created");
        let potential = NnPotential::default();

        assert!(!potential.is_fitted());
        let error = potential
            .write_param(temp.path())
            .expect_err("nothing was fitted");
        assert_eq!(error.placeholder(), "INPUT.PARAMS_MISSING");
        assert!(potential.summary().is_err());
    }
}
