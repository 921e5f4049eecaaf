use crate::common::units::angstrom_to_bohr;
use crate::domain::{NnpError, NnpResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_SETTINGS_JSON: &str = include_str!("../../../params/nn_input.json");

/// How symmetry-function values are normalised before entering the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ScaleFeatures {
    None,
    Scale,
    Center,
    ScaleSigma,
}

impl ScaleFeatures {
    /// The `input.nn` keyword, or `None` when no line is written.
    pub const fn keyword(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Scale => Some("scale_symmetry_functions"),
            Self::Center => Some("center_symmetry_functions"),
            Self::ScaleSigma => Some("scale_symmetry_functions_sigma"),
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "scale_symmetry_functions" => Some(Self::Scale),
            "center_symmetry_functions" => Some(Self::Center),
            "scale_symmetry_functions_sigma" => Some(Self::ScaleSigma),
            _ => None,
        }
    }
}

impl TryFrom<u8> for ScaleFeatures {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Scale),
            2 => Ok(Self::Center),
            3 => Ok(Self::ScaleSigma),
            other => Err(format!("scale_features must be 0, 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<ScaleFeatures> for u8 {
    fn from(value: ScaleFeatures) -> Self {
        match value {
            ScaleFeatures::None => 0,
            ScaleFeatures::Scale => 1,
            ScaleFeatures::Center => 2,
            ScaleFeatures::ScaleSigma => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralSettings {
    pub cutoff_type: i64,
    pub scale_features: ScaleFeatures,
    pub scale_min_short: f64,
    pub scale_max_short: f64,
    pub hidden_layers: Vec<usize>,
    /// One activation code (`t`, `s`, `p`, ...) shared by every hidden layer.
    pub activations: String,
    #[serde(default)]
    pub normalize_nodes: bool,
}

/// Training and Kalman-filter keys, in the order the trainer expects them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingSettings {
    pub epochs: i64,
    pub updater_type: i64,
    pub parallel_mode: i64,
    pub jacobian_mode: i64,
    pub update_strategy: i64,
    pub selection_mode: i64,
    pub task_batch_size_energy: i64,
    pub task_batch_size_force: i64,
    pub random_seed: i64,
    pub test_fraction: f64,
    pub force_weight: f64,
    pub short_energy_fraction: f64,
    pub short_force_fraction: f64,
    pub short_energy_error_threshold: f64,
    pub short_force_error_threshold: f64,
    pub rmse_threshold_trials: i64,
    pub weights_min: f64,
    pub weights_max: f64,
    pub write_trainpoints: i64,
    pub write_trainforces: i64,
    pub write_weights_epoch: i64,
    pub write_neuronstats: i64,
    pub kalman_type: i64,
    pub kalman_epsilon: f64,
    pub kalman_q0: f64,
    pub kalman_qtau: f64,
    pub kalman_qmin: f64,
    pub kalman_eta: f64,
    pub kalman_etatau: f64,
    pub kalman_etamax: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderValue {
    Int(i64),
    Float(f64),
}

impl TrainingSettings {
    pub const KEYS: [&'static str; 30] = [
        "epochs",
        "updater_type",
        "parallel_mode",
        "jacobian_mode",
        "update_strategy",
        "selection_mode",
        "task_batch_size_energy",
        "task_batch_size_force",
        "random_seed",
        "test_fraction",
        "force_weight",
        "short_energy_fraction",
        "short_force_fraction",
        "short_energy_error_threshold",
        "short_force_error_threshold",
        "rmse_threshold_trials",
        "weights_min",
        "weights_max",
        "write_trainpoints",
        "write_trainforces",
        "write_weights_epoch",
        "write_neuronstats",
        "kalman_type",
        "kalman_epsilon",
        "kalman_q0",
        "kalman_qtau",
        "kalman_qmin",
        "kalman_eta",
        "kalman_etatau",
        "kalman_etamax",
    ];

    /// Key/value pairs in writer order.
    pub fn entries(&self) -> [(&'static str, HeaderValue); 30] {
        use HeaderValue::{Float, Int};
        [
            ("epochs", Int(self.epochs)),
            ("updater_type", Int(self.updater_type)),
            ("parallel_mode", Int(self.parallel_mode)),
            ("jacobian_mode", Int(self.jacobian_mode)),
            ("update_strategy", Int(self.update_strategy)),
            ("selection_mode", Int(self.selection_mode)),
            ("task_batch_size_energy", Int(self.task_batch_size_energy)),
            ("task_batch_size_force", Int(self.task_batch_size_force)),
            ("random_seed", Int(self.random_seed)),
            ("test_fraction", Float(self.test_fraction)),
            ("force_weight", Float(self.force_weight)),
            ("short_energy_fraction", Float(self.short_energy_fraction)),
            ("short_force_fraction", Float(self.short_force_fraction)),
            (
                "short_energy_error_threshold",
                Float(self.short_energy_error_threshold),
            ),
            (
                "short_force_error_threshold",
                Float(self.short_force_error_threshold),
            ),
            ("rmse_threshold_trials", Int(self.rmse_threshold_trials)),
            ("weights_min", Float(self.weights_min)),
            ("weights_max", Float(self.weights_max)),
            ("write_trainpoints", Int(self.write_trainpoints)),
            ("write_trainforces", Int(self.write_trainforces)),
            ("write_weights_epoch", Int(self.write_weights_epoch)),
            ("write_neuronstats", Int(self.write_neuronstats)),
            ("kalman_type", Int(self.kalman_type)),
            ("kalman_epsilon", Float(self.kalman_epsilon)),
            ("kalman_q0", Float(self.kalman_q0)),
            ("kalman_qtau", Float(self.kalman_qtau)),
            ("kalman_qmin", Float(self.kalman_qmin)),
            ("kalman_eta", Float(self.kalman_eta)),
            ("kalman_etatau", Float(self.kalman_etatau)),
            ("kalman_etamax", Float(self.kalman_etamax)),
        ]
    }

    /// Assigns one header value by key; returns `Ok(false)` for unknown keys
    /// and `Err(kind)` when a float is given for an integer key.
    pub(super) fn assign(&mut self, key: &str, value: HeaderValue) -> Result<bool, &'static str> {
        let as_float = match value {
            HeaderValue::Int(value) => value as f64,
            HeaderValue::Float(value) => value,
        };
        let as_int = || match value {
            HeaderValue::Int(value) => Ok(value),
            HeaderValue::Float(_) => Err("integer"),
        };

        match key {
            "epochs" => self.epochs = as_int()?,
            "updater_type" => self.updater_type = as_int()?,
            "parallel_mode" => self.parallel_mode = as_int()?,
            "jacobian_mode" => self.jacobian_mode = as_int()?,
            "update_strategy" => self.update_strategy = as_int()?,
            "selection_mode" => self.selection_mode = as_int()?,
            "task_batch_size_energy" => self.task_batch_size_energy = as_int()?,
            "task_batch_size_force" => self.task_batch_size_force = as_int()?,
            "random_seed" => self.random_seed = as_int()?,
            "test_fraction" => self.test_fraction = as_float,
            "force_weight" => self.force_weight = as_float,
            "short_energy_fraction" => self.short_energy_fraction = as_float,
            "short_force_fraction" => self.short_force_fraction = as_float,
            "short_energy_error_threshold" => self.short_energy_error_threshold = as_float,
            "short_force_error_threshold" => self.short_force_error_threshold = as_float,
            "rmse_threshold_trials" => self.rmse_threshold_trials = as_int()?,
            "weights_min" => self.weights_min = as_float,
            "weights_max" => self.weights_max = as_float,
            "write_trainpoints" => self.write_trainpoints = as_int()?,
            "write_trainforces" => self.write_trainforces = as_int()?,
            "write_weights_epoch" => self.write_weights_epoch = as_int()?,
            "write_neuronstats" => self.write_neuronstats = as_int()?,
            "kalman_type" => self.kalman_type = as_int()?,
            "kalman_epsilon" => self.kalman_epsilon = as_float,
            "kalman_q0" => self.kalman_q0 = as_float,
            "kalman_qtau" => self.kalman_qtau = as_float,
            "kalman_qmin" => self.kalman_qmin = as_float,
            "kalman_eta" => self.kalman_eta = as_float,
            "kalman_etatau" => self.kalman_etatau = as_float,
            "kalman_etamax" => self.kalman_etamax = as_float,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Symmetry-function parameter grid; lengths in Angstrom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymmetryFunctionSettings {
    pub r_cut: f64,
    pub r_etas: Vec<f64>,
    pub r_shift: Vec<f64>,
    pub a_etas: Vec<f64>,
    pub zetas: Vec<f64>,
    pub lambdas: Vec<i32>,
}

/// One `symfunction_short` row, lengths in bohr.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymmetryFunction {
    Radial {
        eta: f64,
        r_shift: f64,
        r_cut: f64,
    },
    Angular {
        eta: f64,
        lambda: i32,
        zeta: f64,
        r_cut: f64,
    },
}

impl SymmetryFunction {
    pub fn render(&self, element: &str) -> String {
        match *self {
            Self::Radial { eta, r_shift, r_cut } => format!(
                "symfunction_short {element}  2 {element}    {eta:.7}    {r_shift:.7}    {r_cut:.7}"
            ),
            Self::Angular {
                eta,
                lambda,
                zeta,
                r_cut,
            } => format!(
                "symfunction_short {element}  3 {element} {element}    {eta:.7} {lambda:>2} {zeta:.7}   {r_cut:.7}"
            ),
        }
    }
}

impl SymmetryFunctionSettings {
    pub fn num_radial(&self) -> usize {
        self.r_etas.len() * self.r_shift.len()
    }

    pub fn num_angular(&self) -> usize {
        self.a_etas.len() * self.lambdas.len() * self.zetas.len()
    }

    pub fn num_symm_functions(&self) -> usize {
        self.num_radial() + self.num_angular()
    }

    /// Radial rows for `r_etas x r_shift` then angular rows for
    /// `a_etas x lambdas x zetas`, converted to bohr.
    pub fn functions(&self) -> Vec<SymmetryFunction> {
        let r_cut = angstrom_to_bohr(self.r_cut);
        let mut functions = Vec::with_capacity(self.num_symm_functions());

        for &eta in &self.r_etas {
            for &shift in &self.r_shift {
                functions.push(SymmetryFunction::Radial {
                    eta,
                    r_shift: angstrom_to_bohr(shift),
                    r_cut,
                });
            }
        }

        for &eta in &self.a_etas {
            for &lambda in &self.lambdas {
                for &zeta in &self.zetas {
                    functions.push(SymmetryFunction::Angular {
                        eta,
                        lambda,
                        zeta,
                        r_cut,
                    });
                }
            }
        }

        functions
    }
}

/// Everything written to `input.nn` besides the element itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NnpSettings {
    #[serde(default)]
    pub atom_energy: Option<f64>,
    pub general: GeneralSettings,
    pub additional: TrainingSettings,
    pub symmetry_function: SymmetryFunctionSettings,
}

impl NnpSettings {
    /// The settings shipped in `params/nn_input.json`.
    pub fn defaults() -> NnpResult<Self> {
        Self::from_value(defaults_value()?)
    }

    /// Deep-merges `overrides` over the shipped defaults.
    pub fn with_overrides(overrides: Value) -> NnpResult<Self> {
        let mut merged = defaults_value()?;
        merge_json(&mut merged, overrides);
        Self::from_value(merged)
    }

    fn from_value(value: Value) -> NnpResult<Self> {
        let settings: Self = serde_json::from_value(value).map_err(|source| {
            NnpError::input_validation(
                "INPUT.SETTINGS",
                format!("invalid NNP settings: {}", source),
            )
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> NnpResult<()> {
        if self.general.hidden_layers.is_empty() {
            return Err(NnpError::input_validation(
                "INPUT.SETTINGS",
                "at least one hidden layer is required",
            ));
        }
        if self.general.activations.trim().is_empty()
            || self.general.activations.contains(char::is_whitespace)
        {
            return Err(NnpError::input_validation(
                "INPUT.SETTINGS",
                format!(
                    "activation code '{}' must be a single token",
                    self.general.activations
                ),
            ));
        }
        if self.symmetry_function.num_symm_functions() == 0 {
            return Err(NnpError::input_validation(
                "INPUT.SETTINGS",
                "the symmetry-function grid is empty",
            ));
        }
        if self.symmetry_function.r_cut <= 0.0 {
            return Err(NnpError::input_validation(
                "INPUT.SETTINGS",
                format!(
                    "r_cut must be positive, got {}",
                    self.symmetry_function.r_cut
                ),
            ));
        }
        Ok(())
    }

    pub fn num_symm_functions(&self) -> usize {
        self.symmetry_function.num_symm_functions()
    }

    /// Input width followed by the hidden layer widths.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.general.hidden_layers.len() + 1);
        sizes.push(self.num_symm_functions());
        sizes.extend_from_slice(&self.general.hidden_layers);
        sizes
    }

    pub fn epochs(&self) -> i64 {
        self.additional.epochs
    }

    pub fn r_cut(&self) -> f64 {
        self.symmetry_function.r_cut
    }
}

fn defaults_value() -> NnpResult<Value> {
    serde_json::from_str(DEFAULT_SETTINGS_JSON).map_err(|source| {
        NnpError::internal(
            "SYS.DEFAULT_SETTINGS",
            format!("embedded default settings are invalid: {}", source),
        )
    })
}

/// Objects merge key by key; every other value replaces the base.
pub fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
