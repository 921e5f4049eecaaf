use crate::domain::{NnpError, NnpResult};
use faer::Mat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightKind {
    Connection,
    Bias,
}

impl WeightKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Connection => "a",
            Self::Bias => "b",
        }
    }
}

/// One row of `weights.XXX.data`. Layers are 0-based, neurons 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
    /// The value exactly as the trainer printed it.
    pub value_token: String,
    pub value: f64,
    pub kind: WeightKind,
    pub index: usize,
    pub start_layer: usize,
    pub start_neuron: usize,
    /// `(end_layer, end_neuron)` for connections.
    pub end: Option<(usize, usize)>,
}

impl WeightEntry {
    pub fn render(&self) -> String {
        match self.end {
            Some((end_layer, end_neuron)) => format!(
                "{:>18}{:>2}{:>10}{:>6}{:>6}{:>6}{:>6}",
                self.value_token,
                self.kind.code(),
                self.index,
                self.start_layer,
                self.start_neuron,
                end_layer,
                end_neuron
            ),
            None => format!(
                "{:>18}{:>2}{:>10}{:>6}{:>6}",
                self.value_token,
                self.kind.code(),
                self.index,
                self.start_layer,
                self.start_neuron
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    pub entries: Vec<WeightEntry>,
}

impl WeightTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(WeightEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Dense per-layer parameters of a feed-forward network.
///
/// `weights[l]` maps layer `l` to layer `l + 1` and has shape
/// `sizes[l] x sizes[l + 1]`; `biases[l]` belongs to layer `l + 1`.
#[derive(Debug, Clone)]
pub struct NetworkWeights {
    sizes: Vec<usize>,
    weights: Vec<Mat<f64>>,
    biases: Vec<Vec<f64>>,
}

impl NetworkWeights {
    /// Rebuilds the matrices for a network whose layers have `sizes`
    /// (input width first, output width last).
    pub fn from_table(table: &WeightTable, sizes: &[usize]) -> NnpResult<Self> {
        if sizes.len() < 2 || sizes.contains(&0) {
            return Err(NnpError::input_validation(
                "INPUT.WEIGHTS_SHAPE",
                format!("invalid network layout {:?}", sizes),
            ));
        }

        let transitions = sizes.len() - 1;
        let mut connections = (0..transitions)
            .map(|layer| vec![None; sizes[layer] * sizes[layer + 1]])
            .collect::<Vec<Vec<Option<f64>>>>();
        let mut biases = (1..sizes.len())
            .map(|layer| vec![None; sizes[layer]])
            .collect::<Vec<Vec<Option<f64>>>>();

        for entry in &table.entries {
            match entry.end {
                Some((end_layer, end_neuron)) => {
                    let layer = entry.start_layer;
                    if end_layer != layer + 1 || end_layer >= sizes.len() {
                        return Err(out_of_range(entry, sizes));
                    }
                    let (row, col) = neuron_slot(entry.start_neuron, sizes[layer])
                        .zip(neuron_slot(end_neuron, sizes[end_layer]))
                        .ok_or_else(|| out_of_range(entry, sizes))?;
                    connections[layer][row * sizes[end_layer] + col] = Some(entry.value);
                }
                None => {
                    let layer = entry.start_layer;
                    if layer == 0 || layer >= sizes.len() {
                        return Err(out_of_range(entry, sizes));
                    }
                    let slot = neuron_slot(entry.start_neuron, sizes[layer])
                        .ok_or_else(|| out_of_range(entry, sizes))?;
                    biases[layer - 1][slot] = Some(entry.value);
                }
            }
        }

        if let Some(layer) = connections.iter().position(|values| values.contains(&None)) {
            return Err(NnpError::input_validation(
                "INPUT.WEIGHTS_SHAPE",
                format!(
                    "connections from layer {} to layer {} are incomplete",
                    layer,
                    layer + 1
                ),
            ));
        }
        if let Some(layer) = biases.iter().position(|values| values.contains(&None)) {
            return Err(NnpError::input_validation(
                "INPUT.WEIGHTS_SHAPE",
                format!("biases of layer {} are incomplete", layer + 1),
            ));
        }

        let weights = connections
            .iter()
            .enumerate()
            .map(|(layer, values)| {
                let cols = sizes[layer + 1];
                Mat::from_fn(sizes[layer], cols, |row, col| {
                    values[row * cols + col].unwrap_or_default()
                })
            })
            .collect();
        let biases = biases
            .into_iter()
            .map(|values| values.into_iter().flatten().collect())
            .collect();

        Ok(Self {
            sizes: sizes.to_vec(),
            weights,
            biases,
        })
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn weights(&self) -> &[Mat<f64>] {
        &self.weights
    }

    pub fn biases(&self) -> &[Vec<f64>] {
        &self.biases
    }

    pub fn num_parameters(&self) -> usize {
        self.weights
            .iter()
            .map(|matrix| matrix.nrows() * matrix.ncols())
            .sum::<usize>()
            + self.biases.iter().map(Vec::len).sum::<usize>()
    }
}

fn neuron_slot(neuron: usize, width: usize) -> Option<usize> {
    (1..=width).contains(&neuron).then(|| neuron - 1)
}

fn out_of_range(entry: &WeightEntry, sizes: &[usize]) -> NnpError {
    NnpError::input_validation(
        "INPUT.WEIGHTS_SHAPE",
        format!(
            "weight entry {} ({}) does not fit network layout {:?}",
            entry.index,
            entry.kind.code(),
            sizes
        ),
    )
}
