//! `weights.XXX.data` tables and the dense network they describe.

mod model;
mod parser;

pub use model::{NetworkWeights, WeightEntry, WeightKind, WeightTable};
pub use parser::parse_weights;

use super::serialization::{read_text_artifact, write_text_artifact};
use crate::domain::NnpResult;
use std::path::Path;

pub fn weights_file_name(suffix: &str) -> String {
    format!("weights.{suffix}.data")
}

/// Layer widths including the single linear output node.
pub fn network_sizes(layer_sizes: &[usize]) -> Vec<usize> {
    let mut sizes = layer_sizes.to_vec();
    sizes.push(1);
    sizes
}

pub fn load_weights(path: &Path) -> NnpResult<WeightTable> {
    let content = read_text_artifact(path)?;
    Ok(parse_weights(&content)?)
}

pub fn write_weights(path: &Path, table: &WeightTable) -> NnpResult<()> {
    write_text_artifact(path, &table.render())
}

#[cfg(test)]
mod tests {
    use super::{
        NetworkWeights, WeightKind, load_weights, network_sizes, parse_weights,
        weights_file_name, write_weights,
    };
    use std::fs;
    use tempfile::TempDir;

    const TINY_WEIGHTS: &str = "\
################################################################################
# Neural network connection values (weights and biases).
################################################################################
  1.0000000000000000E-01 a         1     0     1     1     1
 -2.0000000000000000E-01 a         2     0     1     1     2
  3.0000000000000000E-01 a         3     0     2     1     1
 -4.0000000000000000E-01 a         4     0     2     1     2
  5.0000000000000000E-01 b         5     1     1
 -6.0000000000000000E-01 b         6     1     2
  7.0000000000000000E-01 a         7     1     1     2     1
 -8.0000000000000000E-01 a         8     1     2     2     1
  9.0000000000000000E-01 b         9     2     1
";

    #[test]
    fn tables_keep_connection_and_bias_rows() {
        let table = parse_weights(TINY_WEIGHTS).expect("weights parse");

        assert_eq!(table.len(), 9);
        assert_eq!(table.entries[0].kind, WeightKind::Connection);
        assert_eq!(table.entries[0].end, Some((1, 1)));
        assert_eq!(table.entries[4].kind, WeightKind::Bias);
        assert_eq!(table.entries[4].end, None);
        assert_eq!(table.entries[7].value, -0.8);
    }

    #[test]
    fn network_matrices_are_filled_by_neuron_index() {
        let table = parse_weights(TINY_WEIGHTS).expect("weights parse");
        let network =
            NetworkWeights::from_table(&table, &network_sizes(&[2, 2])).expect("layout matches");

        assert_eq!(network.sizes(), &[2, 2, 1]);
        let first = &network.weights()[0];
        assert_eq!((first.nrows(), first.ncols()), (2, 2));
        assert_eq!(first[(0, 1)], -0.2);
        assert_eq!(first[(1, 0)], 0.3);
        assert_eq!(network.weights()[1][(1, 0)], -0.8);
        assert_eq!(network.biases()[0], vec![0.5, -0.6]);
        assert_eq!(network.biases()[1], vec![0.9]);
        assert_eq!(network.num_parameters(), 9);
    }

    #[test]
    fn incomplete_or_oversized_tables_are_rejected() {
        let table = parse_weights(TINY_WEIGHTS).expect("weights parse");

        let error = NetworkWeights::from_table(&table, &network_sizes(&[3, 2]))
            .expect_err("third input has no connections");
        assert!(error.message().contains("incomplete"));

        let error = NetworkWeights::from_table(&table, &network_sizes(&[1, 2]))
            .expect_err("second input does not exist");
        assert_eq!(error.placeholder(), "INPUT.WEIGHTS_SHAPE");
    }

    #[test]
    fn malformed_rows_are_format_errors() {
        let error = parse_weights("0.1 a 1 0 1 1").expect_err("connection row is short");
        assert!(error.to_string().contains("expected 7 columns, found 6"));

        let error = parse_weights("0.1 c 1 0 1").expect_err("unknown row type");
        assert!(error.to_string().contains("weight type"));

        let error = parse_weights("abc b 1 1 1").expect_err("value is not a float");
        assert!(error.to_string().contains("'abc'"));
    }

    #[test]
    fn written_weights_use_fixed_columns() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join(weights_file_name("029"));
        let table = parse_weights(TINY_WEIGHTS).expect("weights parse");

        write_weights(&path, &table).expect("weights write");
        let written = fs::read_to_string(&path).expect("weights readable");
        let lines = written.lines().collect::<Vec<_>>();

        assert!(path.ends_with("weights.029.data"));
        assert_eq!(
            lines[0],
            "1.0000000000000000E-01 a         1     0     1     1     1"
        );
        assert_eq!(lines[4], "5.0000000000000000E-01 b         5     1     1");
        assert!(!written.ends_with('\n'));
        assert_eq!(load_weights(&path).expect("weights reload"), table);
    }
}
