//! `input.data` / `output.data` configuration files.

mod parser;
mod writer;

pub use parser::parse_cfgs;
pub use writer::{line_up, render_cfgs};

use super::serialization::{read_text_artifact, write_text_artifact};
use crate::common::Element;
use crate::data::{TargetTable, convert_docs};
use crate::domain::{DataDoc, NnpResult};
use std::path::Path;

pub const INPUT_DATA_FILE: &str = "input.data";
pub const OUTPUT_DATA_FILE: &str = "output.data";

/// Writes a unary pool as trainer configurations and returns its element.
pub fn write_cfgs(path: &Path, pool: &[DataDoc]) -> NnpResult<Element> {
    let (content, element) = render_cfgs(pool)?;
    write_text_artifact(path, &content)?;
    Ok(element)
}

pub fn read_cfgs(path: &Path) -> NnpResult<(Vec<DataDoc>, TargetTable)> {
    let content = read_text_artifact(path)?;
    let docs = parse_cfgs("configuration file", &content)?;
    let (_, table) = convert_docs(&docs, false)?;
    Ok((docs, table))
}

#[cfg(test)]
mod tests {
    use super::{line_up, parse_cfgs, read_cfgs, render_cfgs, write_cfgs};
    use crate::data::{TargetKind, doc_from};
    use crate::domain::{DataDoc, Lattice, Structure};
    use std::fs;
    use tempfile::TempDir;

    const COPPER_BLOCK: &str = "begin\n\
lattice        6.803014       0.000000       0.000000\n\
lattice        0.000000       6.803014       0.000000\n\
lattice        0.000000       0.000000       6.803014\n\
atom     0.000000000     0.000000000     0.000000000  Cu    0.000000000    0.000000000    0.001944690    0.000000000   -0.003889381\n\
atom     3.401507024     3.401507024     0.000000000  Cu    0.000000000    0.000000000   -0.001944690    0.000000000    0.003889381\n\
energy  -0.257245\n\
charge  0.000000\n\
end";

    fn copper_doc() -> DataDoc {
        let structure = Structure::from_cartesian(
            Lattice::cubic(3.6),
            &["Cu", "Cu"],
            &[[0.0, 0.0, 0.0], [1.8, 1.8, 0.0]],
        )
        .expect("copper cell is well formed");
        doc_from(
            structure,
            Some(-7.0),
            Some(vec![[0.1, 0.0, -0.2], [-0.1, 0.0, 0.2]]),
            None,
        )
    }

    #[test]
    fn line_up_matches_trainer_layout() {
        let doc = copper_doc();
        let block = line_up(&doc.structure, &doc.outputs).expect("unary structure renders");
        assert_eq!(block, COPPER_BLOCK);
    }

    #[test]
    fn non_unary_structures_are_rejected() {
        let structure = Structure::from_cartesian(
            Lattice::cubic(4.0),
            &["Ni", "Al"],
            &[[0.0, 0.0, 0.0], [2.0, 2.0, 2.0]],
        )
        .expect("shape matches");
        let doc = doc_from(structure, Some(-1.0), None, None);

        let error = line_up(&doc.structure, &doc.outputs).expect_err("binary structure");
        assert_eq!(error.placeholder(), "INPUT.CONFIG_NOT_UNARY");
        assert!(error.message().contains("structure is not unary"));
    }

    #[test]
    fn pools_are_joined_without_trailing_newline() {
        let (content, element) =
            render_cfgs(&[copper_doc(), copper_doc()]).expect("pool renders");

        assert_eq!(element.symbol(), "Cu");
        assert_eq!(content, format!("{COPPER_BLOCK}\n{COPPER_BLOCK}"));
        assert!(!content.ends_with('\n'));
    }

    #[test]
    fn mixed_species_pools_are_rejected() {
        let nickel = Structure::from_cartesian(Lattice::cubic(3.5), &["Ni"], &[[0.0; 3]])
            .expect("nickel cell is well formed");
        let pool = vec![copper_doc(), doc_from(nickel, Some(-5.0), None, None)];

        let error = render_cfgs(&pool).expect_err("species differ");
        assert_eq!(error.placeholder(), "INPUT.CONFIG_MIXED_SPECIES");
        assert_eq!(
            render_cfgs(&[]).expect_err("empty pool").placeholder(),
            "INPUT.CONFIG_EMPTY"
        );
    }

    #[test]
    fn written_configurations_read_back_in_ev_and_angstrom() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("input.data");

        let element = write_cfgs(&path, &[copper_doc()]).expect("configs write");
        assert_eq!(element.atomic_number(), 29);
        assert_eq!(fs::read_to_string(&path).expect("file readable"), COPPER_BLOCK);

        let (docs, table) = read_cfgs(&path).expect("configs read");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].num_atoms, 2);
        assert_eq!(docs[0].structure.symbol_set(), vec!["Cu"]);

        let lattice = docs[0].structure.lattice().matrix;
        assert!((lattice[0][0] - 3.6).abs() < 1.0e-5);
        let second = docs[0].structure.sites()[1].xyz;
        assert!((second[0] - 1.8).abs() < 1.0e-8);
        assert!((docs[0].outputs.energy + 7.0).abs() < 1.0e-4);
        assert!((docs[0].outputs.forces[0][2] + 0.2).abs() < 1.0e-6);

        assert_eq!(table.len(), 7);
        assert_eq!(table.rows[0].dtype, TargetKind::Energy);
        assert_eq!(table.rows[0].n, 2);
    }

    #[test]
    fn trainer_output_blocks_with_comments_are_parsed() {
        let content = "begin\n\
comment predicted by nnp-predict\n\
lattice 10.0 0.0 0.0\n\
lattice 0.0 10.0 0.0\n\
lattice 0.0 0.0 10.0\n\
atom 0.0 0.0 0.0 Mo 0.0 0.0 0.01 0.0 0.0\n\
energy -0.5\n\
charge 0.0\n\
end\n";

        let docs = parse_cfgs("output.data", content).expect("block parses");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].structure.sites()[0].species, "Mo");
        assert!((docs[0].outputs.energy + 13.605693).abs() < 1.0e-5);
    }

    #[test]
    fn truncated_atom_rows_are_format_errors() {
        let content = "begin\nlattice 1 0 0\nlattice 0 1 0\nlattice 0 0 1\natom 0 0 0 Mo\nend";
        let error = parse_cfgs("output.data", content).expect_err("atom row is truncated");
        assert!(error.to_string().contains("expected 9 columns, found 4"));
    }

    #[test]
    fn blocks_without_energy_are_inconsistent() {
        let content = "begin\nlattice 1 0 0\nlattice 0 1 0\nlattice 0 0 1\nend";
        let error = parse_cfgs("output.data", content).expect_err("energy is missing");
        assert!(error.to_string().contains("no energy line"));
    }
}
