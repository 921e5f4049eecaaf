//! Single-point energy, force and stress evaluation through LAMMPS.

mod files;
mod parser;
pub mod prism;

pub use files::{
    DATA_FILE, FORCE_DUMP_FILE, LOG_FILE, SCRIPT_FILE, render_data_file, render_script,
};
pub use parser::{parse_force_dump, parse_thermo};
pub use prism::Prism;

use crate::common::units::BAR_TO_KBAR;
use crate::domain::{NnpError, NnpResult, Structure};
use crate::modules::serialization::{read_text_artifact, write_text_artifact};
use crate::runner::{OutputSink, Tool, Toolchain};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Energy (eV), forces (eV/Angstrom) and stress (kbar, `[xx, yy, zz, xy, yz, xz]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub energy: f64,
    pub forces: Vec<[f64; 3]>,
    pub stress: [f64; 6],
}

#[derive(Debug, Clone)]
pub struct LammpsCalculator<'a> {
    toolchain: &'a Toolchain,
    ff_settings: Vec<String>,
    mass: f64,
}

impl<'a> LammpsCalculator<'a> {
    pub fn new(toolchain: &'a Toolchain, ff_settings: Vec<String>, mass: f64) -> Self {
        Self {
            toolchain,
            ff_settings,
            mass,
        }
    }

    /// Runs one static calculation inside `work_dir`, which must already hold
    /// every file the force field lines refer to.
    pub fn calculate(&self, structure: &Structure, work_dir: &Path) -> NnpResult<Prediction> {
        self.toolchain.require(Tool::Lammps)?;

        let prism = Prism::from_lattice(structure.lattice())?;
        write_text_artifact(
            &work_dir.join(DATA_FILE),
            &render_data_file(structure, &prism, self.mass),
        )?;
        write_text_artifact(
            &work_dir.join(SCRIPT_FILE),
            &render_script(&self.ff_settings),
        )?;

        self.toolchain.run(
            Tool::Lammps,
            &["-in", SCRIPT_FILE, "-log", LOG_FILE],
            work_dir,
            OutputSink::Capture,
        )?;

        let log = read_text_artifact(&work_dir.join(LOG_FILE))?;
        let (energy, pressure) = parse_thermo(&log)?;
        let dump = read_text_artifact(&work_dir.join(FORCE_DUMP_FILE))?;
        let box_forces = parse_force_dump(&dump, structure.num_sites())?;

        let stress = prism
            .tensor_from_box(pressure)
            .map(|component| component * BAR_TO_KBAR);
        let forces = box_forces
            .into_iter()
            .map(|force| prism.from_box(force))
            .collect();

        if !energy.is_finite() {
            return Err(NnpError::computation(
                "RUN.LAMMPS_RESULT",
                format!("LAMMPS reported a non-finite energy ({})", energy),
            ));
        }

        Ok(Prediction {
            energy,
            forces,
            stress,
        })
    }
}
