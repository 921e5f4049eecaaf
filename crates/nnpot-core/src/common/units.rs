//! Unit conversions between the eV/Angstrom world of the datasets and the
//! Hartree/bohr world of the trainer.

pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;
pub const HARTREE_TO_EV: f64 = 27.211386245988;
pub const EV_TO_HA: f64 = 1.0 / HARTREE_TO_EV;

/// eV/Angstrom to Hartree/bohr.
pub const FORCE_EV_ANG_TO_HA_BOHR: f64 = EV_TO_HA * BOHR_TO_ANGSTROM;

pub const BAR_TO_KBAR: f64 = 1.0e-3;

pub fn angstrom_to_bohr(value: f64) -> f64 {
    value / BOHR_TO_ANGSTROM
}

pub fn bohr_to_angstrom(value: f64) -> f64 {
    value * BOHR_TO_ANGSTROM
}
