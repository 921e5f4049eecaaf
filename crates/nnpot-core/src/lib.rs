pub mod common;
pub mod data;
pub mod domain;
pub mod lammps;
pub mod modules;
pub mod numerics;
pub mod potential;
pub mod runner;

pub use domain::{DataDoc, NnpError, NnpErrorCategory, NnpResult, Outputs, Structure};
pub use potential::NnPotential;
