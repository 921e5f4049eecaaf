pub mod errors;

pub use errors::{FormatError, FormatResult, NnpError, NnpErrorCategory, NnpResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Periodic cell stored as three row vectors in Angstrom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    pub fn new(matrix: [[f64; 3]; 3]) -> Self {
        Self { matrix }
    }

    pub fn cubic(a: f64) -> Self {
        Self::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    pub fn fractional_to_cartesian(&self, abc: [f64; 3]) -> [f64; 3] {
        let mut xyz = [0.0; 3];
        for (row, coefficient) in self.matrix.iter().zip(abc) {
            for axis in 0..3 {
                xyz[axis] += coefficient * row[axis];
            }
        }
        xyz
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub species: String,
    pub xyz: [f64; 3],
}

impl Site {
    pub fn new(species: impl Into<String>, xyz: [f64; 3]) -> Self {
        Self {
            species: species.into(),
            xyz,
        }
    }
}

/// Periodic atomic structure in Cartesian Angstrom coordinates.
///
/// The serde representation follows the `Structure.as_dict()` layout used by
/// pymatgen so dataset files produced by that ecosystem load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStructure", into = "RawStructure")]
pub struct Structure {
    lattice: Lattice,
    sites: Vec<Site>,
    charge: f64,
}

impl Structure {
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> Self {
        Self {
            lattice,
            sites,
            charge: 0.0,
        }
    }

    pub fn from_cartesian(
        lattice: Lattice,
        species: &[impl AsRef<str>],
        coords: &[[f64; 3]],
    ) -> NnpResult<Self> {
        if species.len() != coords.len() {
            return Err(NnpError::input_validation(
                "INPUT.STRUCTURE_SHAPE",
                format!(
                    "structure has {} species but {} coordinates",
                    species.len(),
                    coords.len()
                ),
            ));
        }

        let sites = species
            .iter()
            .zip(coords)
            .map(|(specie, xyz)| Site::new(specie.as_ref(), *xyz))
            .collect();
        Ok(Self::new(lattice, sites))
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn symbol_set(&self) -> Vec<String> {
        self.sites
            .iter()
            .map(|site| site.species.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_unary(&self) -> bool {
        self.symbol_set().len() == 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawStructure {
    lattice: Lattice,
    sites: Vec<RawSite>,
    #[serde(default)]
    charge: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSite {
    species: Vec<RawSpecies>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    xyz: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    abc: Option<[f64; 3]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSpecies {
    element: String,
    #[serde(default = "full_occupancy")]
    occu: f64,
}

fn full_occupancy() -> f64 {
    1.0
}

impl TryFrom<RawStructure> for Structure {
    type Error = String;

    fn try_from(raw: RawStructure) -> Result<Self, Self::Error> {
        let mut sites = Vec::with_capacity(raw.sites.len());
        for (index, site) in raw.sites.into_iter().enumerate() {
            let [species] = <[RawSpecies; 1]>::try_from(site.species).map_err(|species| {
                format!(
                    "site {} must carry exactly one species, found {}",
                    index,
                    species.len()
                )
            })?;
            let xyz = match (site.xyz, site.abc) {
                (Some(xyz), _) => xyz,
                (None, Some(abc)) => raw.lattice.fractional_to_cartesian(abc),
                (None, None) => return Err(format!("site {} has no coordinates", index)),
            };
            sites.push(Site::new(species.element, xyz));
        }

        Ok(Structure {
            lattice: raw.lattice,
            sites,
            charge: raw.charge.unwrap_or(0.0),
        })
    }
}

impl From<Structure> for RawStructure {
    fn from(structure: Structure) -> Self {
        RawStructure {
            lattice: structure.lattice,
            sites: structure
                .sites
                .into_iter()
                .map(|site| RawSite {
                    species: vec![RawSpecies {
                        element: site.species,
                        occu: 1.0,
                    }],
                    xyz: Some(site.xyz),
                    abc: None,
                })
                .collect(),
            charge: Some(structure.charge),
        }
    }
}

/// Reference or predicted properties attached to one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    pub energy: f64,
    pub forces: Vec<[f64; 3]>,
    #[serde(default)]
    pub virial_stress: [f64; 6],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDoc {
    pub structure: Structure,
    pub num_atoms: usize,
    pub outputs: Outputs,
}
