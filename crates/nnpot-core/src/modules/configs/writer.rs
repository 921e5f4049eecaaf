use crate::common::Element;
use crate::common::units::{BOHR_TO_ANGSTROM, EV_TO_HA, FORCE_EV_ANG_TO_HA_BOHR};
use crate::domain::{DataDoc, NnpError, NnpResult, Outputs, Structure};
use std::fmt::Write;

/// Renders one structure as a `begin ... end` block in Hartree/bohr units.
pub fn line_up(structure: &Structure, outputs: &Outputs) -> NnpResult<String> {
    if !structure.is_unary() {
        return Err(NnpError::input_validation(
            "INPUT.CONFIG_NOT_UNARY",
            format!(
                "structure is not unary (species: {})",
                structure.symbol_set().join(", ")
            ),
        ));
    }

    if outputs.forces.len() != structure.num_sites() {
        return Err(NnpError::input_validation(
            "INPUT.FORCE_SHAPE",
            format!(
                "{} force rows given for {} sites",
                outputs.forces.len(),
                structure.num_sites()
            ),
        ));
    }

    let mut block = String::from("begin");
    for row in structure.lattice().matrix {
        let [x, y, z] = row.map(|value| value / BOHR_TO_ANGSTROM);
        let _ = write!(block, "\nlattice {x:>15.6}{y:>15.6}{z:>15.6}");
    }

    for (site, force) in structure.sites().iter().zip(&outputs.forces) {
        let [x, y, z] = site.xyz.map(|value| value / BOHR_TO_ANGSTROM);
        let [fx, fy, fz] = force.map(|value| value * FORCE_EV_ANG_TO_HA_BOHR);
        let _ = write!(
            block,
            "\natom{x:>16.9}{y:>16.9}{z:>16.9}{species:>4}{charge:>15.9}{energy:>15.9}{fx:>15.9}{fy:>15.9}{fz:>15.9}",
            species = site.species,
            charge = 0.0,
            energy = 0.0,
        );
    }

    let _ = write!(block, "\nenergy  {:.6}", outputs.energy * EV_TO_HA);
    let _ = write!(block, "\ncharge  {:.6}", structure.charge());
    block.push_str("\nend");

    Ok(block)
}

/// Renders a whole pool and returns the element it is made of.
pub fn render_cfgs(pool: &[DataDoc]) -> NnpResult<(String, Element)> {
    let mut blocks = Vec::with_capacity(pool.len());
    let mut species: Option<String> = None;

    for doc in pool {
        blocks.push(line_up(&doc.structure, &doc.outputs)?);

        let symbol = doc.structure.symbol_set().remove(0);
        match &species {
            Some(existing) if *existing != symbol => {
                return Err(NnpError::input_validation(
                    "INPUT.CONFIG_MIXED_SPECIES",
                    format!(
                        "configuration pool mixes species '{}' and '{}'",
                        existing, symbol
                    ),
                ));
            }
            Some(_) => {}
            None => species = Some(symbol),
        }
    }

    let symbol = species.ok_or_else(|| {
        NnpError::input_validation("INPUT.CONFIG_EMPTY", "configuration pool is empty")
    })?;
    let element = Element::from_symbol(&symbol).ok_or_else(|| {
        NnpError::input_validation(
            "INPUT.CONFIG_ELEMENT",
            format!("'{}' is not a known element symbol", symbol),
        )
    })?;

    Ok((blocks.join("\n"), element))
}
