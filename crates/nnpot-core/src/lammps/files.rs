use super::prism::Prism;
use crate::domain::Structure;
use std::fmt::Write;

pub const DATA_FILE: &str = "data.static";
pub const SCRIPT_FILE: &str = "in.static";
pub const LOG_FILE: &str = "log.lammps";
pub const FORCE_DUMP_FILE: &str = "force.dump";

/// `atom_style atomic` data file with a single atom type.
pub fn render_data_file(structure: &Structure, prism: &Prism, mass: f64) -> String {
    let mut data = String::from("# single-point structure\n\n");
    let _ = writeln!(data, "{} atoms", structure.num_sites());
    data.push_str("1 atom types\n\n");
    let _ = writeln!(data, "0.0 {:.10} xlo xhi", prism.xhi);
    let _ = writeln!(data, "0.0 {:.10} ylo yhi", prism.yhi);
    let _ = writeln!(data, "0.0 {:.10} zlo zhi", prism.zhi);
    if !prism.is_orthogonal() {
        let _ = writeln!(
            data,
            "{:.10} {:.10} {:.10} xy xz yz",
            prism.xy, prism.xz, prism.yz
        );
    }

    data.push_str("\nMasses\n\n");
    let _ = writeln!(data, "1 {}", mass);
    data.push_str("\nAtoms # atomic\n\n");
    for (id, site) in (1..).zip(structure.sites()) {
        let [x, y, z] = prism.to_box(site.xyz);
        let _ = writeln!(data, "{} 1 {:.10} {:.10} {:.10}", id, x, y, z);
    }

    data
}

/// Single-point script: energy and pressure tensor in the thermo row, forces
/// in a dump sorted by atom id.
pub fn render_script(ff_settings: &[String]) -> String {
    let mut lines = vec![
        "units metal".to_string(),
        "atom_style atomic".to_string(),
        "boundary p p p".to_string(),
        format!("read_data {}", DATA_FILE),
    ];
    lines.extend(ff_settings.iter().cloned());
    lines.extend([
        format!("dump forces all custom 1 {} id fx fy fz", FORCE_DUMP_FILE),
        "dump_modify forces sort id format float %20.15g".to_string(),
        "thermo_style custom pe pxx pyy pzz pxy pxz pyz".to_string(),
        "thermo_modify format float %20.15g".to_string(),
        "run 0".to_string(),
    ]);
    lines.join("\n") + "\n"
}
