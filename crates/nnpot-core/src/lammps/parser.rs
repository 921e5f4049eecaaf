use crate::domain::{FormatError, FormatResult};

const LOG_LABEL: &str = "log.lammps";
const DUMP_LABEL: &str = "force.dump";
const THERMO_HEADER: [&str; 7] = ["PotEng", "Pxx", "Pyy", "Pzz", "Pxy", "Pxz", "Pyz"];

/// Last thermo row of a `pe pxx pyy pzz pxy pxz pyz` run:
/// energy (eV) and the box-frame `[xx, yy, zz, xy, xz, yz]` pressure (bar).
pub fn parse_thermo(content: &str) -> FormatResult<(f64, [f64; 6])> {
    let lines = content.lines().collect::<Vec<_>>();
    let mut last_row = None;

    for (index, line) in lines.iter().enumerate() {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens != THERMO_HEADER {
            continue;
        }
        let Some(row) = lines.get(index + 1) else {
            continue;
        };
        last_row = Some((index + 2, *row));
    }

    let (line, row) = last_row.ok_or_else(|| FormatError::MissingKey {
        file: LOG_LABEL,
        key: THERMO_HEADER.join(" "),
    })?;
    let values = parse_floats(LOG_LABEL, line, row, THERMO_HEADER.len())?;

    Ok((
        values[0],
        [values[1], values[2], values[3], values[4], values[5], values[6]],
    ))
}

/// Box-frame forces from an `id fx fy fz` dump, ordered by atom id.
pub fn parse_force_dump(content: &str, num_atoms: usize) -> FormatResult<Vec<[f64; 3]>> {
    let mut lines = content.lines().enumerate();
    let mut columns = None;

    for (_, line) in lines.by_ref() {
        if let Some(header) = line.strip_prefix("ITEM: ATOMS") {
            columns = Some(header.split_whitespace().collect::<Vec<_>>());
            break;
        }
    }

    let columns = columns.ok_or_else(|| FormatError::MissingKey {
        file: DUMP_LABEL,
        key: "ITEM: ATOMS".to_string(),
    })?;
    let position = |name: &str| {
        columns
            .iter()
            .position(|column| *column == name)
            .ok_or_else(|| FormatError::MissingKey {
                file: DUMP_LABEL,
                key: name.to_string(),
            })
    };
    let id_column = position("id")?;
    let force_columns = [position("fx")?, position("fy")?, position("fz")?];

    let mut rows = Vec::with_capacity(num_atoms);
    for (index, line) in lines {
        if line.starts_with("ITEM:") {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let values = parse_floats(DUMP_LABEL, index + 1, line, columns.len())?;
        rows.push((
            values[id_column] as usize,
            force_columns.map(|column| values[column]),
        ));
    }

    if rows.len() != num_atoms {
        return Err(FormatError::Inconsistent {
            file: DUMP_LABEL,
            message: format!("expected {} atoms, found {}", num_atoms, rows.len()),
        });
    }

    rows.sort_by_key(|(id, _)| *id);
    Ok(rows.into_iter().map(|(_, force)| force).collect())
}

fn parse_floats(
    file: &'static str,
    line: usize,
    row: &str,
    expected: usize,
) -> FormatResult<Vec<f64>> {
    let tokens = row.split_whitespace().collect::<Vec<_>>();
    if tokens.len() != expected {
        return Err(FormatError::ColumnCount {
            file,
            line,
            expected,
            found: tokens.len(),
        });
    }
    tokens
        .iter()
        .map(|token| {
            token.parse::<f64>().map_err(|_| FormatError::InvalidToken {
                file,
                line,
                token: (*token).to_string(),
                kind: "float",
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_force_dump, parse_thermo};

    #[test]
    fn last_thermo_row_is_used() {
        let log = "\
LAMMPS (2 Aug 2023)
Per MPI rank memory allocation (min/avg/max) = 3.1 | 3.1 | 3.1 Mbytes
    PotEng          Pxx            Pyy            Pzz            Pxy            Pxz            Pyz
  -7.2345           1200.5         1100.25        1000           -3.5           0              2
Loop time of 1.1e-05 on 1 procs for 0 steps with 2 atoms
";

        let (energy, pressure) = parse_thermo(log).expect("thermo row parses");
        assert_eq!(energy, -7.2345);
        assert_eq!(pressure, [1200.5, 1100.25, 1000.0, -3.5, 0.0, 2.0]);
    }

    #[test]
    fn logs_without_thermo_rows_are_rejected() {
        let error = parse_thermo("ERROR: Unrecognized pair style 'nnp'\n")
            .expect_err("run never started");
        assert!(error.to_string().contains("PotEng Pxx"));
    }

    #[test]
    fn dump_rows_are_sorted_by_atom_id() {
        let dump = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
2
ITEM: BOX BOUNDS pp pp pp
0 3.6
0 3.6
0 3.6
ITEM: ATOMS id fx fy fz
2 -0.1 0 0.2
1 0.1 0 -0.2
";

        let forces = parse_force_dump(dump, 2).expect("dump parses");
        assert_eq!(forces, vec![[0.1, 0.0, -0.2], [-0.1, 0.0, 0.2]]);

        let error = parse_force_dump(dump, 3).expect_err("one atom missing");
        assert!(error.to_string().contains("expected 3 atoms, found 2"));
    }
}
