#![allow(dead_code)]

use nnpot_core::data::pool_from;
use nnpot_core::domain::{DataDoc, Lattice, Structure};
#[cfg(unix)]
use nnpot_core::runner::{Tool, Toolchain};
#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::path::Path;

const FAKE_SCALING: &str = r#"
printf '#### fake scaling data\n' > scaling.data
awk '$1=="symfunction_short"{n++; printf "%4d%5d  %22.14E %22.14E %22.14E %22.14E\n", 1, n, 0.0, 1.0 + n, 0.5, 0.1}' "$1" >> scaling.data
echo "scaling done"
"#;

const FAKE_TRAIN: &str = r##"
test -f scaling.data || { echo "ERROR: scaling.data missing"; exit 1; }
awk -v suffix=029 '
$1=="symfunction_short"{nsf++}
$1=="global_nodes_short"{for(i=2;i<=NF;i++){nodes[++nh]=$i}}
$1=="epochs"{ep=$2}
END{
  sizes[0]=nsf; for(i=1;i<=nh;i++) sizes[i]=nodes[i]; sizes[nh+1]=1;
  for(e=0;e<=ep;e++){
    printf "ENERGY %6d %12.5E %12.5E\n", e, 0.1/(e+1), 0.12/(e+1);
    printf "FORCES %6d %12.5E %12.5E\n", e, 0.5/(e+1), 0.6/(e+1);
  }
  file=sprintf("weights.%s.%06d.out", suffix, ep);
  print "# fake weights" > file;
  idx=0;
  for(l=1;l<=nh+1;l++){
    for(s=1;s<=sizes[l-1];s++) for(t=1;t<=sizes[l];t++){idx++; printf "%24.16E a %9d %5d %5d %5d %5d\n", 0.001*idx, idx, l-1, s, l, t > file}
    for(t=1;t<=sizes[l];t++){idx++; printf "%24.16E b %9d %5d %5d\n", -0.001*idx, idx, l, t > file}
  }
}' "$1"
"##;

const FAKE_PREDICT: &str = r#"
test -f weights.029.data || { echo "ERROR: weights.029.data missing"; exit 1; }
cp input.data output.data
"#;

const FAKE_LAMMPS: &str = r#"
test -f weights.029.data || { echo "ERROR: weights.029.data missing"; exit 1; }
atoms=$(awk '$2=="atoms"{print $1}' data.static)
{
  echo "LAMMPS (fake)"
  echo "    PotEng          Pxx            Pyy            Pzz            Pxy            Pxz            Pyz"
  echo "  -7.5  1000  2000  3000  0  0  0"
  echo "Loop time of 0 on 1 procs for 0 steps with $atoms atoms"
} > log.lammps
{
  echo "ITEM: TIMESTEP"
  echo "0"
  echo "ITEM: ATOMS id fx fy fz"
  i=$atoms
  while [ "$i" -gt 0 ]; do
    echo "$i 0.$i 0 0"
    i=$((i - 1))
  done
} > force.dump
"#;

#[cfg(unix)]
fn install(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("fake tool staged");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("fake tool executable");
    path.display().to_string()
}

/// A toolchain whose programs are small shell scripts mimicking n2p2 and LAMMPS.
#[cfg(unix)]
pub fn fake_toolchain(dir: &Path) -> Toolchain {
    Toolchain::default()
        .with_program(Tool::NnpScaling, install(dir, "nnp-scaling", FAKE_SCALING))
        .with_program(Tool::NnpTrain, install(dir, "nnp-train", FAKE_TRAIN))
        .with_program(Tool::NnpPredict, install(dir, "nnp-predict", FAKE_PREDICT))
        .with_program(Tool::Lammps, install(dir, "lmp", FAKE_LAMMPS))
}

pub fn copper_pool() -> Vec<DataDoc> {
    let structures = [3.55, 3.6, 3.65]
        .into_iter()
        .map(|a| {
            Structure::from_cartesian(
                Lattice::cubic(a),
                &["Cu", "Cu"],
                &[[0.0, 0.0, 0.0], [a / 2.0, a / 2.0, 0.0]],
            )
            .expect("copper cell is well formed")
        })
        .collect();

    pool_from(
        structures,
        Some(vec![-7.1, -7.2, -7.15]),
        Some(vec![
            vec![[0.1, 0.0, 0.0], [-0.1, 0.0, 0.0]],
            vec![[0.0; 3]; 2],
            vec![[0.0, -0.2, 0.0], [0.0, 0.2, 0.0]],
        ]),
        None,
    )
    .expect("pool is consistent")
}
