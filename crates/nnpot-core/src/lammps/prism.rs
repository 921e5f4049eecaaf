use crate::domain::{Lattice, NnpError, NnpResult};

type Matrix3 = [[f64; 3]; 3];

const SINGULAR_VOLUME: f64 = 1.0e-10;

/// Restricted triclinic box: `a` along x, `b` in the xy plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prism {
    pub xhi: f64,
    pub yhi: f64,
    pub zhi: f64,
    pub xy: f64,
    pub xz: f64,
    pub yz: f64,
    /// Orthogonal map from structure frame to box frame (row vectors).
    rotation: Matrix3,
}

impl Prism {
    pub fn from_lattice(lattice: &Lattice) -> NnpResult<Self> {
        let [a, b, c] = lattice.matrix;
        let a_norm = norm(a);
        let volume = dot(a, cross(b, c));
        if a_norm < f64::EPSILON || volume.abs() < SINGULAR_VOLUME {
            return Err(NnpError::input_validation(
                "INPUT.LATTICE",
                format!("lattice {:?} is singular", lattice.matrix),
            ));
        }

        let a_hat = a.map(|value| value / a_norm);
        let xy = dot(b, a_hat);
        let yhi = norm(cross(a_hat, b));
        let xz = dot(c, a_hat);
        let yz = (dot(b, c) - xy * xz) / yhi;
        let zhi = (dot(c, c) - xz * xz - yz * yz).max(0.0).sqrt();

        let boxed = [[a_norm, 0.0, 0.0], [xy, yhi, 0.0], [xz, yz, zhi]];
        let inverse = invert(lattice.matrix, volume);

        Ok(Self {
            xhi: a_norm,
            yhi,
            zhi,
            xy,
            xz,
            yz,
            rotation: multiply(inverse, boxed),
        })
    }

    pub fn is_orthogonal(&self) -> bool {
        self.xy == 0.0 && self.xz == 0.0 && self.yz == 0.0
    }

    pub fn to_box(&self, vector: [f64; 3]) -> [f64; 3] {
        apply(vector, self.rotation)
    }

    pub fn from_box(&self, vector: [f64; 3]) -> [f64; 3] {
        apply(vector, transpose(self.rotation))
    }

    /// Rotates a box-frame `[xx, yy, zz, xy, xz, yz]` tensor back and returns
    /// it as `[xx, yy, zz, xy, yz, xz]`.
    pub fn tensor_from_box(&self, voigt: [f64; 6]) -> [f64; 6] {
        let [xx, yy, zz, xy, xz, yz] = voigt;
        let tensor = [[xx, xy, xz], [xy, yy, yz], [xz, yz, zz]];
        let rotated = multiply(multiply(self.rotation, tensor), transpose(self.rotation));
        [
            rotated[0][0],
            rotated[1][1],
            rotated[2][2],
            rotated[0][1],
            rotated[1][2],
            rotated[0][2],
        ]
    }
}

fn dot(lhs: [f64; 3], rhs: [f64; 3]) -> f64 {
    lhs[0] * rhs[0] + lhs[1] * rhs[1] + lhs[2] * rhs[2]
}

fn cross(lhs: [f64; 3], rhs: [f64; 3]) -> [f64; 3] {
    [
        lhs[1] * rhs[2] - lhs[2] * rhs[1],
        lhs[2] * rhs[0] - lhs[0] * rhs[2],
        lhs[0] * rhs[1] - lhs[1] * rhs[0],
    ]
}

fn norm(vector: [f64; 3]) -> f64 {
    dot(vector, vector).sqrt()
}

fn transpose(matrix: Matrix3) -> Matrix3 {
    let mut result = [[0.0; 3]; 3];
    for (row, values) in matrix.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            result[col][row] = *value;
        }
    }
    result
}

fn multiply(lhs: Matrix3, rhs: Matrix3) -> Matrix3 {
    let mut result = [[0.0; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            result[row][col] = (0..3).map(|k| lhs[row][k] * rhs[k][col]).sum();
        }
    }
    result
}

fn apply(vector: [f64; 3], matrix: Matrix3) -> [f64; 3] {
    let mut result = [0.0; 3];
    for (col, slot) in result.iter_mut().enumerate() {
        *slot = (0..3).map(|k| vector[k] * matrix[k][col]).sum();
    }
    result
}

/// Inverse through the adjugate; rows `a, b, c` with triple product `volume`.
fn invert(matrix: Matrix3, volume: f64) -> Matrix3 {
    let [a, b, c] = matrix;
    let columns = [cross(b, c), cross(c, a), cross(a, b)];
    let mut inverse = [[0.0; 3]; 3];
    for (col, column) in columns.iter().enumerate() {
        for row in 0..3 {
            inverse[row][col] = column[row] / volume;
        }
    }
    inverse
}

#[cfg(test)]
mod tests {
    use super::Prism;
    use crate::domain::Lattice;

    fn assert_close(lhs: &[f64], rhs: &[f64]) {
        for (left, right) in lhs.iter().zip(rhs) {
            assert!((left - right).abs() < 1.0e-10, "{lhs:?} != {rhs:?}");
        }
    }

    #[test]
    fn orthogonal_cells_map_onto_themselves() {
        let prism = Prism::from_lattice(&Lattice::new([
            [3.0, 0.0, 0.0],
            [0.0, 4.0, 0.0],
            [0.0, 0.0, 5.0],
        ]))
        .expect("cell is regular");

        assert!(prism.is_orthogonal());
        assert_close(&[prism.xhi, prism.yhi, prism.zhi], &[3.0, 4.0, 5.0]);
        assert_close(&prism.to_box([1.0, 2.0, 3.0]), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn rotated_cells_are_brought_into_lammps_orientation() {
        // fcc primitive cell; none of its vectors lie along x
        let lattice = Lattice::new([[0.0, 1.8, 1.8], [1.8, 0.0, 1.8], [1.8, 1.8, 0.0]]);
        let prism = Prism::from_lattice(&lattice).expect("cell is regular");

        let a = prism.to_box(lattice.matrix[0]);
        let b = prism.to_box(lattice.matrix[1]);
        let c = prism.to_box(lattice.matrix[2]);
        assert_close(&a, &[prism.xhi, 0.0, 0.0]);
        assert_close(&b, &[prism.xy, prism.yhi, 0.0]);
        assert_close(&c, &[prism.xz, prism.yz, prism.zhi]);
        // fcc primitive cell volume is a^3 / 4 with a = 3.6
        assert!((prism.xhi * prism.yhi * prism.zhi - 11.664).abs() < 1.0e-10);

        let force = [0.3, -0.1, 0.2];
        assert_close(&prism.from_box(prism.to_box(force)), &force);
    }

    #[test]
    fn tensors_are_rotated_back_into_structure_frame() {
        let lattice = Lattice::new([[0.0, 1.8, 1.8], [1.8, 0.0, 1.8], [1.8, 1.8, 0.0]]);
        let prism = Prism::from_lattice(&lattice).expect("cell is regular");

        // isotropic pressure is frame independent
        let isotropic = prism.tensor_from_box([2.0, 2.0, 2.0, 0.0, 0.0, 0.0]);
        assert_close(&isotropic, &[2.0, 2.0, 2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn singular_cells_are_rejected() {
        let error = Prism::from_lattice(&Lattice::new([
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ]))
        .expect_err("collinear vectors");
        assert_eq!(error.placeholder(), "INPUT.LATTICE");
    }
}
