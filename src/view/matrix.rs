//! Row-major 4×4 matrices acting on homogeneous column vectors.

use serde::Serialize;
use std::ops::Mul;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mat4(pub [[f64; 4]; 4]);

impl Mat4 {
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub fn translate(x: f64, y: f64, z: f64) -> Self {
        Self([
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, y],
            [0.0, 0.0, 1.0, z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scale(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self([
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, w],
        ])
    }

    /// Copies z into w so the transformed w carries depth.
    pub fn homogeneous() -> Self {
        Self([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ])
    }

    /// Rotation by `x` radians about the x axis, applied after `y` radians
    /// about the y axis.
    pub fn rotate_xy(x: f64, y: f64) -> Self {
        let (sx, cx) = x.sin_cos();
        let (sy, cy) = y.sin_cos();
        let rx = Self([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, cx, -sx, 0.0],
            [0.0, sx, cx, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let ry = Self([
            [cy, 0.0, sy, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-sy, 0.0, cy, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        rx * ry
    }

    pub fn transform(&self, v: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (row, value) in self.0.iter().zip(out.iter_mut()) {
            *value = row.iter().zip(v.iter()).map(|(m, x)| m * x).sum();
        }
        out
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.0[i][k] * rhs.0[k][j]).sum();
            }
        }
        Self(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: [f64; 4], b: [f64; 4]) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_identity_is_neutral() {
        let t = Mat4::translate(1.0, 2.0, 3.0);
        assert_eq!(Mat4::IDENTITY * t, t);
        assert_eq!(t * Mat4::IDENTITY, t);
    }

    #[test]
    fn test_translate_and_scale() {
        let m = Mat4::translate(1.0, 2.0, 3.0) * Mat4::scale(2.0, 2.0, 1.0, 1.0);
        assert_close(m.transform([1.0, 1.0, 1.0, 1.0]), [3.0, 4.0, 4.0, 1.0]);
    }

    #[test]
    fn test_homogeneous_copies_depth() {
        assert_close(
            Mat4::homogeneous().transform([1.0, 2.0, 5.0, 1.0]),
            [1.0, 2.0, 5.0, 5.0],
        );
    }

    #[test]
    fn test_rotations() {
        assert_close(
            Mat4::rotate_xy(0.0, FRAC_PI_2).transform([1.0, 0.0, 0.0, 1.0]),
            [0.0, 0.0, -1.0, 1.0],
        );
        assert_close(
            Mat4::rotate_xy(FRAC_PI_2, 0.0).transform([0.0, 1.0, 0.0, 1.0]),
            [0.0, 0.0, 1.0, 1.0],
        );
    }
}
