//! Column-major 4x4 matrices for node transforms and skinning

use crate::object::{NodeRotation, RotationConvention};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        Self {
            cols: [
                [x, 0.0, 0.0, 0.0],
                [0.0, y, 0.0, 0.0],
                [0.0, 0.0, z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_x(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_y(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_z(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation from euler angles in degrees, applied in convention order
    pub fn euler(degrees: [f32; 3], convention: RotationConvention) -> Self {
        let x = Self::rotation_x(degrees[0].to_radians());
        let y = Self::rotation_y(degrees[1].to_radians());
        let z = Self::rotation_z(degrees[2].to_radians());
        // The first applied rotation is the rightmost factor.
        let (first, second, third) = match convention {
            RotationConvention::Xyz => (x, y, z),
            RotationConvention::Xzy => (x, z, y),
            RotationConvention::Yxz => (y, x, z),
            RotationConvention::Yzx => (y, z, x),
            RotationConvention::Zxy => (z, x, y),
            RotationConvention::Zyx => (z, y, x),
        };
        third.mul(&second).mul(&first)
    }

    /// Rotation from a unit quaternion `[x, y, z, w]`
    pub fn quaternion(q: [f32; 4]) -> Self {
        let [x, y, z, w] = q;
        Self {
            cols: [
                [
                    1.0 - 2.0 * (y * y + z * z),
                    2.0 * (x * y + z * w),
                    2.0 * (x * z - y * w),
                    0.0,
                ],
                [
                    2.0 * (x * y - z * w),
                    1.0 - 2.0 * (x * x + z * z),
                    2.0 * (y * z + x * w),
                    0.0,
                ],
                [
                    2.0 * (x * z + y * w),
                    2.0 * (y * z - x * w),
                    1.0 - 2.0 * (x * x + y * y),
                    0.0,
                ],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation(rotation: &NodeRotation) -> Self {
        match *rotation {
            NodeRotation::Euler(angles, convention) => Self::euler(angles, convention),
            NodeRotation::Quaternion(q) => Self::quaternion(q),
        }
    }

    /// Translation * rotation * scale
    pub fn from_trs(translation: [f32; 3], rotation: &NodeRotation, scaling: [f32; 3]) -> Self {
        let [tx, ty, tz] = translation;
        let [sx, sy, sz] = scaling;
        Self::translation(tx, ty, tz)
            .mul(&Self::rotation(rotation))
            .mul(&Self::scale(sx, sy, sz))
    }

    pub fn mul(&self, other: &Mat4) -> Mat4 {
        let mut result = [[0.0f32; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    result[i][j] += self.cols[k][j] * other.cols[i][k];
                }
            }
        }
        Mat4 { cols: result }
    }

    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (row, value) in out.iter_mut().enumerate() {
            *value = self.cols[0][row] * p[0]
                + self.cols[1][row] * p[1]
                + self.cols[2][row] * p[2]
                + self.cols[3][row];
        }
        out
    }

    /// Component-wise comparison with an absolute tolerance
    pub fn approx_eq(&self, other: &Mat4, epsilon: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(actual: [f32; 3], expected: [f32; 3]) {
        for i in 0..3 {
            assert!(
                (actual[i] - expected[i]).abs() < 1e-5,
                "{:?} != {:?}",
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_translation_then_scale() {
        let m = Mat4::translation(1.0, 2.0, 3.0).mul(&Mat4::scale(2.0, 2.0, 2.0));
        assert_point(m.transform_point([1.0, 1.0, 1.0]), [3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let m = Mat4::euler([0.0, 0.0, 90.0], RotationConvention::Xyz);
        assert_point(m.transform_point([1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_euler_order_matters() {
        let xyz = Mat4::euler([90.0, 90.0, 0.0], RotationConvention::Xyz);
        let yxz = Mat4::euler([90.0, 90.0, 0.0], RotationConvention::Yxz);
        // X first: (0,1,0) -> (0,0,1), then Y: (0,0,1) -> (1,0,0)
        assert_point(xyz.transform_point([0.0, 1.0, 0.0]), [1.0, 0.0, 0.0]);
        assert!(!xyz.approx_eq(&yxz, 1e-5));
    }

    #[test]
    fn test_quaternion_matches_euler() {
        let half = std::f32::consts::FRAC_PI_4;
        let q = Mat4::quaternion([0.0, 0.0, half.sin(), half.cos()]);
        let e = Mat4::euler([0.0, 0.0, 90.0], RotationConvention::Zyx);
        assert!(q.approx_eq(&e, 1e-5));
    }

    #[test]
    fn test_identity_is_neutral() {
        let m = Mat4::from_trs([1.0, -2.0, 0.5], &NodeRotation::default(), [1.0, 2.0, 3.0]);
        assert_eq!(m.mul(&Mat4::IDENTITY), m);
        assert_eq!(Mat4::IDENTITY.mul(&m), m);
    }
}
