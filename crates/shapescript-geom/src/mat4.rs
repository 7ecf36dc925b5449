// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A row-major 4x4 affine matrix.

use crate::vec3::Vec3;

/// A 4x4 matrix stored row-major as `rows[row][col]`. ShapeScript only ever
/// needs affine transforms, but the full 4x4 is kept (rather than a
/// 3x4 affine-only representation) so matrix multiplication is a single
/// uniform operation with no special-cased last row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    rows: [[f64; 4]; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Mat4 = Mat4 {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// A pure translation matrix.
    #[must_use]
    pub fn translation(v: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.rows[0][3] = v.x;
        m.rows[1][3] = v.y;
        m.rows[2][3] = v.z;
        m
    }

    /// A pure non-uniform scale matrix.
    #[must_use]
    pub fn scaling(v: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.rows[0][0] = v.x;
        m.rows[1][1] = v.y;
        m.rows[2][2] = v.z;
        m
    }

    /// A rotation matrix from Euler angles `(roll, yaw, pitch)` in radians,
    /// composed as `pitch * yaw * roll` (roll applied first).
    #[must_use]
    pub fn rotation_zyx(euler_radians: Vec3) -> Mat4 {
        let (sr, cr) = libm::sincos(euler_radians.x);
        let (sy, cy) = libm::sincos(euler_radians.y);
        let (sp, cp) = libm::sincos(euler_radians.z);

        let roll = Mat4 {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, cr, -sr, 0.0],
                [0.0, sr, cr, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        };
        let yaw = Mat4 {
            rows: [
                [cy, 0.0, sy, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [-sy, 0.0, cy, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        };
        let pitch = Mat4 {
            rows: [
                [cp, -sp, 0.0, 0.0],
                [sp, cp, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        };
        pitch.mul_mat4(&yaw.mul_mat4(&roll))
    }

    /// Matrix-matrix multiplication: `self * rhs`.
    #[must_use]
    pub fn mul_mat4(&self, rhs: &Mat4) -> Mat4 {
        let mut out = [[0.0_f64; 4]; 4];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.rows[row][k] * rhs.rows[k][col];
                }
                out[row][col] = sum;
            }
        }
        Mat4 { rows: out }
    }

    /// Transforms a point (`w = 1`): translation applies.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.rows[0][0] * p.x + self.rows[0][1] * p.y + self.rows[0][2] * p.z + self.rows[0][3],
            self.rows[1][0] * p.x + self.rows[1][1] * p.y + self.rows[1][2] * p.z + self.rows[1][3],
            self.rows[2][0] * p.x + self.rows[2][1] * p.y + self.rows[2][2] * p.z + self.rows[2][3],
        )
    }

    /// Transforms a vector (`w = 0`): translation does not apply.
    #[must_use]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.rows[0][0] * v.x + self.rows[0][1] * v.y + self.rows[0][2] * v.z,
            self.rows[1][0] * v.x + self.rows[1][1] * v.y + self.rows[1][2] * v.z,
            self.rows[2][0] * v.x + self.rows[2][1] * v.y + self.rows[2][2] * v.z,
        )
    }

    /// The translation column, `(m[0][3], m[1][3], m[2][3])`.
    #[must_use]
    pub fn translation_column(&self) -> Vec3 {
        Vec3::new(self.rows[0][3], self.rows[1][3], self.rows[2][3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_then_scale_order_matters() {
        let t = Mat4::translation(Vec3::new(1.0, 0.0, 0.0));
        let s = Mat4::scaling(Vec3::splat(2.0));
        let p = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(t.mul_mat4(&s).transform_point(p), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(s.mul_mat4(&t).transform_point(p), Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn identity_is_neutral() {
        let p = Vec3::new(3.0, -2.0, 7.0);
        assert_eq!(Mat4::IDENTITY.transform_point(p), p);
    }
}
