// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Affine transforms, axis-aligned bounds, and the small vector/matrix types
//! shared by `shapescript-core` and `shapescript-scene-port`.
//!
//! This crate owns none of ShapeScript's language semantics — it is the
//! "geometry primitives" satellite crate, kept separate so the evaluator and
//! the scene port can share one transform/bounds representation without
//! either depending on the other.
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod bounds;
mod mat4;
mod vec3;

pub use bounds::Bounds;
pub use mat4::Mat4;
pub use vec3::Vec3;

/// An affine world transform, stored as its derived 4x4 matrix.
///
/// Every geometry node's world transform is the product of ancestor
/// transforms composed with its local transform — exactly
/// [`Transform::then`]: composing matrices directly, rather than
/// keeping translation/rotation/scale in sync across compositions, avoids
/// ever needing to decompose an arbitrary product back into clean
/// translation/rotation/scale components (which, for a non-uniform scale
/// followed by a rotation, is not generally possible).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self { matrix: Mat4::IDENTITY }
    }

    /// A pure translation by `v`.
    #[must_use]
    pub fn translation(v: Vec3) -> Self {
        Self { matrix: Mat4::translation(v) }
    }

    /// A pure rotation: Euler `(roll, yaw, pitch)` in radians, applied
    /// roll-then-yaw-then-pitch.
    #[must_use]
    pub fn rotation(euler_radians: Vec3) -> Self {
        Self { matrix: Mat4::rotation_zyx(euler_radians) }
    }

    /// A pure non-uniform scale.
    #[must_use]
    pub fn scale(v: Vec3) -> Self {
        Self { matrix: Mat4::scaling(v) }
    }

    /// Wraps an already-composed matrix as a `Transform`.
    #[must_use]
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// The derived 4x4 matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Composes `self` (the ambient/world transform) with `local` applied
    /// on top of it: `self.then(local) == self.matrix() * local.matrix()`.
    #[must_use]
    pub fn then(&self, local: &Transform) -> Transform {
        Transform { matrix: self.matrix.mul_mat4(&local.matrix) }
    }

    /// Transforms a point by this transform's matrix.
    #[must_use]
    pub fn apply_point(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point(point)
    }

    /// Transforms a vector (ignoring translation) by this transform's matrix.
    #[must_use]
    pub fn apply_vector(&self, vector: Vec3) -> Vec3 {
        self.matrix.transform_vector(vector)
    }
}
