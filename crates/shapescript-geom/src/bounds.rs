// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Axis-aligned bounding boxes.

use crate::vec3::Vec3;

/// An axis-aligned bounding box, or the empty set ([`Bounds::EMPTY`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min: Vec3,
    max: Vec3,
}

impl Bounds {
    /// The empty bounds: contains no points, and is the identity element
    /// for [`Bounds::union`].
    pub const EMPTY: Bounds = Bounds {
        min: Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        max: Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    /// Builds bounds from explicit min/max corners. Panics in debug builds
    /// only via the `min <= max` invariant being the caller's
    /// responsibility — callers that can't guarantee ordering should use
    /// [`Bounds::from_points`] instead.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Builds the tightest bounds containing every point in `points`.
    /// Returns [`Bounds::EMPTY`] for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        points
            .iter()
            .fold(Bounds::EMPTY, |acc, &p| acc.union(&Bounds { min: p, max: p }))
    }

    /// Whether this is the empty set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// The minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// The maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// The center point. Undefined (but finite-free of panics) for empty
    /// bounds.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    /// The extent along each axis (`max - min`).
    #[must_use]
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// The smallest bounds containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Transforms every corner of this box by `matrix` and returns the new
    /// axis-aligned bounds containing them — the standard "transform 8
    /// corners, take the AABB" approach for keeping bounds axis-aligned
    /// under rotation.
    #[must_use]
    pub fn transformed(&self, matrix: &crate::Mat4) -> Bounds {
        if self.is_empty() {
            return Bounds::EMPTY;
        }
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        Bounds::from_points(&corners.map(|c| matrix.transform_point(c)))
    }
}
