// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The geometry *plan*: data describing how to build a mesh, kept separate
//! from the mesh itself so traversal never forces evaluation and cache keys
//! can be derived without touching the external geometry engine.

use crate::material::MaterialSpec;

/// The operation a [`GeometryPlan`] asks the external geometry engine to
/// perform. Parameters specific to each kind live alongside the plan
/// rather than in the enum itself, so every plan has the same shape for
/// fingerprinting regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// A unit cube, scaled by the node's transform.
    Cube,
    /// A unit sphere.
    Sphere,
    /// A unit cone.
    Cone,
    /// A unit cylinder.
    Cylinder,
    /// A flat circle path.
    Circle,
    /// A flat square path.
    Square,
    /// A rounded rectangle path.
    RoundRect,
    /// An explicit polygon path from point commands.
    Polygon,
    /// A generic path built from point/curve commands.
    Path,
    /// Rendered text, extruded to a flat path.
    Text,
    /// A fill builder: path(s) to a flat mesh.
    Fill,
    /// A lathe builder: path revolved around an axis.
    Lathe,
    /// An extrude builder: path swept along a vector.
    Extrude,
    /// A loft builder: interpolating between cross-section paths.
    Loft,
    /// A convex hull builder over child meshes.
    Hull,
    /// A Minkowski sum builder over child meshes.
    Minkowski,
    /// CSG union of children.
    Union,
    /// CSG difference: first child minus the rest.
    Difference,
    /// CSG intersection of children.
    Intersection,
    /// CSG symmetric difference of children.
    Xor,
    /// CSG stencil: first child carved by the rest, taking the *second*
    /// child's material.
    Stencil,
    /// A transparent grouping node with no mesh of its own.
    Group,
    /// Geometry pulled in through `import`.
    Imported,
}

/// A plan for materializing a mesh: everything the external
/// [`crate::GeometryEngine`] needs, and everything
/// `shapescript-core`'s geometry cache needs to fingerprint the request.
///
/// Deliberately excludes the node's *world* transform: the cache key is
/// built from transform-free parameters, so moving a node does not
/// invalidate its cached mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPlan {
    /// What operation to perform.
    pub kind: GeometryKind,
    /// Kind-specific numeric parameters (e.g. detail, radii, sweep
    /// vectors), canonically ordered so fingerprinting is stable.
    pub params: Vec<f64>,
    /// Polygon detail level for curved primitives.
    pub detail: u32,
    /// Smoothing angle threshold in radians, if smoothing is enabled.
    pub smoothing: Option<f64>,
    /// Fingerprints of child plans, in evaluation order.
    pub children: Vec<u128>,
    /// The material to apply to the resulting mesh.
    pub material: MaterialSpec,
}
