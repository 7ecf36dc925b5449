// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The external geometry engine and export codec contracts. Neither is
//! implemented in this repository — the mesh/CSG math library and the
//! model import/export codecs are external collaborators, referenced
//! only by interface.

use shapescript_geom::Bounds;

use crate::error::{EngineError, ExportError};
use crate::plan::GeometryPlan;

/// A summary of a materialized mesh, as returned by a [`GeometryEngine`].
/// The engine owns the actual polygon buffers; the core only needs enough
/// of a summary to populate `Value::mesh`'s `bounds`/`watertight` members
/// and to cost the geometry cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSummary {
    /// The mesh's axis-aligned bounds in local space.
    pub bounds: Bounds,
    /// Number of polygons in the mesh, used as the geometry cache's cost.
    pub polygon_count: u64,
    /// Whether the mesh forms a closed manifold.
    pub watertight: bool,
}

/// Opaque exported mesh bytes, in whatever format an [`ExportCodec`]
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshBytes(pub Vec<u8>);

/// The mesh/CSG math library's interface: builds a [`MeshSummary`] from a
/// [`GeometryPlan`].
///
/// # Errors
///
/// Returns [`EngineError`] when the plan cannot be realized (e.g. a CSG
/// operator applied to a non-watertight child).
pub trait GeometryEngine {
    /// Materializes a plan into a mesh summary.
    fn build(&self, plan: &GeometryPlan) -> Result<MeshSummary, EngineError>;
}

/// The model import/export codec interface: serializes a materialized mesh
/// to an on-disk model format selected by file extension.
pub trait ExportCodec {
    /// Whether this codec handles the given (lowercase, no leading dot)
    /// file extension.
    fn supports(&self, extension: &str) -> bool;

    /// Serializes `mesh` to this codec's format.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if `extension` is unsupported or encoding
    /// fails.
    fn export(&self, mesh: &MeshSummary, extension: &str) -> Result<MeshBytes, ExportError>;
}
