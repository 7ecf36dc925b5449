// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors raised across the scene port boundary.

use thiserror::Error;

/// Errors raised while resolving or fetching an `import`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The host denied access to the path (e.g. outside a sandboxed root).
    #[error("access to \"{0}\" is restricted")]
    AccessRestricted(String),
    /// The path does not exist.
    #[error("file not found: \"{0}\"")]
    NotFound(String),
    /// The import did not complete within the host's timeout.
    #[error("import of \"{0}\" timed out")]
    TimedOut(String),
    /// The same path is already being imported higher up the import stack.
    #[error("circular import of \"{0}\"")]
    Circular(String),
    /// The host reported an opaque failure.
    #[error("import of \"{0}\" failed: {1}")]
    Other(String, String),
}

/// Errors raised by the external [`crate::GeometryEngine`] while
/// materializing a [`crate::GeometryPlan`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A CSG operator's input was not a closed manifold.
    #[error("CSG operand is not watertight")]
    NotWatertight,
    /// The plan referenced a child fingerprint the engine has no mesh for.
    #[error("unresolved child mesh in geometry plan")]
    UnresolvedChild,
    /// Any other engine-reported failure.
    #[error("geometry engine error: {0}")]
    Other(String),
}

/// Errors raised by an [`crate::ExportCodec`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// No registered codec handles this file extension.
    #[error("unsupported export extension: \"{0}\"")]
    UnsupportedExtension(String),
    /// The codec failed to encode the mesh.
    #[error("export failed: {0}")]
    EncodingFailed(String),
}
