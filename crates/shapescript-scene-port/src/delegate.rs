// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The embedding-host delegate: import resolution and debug logging.

use crate::error::ImportError;

/// A resolved import URL. Opaque to the evaluator; only the delegate
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url(pub String);

/// Pre-built geometry handed back by [`EvaluationDelegate::import_geometry`]
/// when an import resolves to something other than ShapeScript source —
/// e.g. a previously-exported model the host already has in memory.
///
/// Represented as an opaque fingerprint rather than a [`crate::MeshSummary`]
/// because imported geometry is consumed directly by the evaluator without
/// going through the geometry cache's own fingerprinting (it already has a
/// stable identity from the host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportedGeometryId(pub u128);

/// Either shape source text to re-enter at the parser, or pre-built
/// geometry to consume directly — the two outcomes an `import` can
/// resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedContent {
    /// ShapeScript source text, to be lexed/parsed/evaluated as if it
    /// appeared inline.
    Source(String),
    /// A handle to geometry the host already built.
    Geometry(ImportedGeometryId),
}

/// The evaluator's sole dependency on the outside world: import resolution
/// and debug logging. Must be safe to call from the evaluator's thread.
pub trait EvaluationDelegate {
    /// Resolves an `import "path"` literal to a URL.
    fn resolve_url(&self, path: &str) -> Url;

    /// Fetches the content an import URL refers to.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] on I/O failure, restricted access, or
    /// timeout.
    fn import_content(&self, url: &Url) -> Result<ImportedContent, ImportError>;

    /// Receives values passed to the `debug` command for host-side
    /// printing. Takes pre-formatted strings rather than `Value` itself so
    /// this crate never needs to depend on `shapescript-core`'s value
    /// model.
    fn debug_log(&self, formatted_values: &[String]);

    /// Receives values passed to the `print` command.
    fn print(&self, formatted_values: &[String]);
}
