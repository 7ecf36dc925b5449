// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene port contract for ShapeScript.
//!
//! This crate defines the boundary between the evaluator
//! (`shapescript-core`) and everything outside its scope: the mesh/CSG
//! math library, 3D import/export codecs, and the embedding host (file
//! resolution, logging). It contains no mesh/CSG *implementation* — only
//! the traits and plain data the evaluator needs on one side of that
//! boundary and a host/engine implements on the other, keeping the
//! port contract and its adapters in separate crates.
//!
//! # Design
//!
//! - **The evaluator is dumb about geometry.** It builds a [`GeometryPlan`]
//!   (what to build) and hands it to a [`GeometryEngine`] (how to build it).
//!   It never inspects polygon data itself.
//! - **Plans, not meshes, are cached.** `shapescript-core`'s geometry cache
//!   fingerprints a `GeometryPlan`; the [`MeshSummary`] it maps to is
//!   whatever the engine last returned for an equivalent plan.
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod delegate;
mod engine;
mod error;
mod material;
mod plan;

pub use delegate::{EvaluationDelegate, ImportedContent, ImportedGeometryId, Url};
pub use engine::{ExportCodec, GeometryEngine, MeshBytes, MeshSummary};
pub use error::{EngineError, ExportError, ImportError};
pub use material::MaterialSpec;
pub use plan::{GeometryKind, GeometryPlan};
