// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The ShapeScript language core: lexer, parser, static analyzer,
//! evaluator, and geometry cache.
//!
//! This crate implements the "language" half of ShapeScript — turning
//! source text into a [`scene::Scene`] of
//! unmaterialized geometry nodes. It knows nothing about how a mesh is
//! actually built; that boundary is [`shapescript_scene_port`]'s
//! [`shapescript_scene_port::GeometryEngine`] trait, implemented on the
//! other side by whatever embeds this crate.
//!
//! # Pipeline
//!
//! ```text
//! source text -> lexer::lex -> parser::parse -> analyzer::analyze -> eval::evaluate -> scene::Scene
//! ```
//!
//! A [`scene::Scene`]'s geometry is lazy: call [`scene::Scene::build`]
//! against a [`cache::GeometryCache`] and a
//! [`shapescript_scene_port::GeometryEngine`] to materialize meshes.
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

pub mod analyzer;
pub mod ast;
pub mod cache;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod lru;
pub mod parser;
pub mod rng;
pub mod scene;
pub mod scope;
pub mod source;
pub mod stdlib;
pub mod suggest;
pub mod token;
pub mod value;

pub use ast::Program;
pub use error::{AnalysisError, LexError, ParseError, RuntimeError};
pub use eval::{evaluate, evaluate_seeded, CancelOracle, NeverCancel};
pub use scene::Scene;
pub use stdlib::Stdlib;
