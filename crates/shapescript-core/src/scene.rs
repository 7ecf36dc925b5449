// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The scene tree produced by evaluation: named geometry nodes with
//! transforms, materials, and lazily materialized meshes.

use std::cell::RefCell;
use std::rc::Rc;

use shapescript_geom::Transform;
use shapescript_scene_port::{GeometryEngine, GeometryPlan, MaterialSpec};

use crate::cache::GeometryCache;
use crate::error::RuntimeErrorKind;
use crate::source::SourceRange;
use crate::value::MeshValue;

/// A geometry node's materialization state: `declared → evaluating →
/// built → exported`. `evaluating` is
/// implicit in the call stack (the evaluator never leaves a node in that
/// state once control returns), so only the three observable states are
/// represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// The node exists but its mesh has not yet been requested.
    Declared,
    /// The mesh has been materialized (from cache or the engine).
    Built,
    /// The mesh has been handed to an [`shapescript_scene_port::ExportCodec`].
    Exported,
}

/// A single node in the evaluated scene tree.
#[derive(Debug, Clone)]
pub struct GeometryNode {
    /// A stable identifier derived from the node's defining source range:
    /// every geometry node carries an identifier derived from where it
    /// was declared.
    pub id: SourceRange,
    /// The node's own name, if given via the `object`/structure forms.
    pub name: Option<String>,
    /// The node's local-to-parent transform.
    pub transform: Transform,
    /// The node's material at the time it was declared.
    pub material: MaterialSpec,
    /// The plan describing how to build this node's mesh; absent for
    /// pure grouping nodes with no mesh of their own.
    pub plan: Option<GeometryPlan>,
    /// Child nodes, in evaluation order.
    pub children: Vec<GeometryNode>,
    /// The materialized mesh, filled in by [`GeometryNode::build`].
    pub mesh: RefCell<Option<Rc<MeshValue>>>,
    /// This node's current lifecycle state.
    pub state: RefCell<BuildState>,
}

impl GeometryNode {
    /// Builds a new, as-yet-unmaterialized node.
    #[must_use]
    pub fn new(
        id: SourceRange,
        name: Option<String>,
        transform: Transform,
        material: MaterialSpec,
        plan: Option<GeometryPlan>,
        children: Vec<GeometryNode>,
    ) -> Self {
        Self {
            id,
            name,
            transform,
            material,
            plan,
            children,
            mesh: RefCell::new(None),
            state: RefCell::new(BuildState::Declared),
        }
    }

    /// Forces mesh realization for this node and all its descendants,
    /// consulting `cache` before invoking `engine`, keyed by type,
    /// transform-free params, children fingerprints, detail, and
    /// smoothing.
    pub fn build(
        &self,
        cache: &GeometryCache,
        engine: &dyn GeometryEngine,
        is_cancelled: &dyn Fn() -> bool,
    ) -> Result<(), RuntimeErrorKind> {
        for child in &self.children {
            if is_cancelled() {
                return Err(RuntimeErrorKind::Cancelled);
            }
            child.build(cache, engine, is_cancelled)?;
        }
        let Some(plan) = &self.plan else {
            *self.state.borrow_mut() = BuildState::Built;
            return Ok(());
        };
        if is_cancelled() {
            return Err(RuntimeErrorKind::Cancelled);
        }
        let summary = cache.get_or_build(plan, engine).map_err(|e| RuntimeErrorKind::GeometryEngine(e.to_string()))?;
        *self.mesh.borrow_mut() = Some(Rc::new(crate::value::MeshValue {
            polygons: Vec::new(),
            bounds: summary.bounds,
            watertight: summary.watertight,
            material: self.material.clone(),
        }));
        *self.state.borrow_mut() = BuildState::Built;
        Ok(())
    }

    /// Whether this node's mesh (if any) has been materialized.
    #[must_use]
    pub fn is_built(&self) -> bool {
        matches!(*self.state.borrow(), BuildState::Built | BuildState::Exported)
    }
}

/// The result of a successful [`crate::eval::evaluate`]: the top-level
/// scene's root children plus the background color, if any was set.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Top-level nodes.
    pub roots: Vec<GeometryNode>,
    /// The background color, if `background` was invoked at top level.
    pub background: Option<[f64; 4]>,
}

impl Scene {
    /// Forces mesh realization for every node in the scene. Returns
    /// `Ok(true)` on a full build; `Ok(false)` is never produced, since
    /// an incomplete build is always a `RuntimeError`.
    pub fn build(&self, cache: &GeometryCache, engine: &dyn GeometryEngine, is_cancelled: &dyn Fn() -> bool) -> Result<bool, RuntimeErrorKind> {
        for root in &self.roots {
            root.build(cache, engine, is_cancelled)?;
        }
        Ok(true)
    }
}
