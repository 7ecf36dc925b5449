// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The evaluator's scope object: a parent-linked symbol table plus the
//! ambient transform/material/detail/smoothing/seed/background state
//! that commands mutate and block exit restores.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use shapescript_geom::Transform;
use shapescript_scene_port::MaterialSpec;

use crate::ast::Statement;
use crate::rng::Rng;
use crate::stdlib::Stdlib;
use crate::value::Value;

/// What a name is bound to in a scope's local symbol table.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A plain value binding, from `define NAME value` or a loop
    /// variable.
    Value(Value),
    /// A user-defined function/block, from `define NAME(params) body`.
    Function {
        /// Parameter names, untyped until specialized at a call site.
        params: Vec<String>,
        /// The function/block body.
        body: Rc<Vec<Statement>>,
        /// The scope the function closes over.
        closure: Rc<Scope>,
    },
    /// An `option NAME default` declared at the top of a block
    /// definition; resolved to its caller-supplied or default value when
    /// the block is invoked.
    Option {
        /// The option's default value expression's already-evaluated
        /// result.
        default: Value,
    },
}

/// A hierarchical evaluation scope. Parent-linked via `Rc` so child
/// scopes can outlive the statement that created them (e.g. a captured
/// [`crate::value::BlockValue`] closure) without cloning the whole chain.
#[derive(Debug)]
pub struct Scope {
    parent: Option<Rc<Scope>>,
    stdlib: Rc<Stdlib>,
    bindings: RefCell<HashMap<String, Binding>>,
    transform: RefCell<Transform>,
    material: RefCell<MaterialSpec>,
    detail: Cell<u32>,
    smoothing: Cell<Option<f64>>,
    rng: RefCell<Rng>,
    background: RefCell<Option<[f64; 4]>>,
    size: Cell<[f64; 3]>,
    pending_children: RefCell<Vec<crate::scene::GeometryNode>>,
    pending_points: RefCell<Vec<crate::value::PointValue>>,
}

/// The default `size` ambient state absent an explicit `size` command.
const DEFAULT_SIZE: [f64; 3] = [1.0, 1.0, 1.0];

/// The default facet count for curved primitives absent an explicit
/// `detail` command.
const DEFAULT_DETAIL: u32 = 16;

impl Scope {
    /// Builds the root scope: no parent, a fresh `Stdlib`, identity
    /// transform, default material, zero-seeded RNG.
    #[must_use]
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope {
            parent: None,
            stdlib: Rc::new(Stdlib::new()),
            bindings: RefCell::new(HashMap::new()),
            transform: RefCell::new(Transform::identity()),
            material: RefCell::new(MaterialSpec::default()),
            detail: Cell::new(DEFAULT_DETAIL),
            smoothing: Cell::new(None),
            rng: RefCell::new(Rng::default()),
            background: RefCell::new(None),
            size: Cell::new(DEFAULT_SIZE),
            pending_children: RefCell::new(Vec::new()),
            pending_points: RefCell::new(Vec::new()),
        })
    }

    /// Creates a child scope that value-clones the ambient
    /// transform/material/detail/smoothing/seed: entering a `{ ... }`
    /// block creates a child scope by value-cloning the ambient state.
    /// The child's own symbol table and pending-children accumulator
    /// start empty.
    #[must_use]
    pub fn child(self: &Rc<Self>) -> Rc<Scope> {
        Rc::new(Scope {
            parent: Some(Rc::clone(self)),
            stdlib: Rc::clone(&self.stdlib),
            bindings: RefCell::new(HashMap::new()),
            transform: RefCell::new(*self.transform.borrow()),
            material: RefCell::new(self.material.borrow().clone()),
            detail: Cell::new(self.detail.get()),
            smoothing: Cell::new(self.smoothing.get()),
            rng: RefCell::new(*self.rng.borrow()),
            background: RefCell::new(*self.background.borrow()),
            size: Cell::new(self.size.get()),
            pending_children: RefCell::new(Vec::new()),
            pending_points: RefCell::new(Vec::new()),
        })
    }

    /// Creates a user-defined block's invocation scope: symbol
    /// resolution chains through `self` (the block's lexical closure —
    /// user `define`s shadow built-ins within their scope), but the
    /// ambient transform/material/detail/smoothing/seed/size are
    /// value-cloned from `call_site` instead, since entering a `{ ... }`
    /// block value-clones the ambient state at every block boundary,
    /// not just where the block was defined. This is what lets
    /// `color red { star { ... } }` tint a block defined at top level.
    #[must_use]
    pub fn bound_child(self: &Rc<Self>, call_site: &Scope) -> Rc<Scope> {
        Rc::new(Scope {
            parent: Some(Rc::clone(self)),
            stdlib: Rc::clone(&self.stdlib),
            bindings: RefCell::new(HashMap::new()),
            transform: RefCell::new(call_site.transform()),
            material: RefCell::new(call_site.material()),
            detail: Cell::new(call_site.detail()),
            smoothing: Cell::new(call_site.smoothing()),
            rng: RefCell::new(*call_site.rng.borrow()),
            background: RefCell::new(call_site.background()),
            size: Cell::new(call_site.size()),
            pending_children: RefCell::new(Vec::new()),
            pending_points: RefCell::new(Vec::new()),
        })
    }

    /// The shared standard-library table, reachable from any scope.
    #[must_use]
    pub fn stdlib(&self) -> &Stdlib {
        &self.stdlib
    }

    /// Binds `name` in *this* scope's local table, shadowing any
    /// outer binding or built-in of the same name.
    pub fn define(&self, name: impl Into<String>, binding: Binding) {
        self.bindings.borrow_mut().insert(name.into(), binding);
    }

    /// Resolves `name` by walking outward through parent scopes. Returns
    /// `None` if no scope in the chain has a local binding (the caller
    /// then falls back to [`Scope::stdlib`]).
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Binding> {
        if let Some(binding) = self.bindings.borrow().get(name) {
            return Some(binding.clone());
        }
        self.parent.as_ref().and_then(|p| p.resolve(name))
    }

    /// Whether *this* scope (not an ancestor) has a local binding for
    /// `name` — used to decide whether an `option` statement's default
    /// should apply, or a call-site override already bound the name.
    #[must_use]
    pub fn has_local(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// The current ambient transform.
    #[must_use]
    pub fn transform(&self) -> Transform {
        *self.transform.borrow()
    }

    /// Replaces the current ambient transform (used when restoring on
    /// scope exit; prefer [`Scope::with_local_transform`] to mutate
    /// in place via composition).
    pub fn set_transform(&self, transform: Transform) {
        *self.transform.borrow_mut() = transform;
    }

    /// Composes `local` onto the current transform, the effect of
    /// `translate`/`rotate`/`scale` commands.
    pub fn apply_local_transform(&self, local: &Transform) {
        let composed = self.transform().then(local);
        self.set_transform(composed);
    }

    /// The current ambient material.
    #[must_use]
    pub fn material(&self) -> MaterialSpec {
        self.material.borrow().clone()
    }

    /// Replaces the current ambient material.
    pub fn set_material(&self, material: MaterialSpec) {
        *self.material.borrow_mut() = material;
    }

    /// The current `detail` setting.
    #[must_use]
    pub fn detail(&self) -> u32 {
        self.detail.get()
    }

    /// Sets the `detail` command's value.
    pub fn set_detail(&self, detail: u32) {
        self.detail.set(detail);
    }

    /// The current `smoothing` angle threshold, in radians, if set.
    #[must_use]
    pub fn smoothing(&self) -> Option<f64> {
        self.smoothing.get()
    }

    /// Sets the `smoothing` command's value.
    pub fn set_smoothing(&self, smoothing: Option<f64>) {
        self.smoothing.set(smoothing);
    }

    /// The current `background`, if set at this scope or inherited.
    #[must_use]
    pub fn background(&self) -> Option<[f64; 4]> {
        *self.background.borrow()
    }

    /// Sets the `background` command's value.
    pub fn set_background(&self, color: [f64; 4]) {
        *self.background.borrow_mut() = Some(color);
    }

    /// The current `size` (width/height/depth) setting.
    #[must_use]
    pub fn size(&self) -> [f64; 3] {
        self.size.get()
    }

    /// Sets the `size` command's value.
    pub fn set_size(&self, size: [f64; 3]) {
        self.size.set(size);
    }

    /// Draws the next value from this scope's random sequence, advancing
    /// its state.
    pub fn next_random(&self) -> f64 {
        self.rng.borrow_mut().next()
    }

    /// Resets this scope's random sequence to `seed`.
    pub fn reseed(&self, seed: f64) {
        *self.rng.borrow_mut() = Rng::seeded(seed);
    }

    /// Appends a fully-evaluated child node to this scope's pending
    /// children, to be collected by the block statement that opened it.
    pub fn push_child(&self, node: crate::scene::GeometryNode) {
        self.pending_children.borrow_mut().push(node);
    }

    /// Drains this scope's accumulated children, in evaluation order.
    #[must_use]
    pub fn take_children(&self) -> Vec<crate::scene::GeometryNode> {
        std::mem::take(&mut self.pending_children.borrow_mut())
    }

    /// Appends a point/curve command's result, for a `path`/`polygon`
    /// block under construction.
    pub fn push_point(&self, point: crate::value::PointValue) {
        self.pending_points.borrow_mut().push(point);
    }

    /// Drains this scope's accumulated points, in evaluation order.
    #[must_use]
    pub fn take_points(&self) -> Vec<crate::value::PointValue> {
        std::mem::take(&mut self.pending_points.borrow_mut())
    }
}
