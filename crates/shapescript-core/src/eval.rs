// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The evaluator: walks a parsed [`Program`] against a
//! chain of [`Scope`]s, mutating ambient state, binding symbols, and
//! emitting a [`Scene`] of unmaterialized [`GeometryNode`]s. Mesh
//! realization itself is a later, separate step (`Scene::build`), so this
//! module never touches a [`crate::cache::GeometryCache`] or
//! [`GeometryEngine`].

use std::cell::Cell;
use std::rc::Rc;

use shapescript_geom::{Transform, Vec3};
use shapescript_scene_port::{
    EvaluationDelegate, GeometryKind, GeometryPlan, ImportedContent, MaterialSpec,
};

use crate::ast::{
    DefineBody, Expression, ExpressionKind, InfixOp, Literal, PrefixOp, Program, Statement,
    StatementKind,
};
use crate::cache::Fingerprint;
use crate::error::{Located, RuntimeError, RuntimeErrorKind};
use crate::scene::{GeometryNode, Scene};
use crate::scope::{Binding, Scope};
use crate::source::SourceRange;
use crate::stdlib::{SymbolKind, named_color};
use crate::value::{PointValue, RangeValue, Value};

/// The recursion guard's ceiling: a `define`d block or
/// function calling itself (directly or mutually) past this depth raises
/// [`RuntimeErrorKind::StackOverflow`] rather than exhausting the native
/// stack.
const MAX_CALL_DEPTH: u32 = 1024;

/// Cooperative cancellation, polled between statements and loop
/// iterations. A trait rather than a bare closure so embedding hosts can
/// implement it over whatever signal they already have (an `AtomicBool`,
/// a channel, a deadline) without the evaluator caring which.
pub trait CancelOracle {
    /// Returns `true` once evaluation should stop at the next
    /// opportunity.
    fn is_cancelled(&self) -> bool;
}

/// Never cancels. Used by callers that have no cancellation source of
/// their own.
pub struct NeverCancel;

impl CancelOracle for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Evaluates `program` against a fresh root [`Scope`], returning the
/// resulting [`Scene`]. The scene's geometry is not yet materialized;
/// call [`Scene::build`] afterwards.
///
/// # Errors
///
/// Returns the first [`RuntimeError`] encountered: unlike the analyzer,
/// evaluation does not collect multiple errors — it stops at the first.
pub fn evaluate(
    program: &Program,
    delegate: &dyn EvaluationDelegate,
    cancel: &dyn CancelOracle,
) -> Result<Scene, RuntimeError> {
    evaluate_from(Scope::root(), program, delegate, cancel)
}

/// As [`evaluate`], but reseeds the root scope's random sequence before
/// running, overriding the default zero seed for any `rnd` calls that
/// precede an explicit `seed` command in `program` itself. Used by
/// `shapescript-cli`'s `--seed` flag.
///
/// # Errors
///
/// See [`evaluate`].
pub fn evaluate_seeded(
    program: &Program,
    delegate: &dyn EvaluationDelegate,
    cancel: &dyn CancelOracle,
    seed: f64,
) -> Result<Scene, RuntimeError> {
    let root = Scope::root();
    root.reseed(seed);
    evaluate_from(root, program, delegate, cancel)
}

fn evaluate_from(
    root: Rc<Scope>,
    program: &Program,
    delegate: &dyn EvaluationDelegate,
    cancel: &dyn CancelOracle,
) -> Result<Scene, RuntimeError> {
    let evaluator = Evaluator::new(delegate, cancel);
    evaluator.eval_block_body(&program.statements, &root)?;
    Ok(Scene { roots: root.take_children(), background: root.background() })
}

struct Evaluator<'a> {
    delegate: &'a dyn EvaluationDelegate,
    cancel: &'a dyn CancelOracle,
    call_depth: Cell<u32>,
    import_stack: std::cell::RefCell<Vec<String>>,
}

impl<'a> Evaluator<'a> {
    fn new(delegate: &'a dyn EvaluationDelegate, cancel: &'a dyn CancelOracle) -> Self {
        Self { delegate, cancel, call_depth: Cell::new(0), import_stack: std::cell::RefCell::new(Vec::new()) }
    }

    fn err(&self, kind: RuntimeErrorKind, range: SourceRange) -> RuntimeError {
        Located::new(kind, range)
    }

    fn poll_cancel(&self, range: SourceRange) -> Result<(), RuntimeError> {
        if self.cancel.is_cancelled() {
            return Err(self.err(RuntimeErrorKind::Cancelled, range));
        }
        Ok(())
    }

    fn enter_call(&self, range: SourceRange) -> Result<(), RuntimeError> {
        if self.call_depth.get() >= MAX_CALL_DEPTH {
            return Err(self.err(RuntimeErrorKind::StackOverflow, range));
        }
        self.call_depth.set(self.call_depth.get() + 1);
        Ok(())
    }

    fn exit_call(&self) {
        self.call_depth.set(self.call_depth.get() - 1);
    }

    // ---- statements -----------------------------------------------------

    fn eval_block_body(&self, statements: &[Statement], scope: &Rc<Scope>) -> Result<(), RuntimeError> {
        self.run_statements(statements, scope)?;
        Ok(())
    }

    /// Runs `statements` in order, returning the value of the last
    /// top-level [`StatementKind::ExpressionStatement`] encountered (the
    /// "return value" convention for a value-form `define`). Intermediate
    /// statements' values are discarded.
    fn run_statements(&self, statements: &[Statement], scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        let mut last = Value::unset();
        for stmt in statements {
            self.poll_cancel(stmt.range)?;
            if let StatementKind::ExpressionStatement(expr) = &stmt.kind {
                last = self.eval_expr(expr, scope)?;
            } else {
                self.eval_statement(stmt, scope)?;
            }
        }
        Ok(last)
    }

    fn eval_statement(&self, stmt: &Statement, scope: &Rc<Scope>) -> Result<(), RuntimeError> {
        self.poll_cancel(stmt.range)?;
        match &stmt.kind {
            StatementKind::Define { name, params, body, .. } => {
                let binding = self.build_define_binding(params, body, scope)?;
                scope.define(name.clone(), binding);
                Ok(())
            }
            StatementKind::Option { name, default } => {
                if !scope.has_local(name) {
                    let value = self.eval_expr(default, scope)?;
                    scope.define(name.clone(), Binding::Value(value));
                }
                Ok(())
            }
            StatementKind::ForLoop { binding, iterable, body } => {
                self.eval_for_loop(binding.as_deref(), iterable, body, scope)
            }
            StatementKind::IfElse { condition, then_branch, else_branch } => {
                self.eval_if_else(condition, then_branch, else_branch.as_deref(), scope)
            }
            StatementKind::Import { path } => self.eval_import(path, stmt.range, scope),
            StatementKind::Command { name, name_range, arguments } => {
                self.eval_command(name, *name_range, arguments, stmt.range, scope)
            }
            StatementKind::ExpressionStatement(expr) => {
                self.eval_expr(expr, scope)?;
                Ok(())
            }
            StatementKind::Block { name, arguments, body, .. } => {
                self.invoke_block(name.as_deref(), arguments, body, stmt.range, scope)
            }
        }
    }

    fn build_define_binding(
        &self,
        params: &[String],
        body: &DefineBody,
        scope: &Rc<Scope>,
    ) -> Result<Binding, RuntimeError> {
        match body {
            DefineBody::Value(expr) if params.is_empty() => Ok(Binding::Value(self.eval_expr(expr, scope)?)),
            DefineBody::Value(expr) => {
                let synthetic = vec![Statement { kind: StatementKind::ExpressionStatement(expr.clone()), range: expr.range }];
                Ok(Binding::Function { params: params.to_vec(), body: Rc::new(synthetic), closure: Rc::clone(scope) })
            }
            DefineBody::Block(statements) => {
                Ok(Binding::Function { params: params.to_vec(), body: Rc::new(statements.clone()), closure: Rc::clone(scope) })
            }
        }
    }

    fn eval_for_loop(
        &self,
        binding: Option<&str>,
        iterable: &Expression,
        body: &[Statement],
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        let iterable_value = self.eval_expr(iterable, scope)?;
        let items = iterable_items(&iterable_value).ok_or_else(|| {
            self.err(
                RuntimeErrorKind::GeometryEngine(format!("{} is not iterable", iterable_value.kind().describe())),
                iterable.range,
            )
        })?;
        for item in items {
            self.poll_cancel(iterable.range)?;
            let child = scope.child();
            if let Some(name) = binding {
                child.define(name.to_string(), Binding::Value(item));
            }
            self.run_statements(body, &child)?;
            for kid in child.take_children() {
                scope.push_child(kid);
            }
        }
        Ok(())
    }

    fn eval_if_else(
        &self,
        condition: &Expression,
        then_branch: &[Statement],
        else_branch: Option<&[Statement]>,
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        let cond = self.eval_expr(condition, scope)?;
        let child = scope.child();
        if cond.is_truthy() {
            self.run_statements(then_branch, &child)?;
        } else if let Some(else_stmts) = else_branch {
            self.run_statements(else_stmts, &child)?;
        }
        for kid in child.take_children() {
            scope.push_child(kid);
        }
        Ok(())
    }

    fn eval_import(&self, path: &Expression, call_range: SourceRange, scope: &Rc<Scope>) -> Result<(), RuntimeError> {
        let path_value = self.eval_expr(path, scope)?;
        let Value::String(path_str) = path_value else {
            return Err(self.err(
                RuntimeErrorKind::GeometryEngine(format!(
                    "import path must be a string, found {}",
                    path_value.kind().describe()
                )),
                call_range,
            ));
        };
        let url = self.delegate.resolve_url(&path_str);
        if self.import_stack.borrow().iter().any(|p| *p == url.0) {
            return Err(self.err(RuntimeErrorKind::CircularImport(url.0.clone()), call_range));
        }
        let content = self.delegate.import_content(&url).map_err(|e| self.err(map_import_error(e), call_range))?;
        match content {
            ImportedContent::Source(source) => {
                self.import_stack.borrow_mut().push(url.0.clone());
                let result = self.eval_imported_source(&source, &url.0, scope);
                self.import_stack.borrow_mut().pop();
                result
            }
            ImportedContent::Geometry(id) => {
                let plan = GeometryPlan {
                    kind: GeometryKind::Imported,
                    params: Vec::new(),
                    detail: scope.detail(),
                    smoothing: scope.smoothing(),
                    children: vec![id.0],
                    material: scope.material(),
                };
                let node = GeometryNode::new(call_range, None, scope.transform(), scope.material(), Some(plan), Vec::new());
                scope.push_child(node);
                Ok(())
            }
        }
    }

    fn eval_imported_source(&self, source: &str, file: &str, scope: &Rc<Scope>) -> Result<(), RuntimeError> {
        let (tokens, lex_error) = crate::lexer::lex(source);
        if let Some(err) = lex_error {
            return Err(self.import_wrap(synthetic_runtime_error(err.kind.to_string(), err.range), file, source));
        }
        let stdlib = crate::stdlib::Stdlib::new();
        let (imported_program, parse_error) = crate::parser::parse(tokens, &stdlib);
        if let Some(err) = parse_error {
            return Err(self.import_wrap(synthetic_runtime_error(err.kind.to_string(), err.range), file, source));
        }
        if let Some(err) = crate::analyzer::analyze(&imported_program, &stdlib).into_iter().next() {
            return Err(self.import_wrap(synthetic_runtime_error(err.kind.to_string(), err.range), file, source));
        }
        self.eval_block_body(&imported_program.statements, scope).map_err(|inner| self.import_wrap(inner, file, source))
    }

    fn import_wrap(&self, inner: RuntimeError, file: &str, source: &str) -> RuntimeError {
        let range = inner.range;
        Located {
            kind: RuntimeErrorKind::ImportError { inner: Box::new(inner), file: file.to_string(), source: source.to_string() },
            range,
            hint: None,
        }
    }

    // ---- command / block dispatch ---------------------------------------

    fn eval_command(
        &self,
        name: &str,
        name_range: SourceRange,
        arguments: &[Expression],
        call_range: SourceRange,
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        self.poll_cancel(call_range)?;
        if name == "point" || name == "curve" {
            return self.emit_point(name == "curve", arguments, call_range, scope);
        }
        if let Some(sig) = scope.stdlib().lookup(name) {
            return match sig.kind {
                SymbolKind::Command => self.apply_builtin_command(name, arguments, call_range, scope),
                SymbolKind::Block => self.invoke_stdlib_block(name, arguments, &[], call_range, scope),
                SymbolKind::Function | SymbolKind::Constant => {
                    let values = self.eval_args(arguments, scope)?;
                    self.eval_builtin_function(name, &values, call_range)?;
                    Ok(())
                }
            };
        }
        match scope.resolve(name) {
            Some(Binding::Function { params, body, closure }) => {
                let values = self.eval_args(arguments, scope)?;
                let (_, kids) = self.invoke_user_function(&params, &body, &closure, &values, call_range, scope)?;
                for kid in kids {
                    scope.push_child(kid);
                }
                Ok(())
            }
            _ => Err(self.err(RuntimeErrorKind::GeometryEngine(format!("unknown symbol '{name}'")), name_range)),
        }
    }

    fn invoke_block(
        &self,
        name: Option<&str>,
        call_args: &[Expression],
        body: &[Statement],
        call_range: SourceRange,
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        self.poll_cancel(call_range)?;
        let Some(n) = name else {
            return self.invoke_group_like(None, call_args, body, call_range, scope);
        };
        if n == "point" || n == "curve" {
            return self.emit_point(n == "curve", call_args, call_range, scope);
        }
        if let Some(sig) = scope.stdlib().lookup(n) {
            return match sig.kind {
                SymbolKind::Command => self.invoke_scoped_command(n, call_args, body, call_range, scope),
                SymbolKind::Block if n == "group" => self.invoke_group_like(None, call_args, body, call_range, scope),
                SymbolKind::Block if matches!(n, "object" | "light" | "camera") => {
                    self.invoke_group_like(Some(n), call_args, body, call_range, scope)
                }
                SymbolKind::Block => self.invoke_stdlib_block(n, call_args, body, call_range, scope),
                SymbolKind::Function | SymbolKind::Constant => {
                    Err(self.err(RuntimeErrorKind::GeometryEngine(format!("'{n}' cannot be invoked as a block")), call_range))
                }
            };
        }
        match scope.resolve(n) {
            Some(Binding::Function { params, body: fn_body, closure }) => {
                self.invoke_user_block(n, &params, &fn_body, &closure, call_args, body, call_range, scope)
            }
            _ => Err(self.err(RuntimeErrorKind::GeometryEngine(format!("unknown symbol '{n}'")), call_range)),
        }
    }

    /// Bare `{ }`, the `group` block, and the `object`/`light`/`camera`
    /// structure forms: all produce a transparent node with `plan: None`,
    /// absent because these are pure grouping nodes with no mesh of
    /// their own, distinguishing them from a user-defined block's own
    /// result, which carries a [`GeometryKind::Group`] plan so it can be
    /// fingerprinted as a CSG/builder operand (see
    /// [`Evaluator::invoke_user_block`]).
    fn invoke_group_like(
        &self,
        label: Option<&str>,
        call_args: &[Expression],
        body: &[Statement],
        call_range: SourceRange,
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        let child = scope.child();
        let mut node_name = label.map(str::to_string);
        if let Some(first) = call_args.first() {
            if let Value::String(s) = self.eval_expr(first, &child)? {
                node_name = Some(s.to_string());
            }
        }
        self.eval_block_body(body, &child)?;
        let kids = child.take_children();
        let node = GeometryNode::new(call_range, node_name, child.transform(), child.material(), None, kids);
        scope.push_child(node);
        Ok(())
    }

    fn invoke_scoped_command(
        &self,
        name: &str,
        call_args: &[Expression],
        body: &[Statement],
        call_range: SourceRange,
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        let child = scope.child();
        self.apply_builtin_command(name, call_args, call_range, &child)?;
        self.eval_block_body(body, &child)?;
        for kid in child.take_children() {
            scope.push_child(kid);
        }
        Ok(())
    }

    fn invoke_stdlib_block(
        &self,
        name: &str,
        call_args: &[Expression],
        body: &[Statement],
        call_range: SourceRange,
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        let child = scope.child();
        if !call_args.is_empty() {
            let dims = self.eval_dimensions(call_args, &child)?;
            child.apply_local_transform(&Transform::scale(dims));
        }
        self.eval_block_body(body, &child)?;
        let kids = child.take_children();
        let points = child.take_points();
        let kind = stdlib_geometry_kind(name);
        let is_csg = matches!(
            kind,
            GeometryKind::Union | GeometryKind::Difference | GeometryKind::Intersection | GeometryKind::Xor | GeometryKind::Stencil
        );
        // CSG results take their material from the first child, except
        // `stencil`, which takes it from the second.
        let material = if is_csg {
            let pick = if kind == GeometryKind::Stencil { kids.get(1) } else { kids.first() };
            pick.map(|n| n.material.clone()).unwrap_or_else(|| child.material())
        } else {
            child.material()
        };
        let fingerprints = collect_child_fingerprints(&kids);
        let params = encode_points(&points);
        let plan = GeometryPlan {
            kind,
            params,
            detail: child.detail(),
            smoothing: child.smoothing(),
            children: fingerprints,
            material: material.clone(),
        };
        let node = GeometryNode::new(call_range, None, child.transform(), material, Some(plan), kids);
        scope.push_child(node);
        Ok(())
    }

    fn eval_dimensions(&self, call_args: &[Expression], scope: &Rc<Scope>) -> Result<Vec3, RuntimeError> {
        let values = self.eval_args(call_args, scope)?;
        let numbers: Vec<f64> = values.iter().filter_map(Value::as_number).collect();
        Ok(match numbers.len() {
            0 => Vec3::splat(1.0),
            1 => Vec3::splat(numbers[0]),
            2 => Vec3::new(numbers[0], numbers[1], 1.0),
            _ => Vec3::new(numbers[0], numbers[1], numbers[2]),
        })
    }

    fn emit_point(&self, is_curved: bool, args: &[Expression], call_range: SourceRange, scope: &Rc<Scope>) -> Result<(), RuntimeError> {
        let values = self.eval_args(args, scope)?;
        let mut coords = [0.0_f64; 3];
        for (slot, value) in coords.iter_mut().zip(values.iter()) {
            *slot = value.as_number().ok_or_else(|| {
                self.err(RuntimeErrorKind::GeometryEngine("point coordinates must be numbers".to_string()), call_range)
            })?;
        }
        let world = scope.transform().apply_point(Vec3::new(coords[0], coords[1], coords[2]));
        scope.push_point(PointValue { position: [world.x, world.y, world.z], is_curved, color: None });
        Ok(())
    }

    // ---- user-defined blocks/functions -----------------------------------

    /// Invokes a user-defined `name { body }` block. The call-site
    /// `body`'s leading statements are checked against the definition's
    /// own leading `option` declarations (`declared`): a statement shaped
    /// like `points 6` is treated as an override for `option points ...`
    /// and bound into the child scope *before* the definition body runs,
    /// so the definition's own `option points 5` becomes a no-op
    /// (`Scope` exposes `has_local` exactly so the `Option` statement can
    /// detect this). This is a deliberate simplification: the grammar gives
    /// `points 6` no arity of its own (only `define`d names get one), so
    /// it parses as a generic juxtaposed tuple rather than a `points`
    /// command — matched here by shape instead.
    ///
    /// A body resolving to exactly one child shape splices that shape up
    /// under the block's own name instead of nesting it inside a
    /// synthetic group (invoking `star` yields a bare `path`, not a
    /// `path` nested inside a `star` group). A body with zero or
    /// multiple children is wrapped in a `GeometryKind::Group` plan so
    /// it still has a fingerprint of its own when used as a CSG/builder
    /// operand.
    fn invoke_user_block(
        &self,
        name: &str,
        params: &[String],
        body: &Rc<Vec<Statement>>,
        closure: &Rc<Scope>,
        call_args: &[Expression],
        call_body: &[Statement],
        call_range: SourceRange,
        caller_scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        self.enter_call(call_range)?;
        let outcome = (|| {
            let child = closure.bound_child(caller_scope);
            for (index, pname) in params.iter().enumerate() {
                let value = match call_args.get(index) {
                    Some(expr) => self.eval_expr(expr, caller_scope)?,
                    None => Value::unset(),
                };
                child.define(pname.clone(), Binding::Value(value));
            }

            let declared = leading_option_names(body);
            for stmt in call_body {
                if let Some((opt_name, opt_args)) = option_override_shape(stmt) {
                    if declared.iter().any(|d| *d == opt_name) {
                        let value = self.eval_override_value(opt_args, caller_scope)?;
                        child.define(opt_name.to_string(), Binding::Value(value));
                        continue;
                    }
                }
                self.eval_statement(stmt, &child)?;
            }

            self.run_statements(body, &child)?;
            let mut kids = child.take_children();
            // A block that resolves to exactly one child shape (the
            // common case: `define star { path { ... } }`) splices that
            // shape up under the block's own name rather than wrapping
            // it in an extra grouping node: `star` invoked with an
            // option override yields a bare `path`, not a `path` nested
            // inside a `star` group.
            if kids.len() == 1 {
                let mut only = kids.remove(0);
                only.name = Some(name.to_string());
                caller_scope.push_child(only);
                return Ok(());
            }
            let fingerprints = collect_child_fingerprints(&kids);
            let plan = GeometryPlan {
                kind: GeometryKind::Group,
                params: Vec::new(),
                detail: child.detail(),
                smoothing: child.smoothing(),
                children: fingerprints,
                material: child.material(),
            };
            let node = GeometryNode::new(call_range, Some(name.to_string()), child.transform(), child.material(), Some(plan), kids);
            caller_scope.push_child(node);
            Ok(())
        })();
        self.exit_call();
        outcome
    }

    fn eval_override_value(&self, args: &[Expression], scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        if args.len() == 1 {
            return self.eval_expr(&args[0], scope);
        }
        let values = self.eval_args(args, scope)?;
        Ok(Value::Tuple(Rc::new(values)))
    }

    /// Invokes a user-defined function/block by value, used both for a
    /// bare `name(args)` [`crate::ast::StatementKind::Command`] and a
    /// [`ExpressionKind::FunctionCall`]. Returns the body's last
    /// expression-statement value (the value-`define` convention) plus
    /// any geometry it emitted, which the caller pushes into its own
    /// scope.
    fn invoke_user_function(
        &self,
        params: &[String],
        body: &Rc<Vec<Statement>>,
        closure: &Rc<Scope>,
        arg_values: &[Value],
        call_range: SourceRange,
        caller_scope: &Rc<Scope>,
    ) -> Result<(Value, Vec<GeometryNode>), RuntimeError> {
        self.enter_call(call_range)?;
        let outcome = (|| {
            let child = closure.bound_child(caller_scope);
            for (index, pname) in params.iter().enumerate() {
                let value = arg_values.get(index).cloned().unwrap_or_else(Value::unset);
                child.define(pname.clone(), Binding::Value(value));
            }
            let value = self.run_statements(body, &child)?;
            Ok((value, child.take_children()))
        })();
        self.exit_call();
        outcome
    }

    // ---- built-in commands ------------------------------------------------

    fn apply_builtin_command(
        &self,
        name: &str,
        args: &[Expression],
        call_range: SourceRange,
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        let values = self.eval_args(args, scope)?;
        let bad = || self.err(RuntimeErrorKind::GeometryEngine(format!("invalid arguments to '{name}'")), call_range);
        match name {
            "color" | "colour" => {
                let c = values_to_color(&values).ok_or_else(bad)?;
                let mut material = scope.material();
                material.color = c;
                scope.set_material(material);
            }
            "texture" => {
                let mut material = scope.material();
                material.texture = values.first().and_then(value_to_string);
                scope.set_material(material);
            }
            "opacity" => {
                let n = values.first().and_then(Value::as_number).ok_or_else(bad)?;
                let mut material = scope.material();
                material.opacity = n;
                scope.set_material(material);
            }
            "font" => {
                let mut material = scope.material();
                material.font = values.first().and_then(value_to_string);
                scope.set_material(material);
            }
            "detail" => {
                let n = values.first().and_then(Value::as_number).ok_or_else(bad)?;
                scope.set_detail(n.max(0.0).round() as u32);
            }
            "smoothing" => {
                let n = values.first().and_then(Value::as_number).ok_or_else(bad)?;
                scope.set_smoothing(Some(n));
            }
            "position" | "translate" => {
                scope.apply_local_transform(&Transform::translation(vec3_from_values(&values)));
            }
            "orientation" | "rotate" => {
                scope.apply_local_transform(&Transform::rotation(vec3_from_values(&values)));
            }
            "size" => {
                let v = splat_or_vec3(&values);
                scope.set_size([v.x, v.y, v.z]);
                scope.apply_local_transform(&Transform::scale(v));
            }
            "scale" => {
                scope.apply_local_transform(&Transform::scale(splat_or_vec3(&values)));
            }
            "background" => {
                let c = values_to_color(&values).ok_or_else(bad)?;
                scope.set_background(c);
            }
            "print" => self.delegate.print(&display_all(&values)),
            "debug" => self.delegate.debug_log(&display_all(&values)),
            "assert" => {
                let truthy = values.first().map(Value::is_truthy).unwrap_or(false);
                if !truthy {
                    return Err(self.err(RuntimeErrorKind::AssertionFailure, call_range));
                }
            }
            "seed" => {
                let n = values.first().and_then(Value::as_number).ok_or_else(bad)?;
                scope.reseed(n);
            }
            _ => {}
        }
        Ok(())
    }

    // ---- expressions -------------------------------------------------------

    fn eval_args(&self, args: &[Expression], scope: &Rc<Scope>) -> Result<Vec<Value>, RuntimeError> {
        args.iter().map(|e| self.eval_expr(e, scope)).collect()
    }

    fn eval_expr(&self, expr: &Expression, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        self.poll_cancel(expr.range)?;
        match &expr.kind {
            ExpressionKind::Literal(lit) => Ok(literal_to_value(lit)),
            ExpressionKind::Identifier(name) => self.eval_identifier(name, expr.range, scope),
            ExpressionKind::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, scope)?);
                }
                if values.len() == 1 {
                    Ok(values.into_iter().next().unwrap_or_else(Value::unset))
                } else {
                    Ok(Value::Tuple(Rc::new(values)))
                }
            }
            ExpressionKind::Member { receiver, member, member_range } => {
                let value = self.eval_expr(receiver, scope)?;
                value.member(member).map_err(|k| self.err(k, *member_range))
            }
            ExpressionKind::Subscript { receiver, index } => {
                let value = self.eval_expr(receiver, scope)?;
                let index_value = self.eval_expr(index, scope)?;
                value.subscript(&index_value).map_err(|k| self.err(k, expr.range))
            }
            ExpressionKind::Range { start, end, step } => self.eval_range(start, end, step.as_deref(), expr.range, scope),
            ExpressionKind::Infix { left, op, right } => self.eval_infix(*op, left, right, expr.range, scope),
            ExpressionKind::Prefix { op, operand } => self.eval_prefix(*op, operand, expr.range, scope),
            ExpressionKind::FunctionCall { name, arguments, .. } => self.eval_function_call(name, arguments, expr.range, scope),
            ExpressionKind::BlockCall { name, arguments, body } => {
                self.invoke_block(name.as_deref(), arguments, body, expr.range, scope)?;
                Ok(Value::unset())
            }
        }
    }

    fn eval_range(
        &self,
        start: &Expression,
        end: &Expression,
        step: Option<&Expression>,
        range: SourceRange,
        scope: &Rc<Scope>,
    ) -> Result<Value, RuntimeError> {
        let bounds_err = || self.err(RuntimeErrorKind::GeometryEngine("range bounds must be numbers".to_string()), range);
        let s = self.eval_expr(start, scope)?.as_number().ok_or_else(bounds_err)?;
        let e = self.eval_expr(end, scope)?.as_number().ok_or_else(bounds_err)?;
        let step_value = match step {
            Some(step_expr) => self
                .eval_expr(step_expr, scope)?
                .as_number()
                .ok_or_else(|| self.err(RuntimeErrorKind::GeometryEngine("range step must be a number".to_string()), range))?,
            None => 1.0,
        };
        let range_value = RangeValue::new(s, e, step_value)
            .ok_or_else(|| self.err(RuntimeErrorKind::GeometryEngine("range step cannot be zero".to_string()), range))?;
        Ok(Value::Range(range_value))
    }

    fn eval_infix(&self, op: InfixOp, left: &Expression, right: &Expression, range: SourceRange, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        match op {
            InfixOp::And => {
                let l = self.eval_expr(left, scope)?;
                if !l.is_truthy() {
                    return Ok(Value::Number(0.0));
                }
                let r = self.eval_expr(right, scope)?;
                Ok(Value::Number(f64::from(r.is_truthy())))
            }
            InfixOp::Or => {
                let l = self.eval_expr(left, scope)?;
                if l.is_truthy() {
                    return Ok(Value::Number(1.0));
                }
                let r = self.eval_expr(right, scope)?;
                Ok(Value::Number(f64::from(r.is_truthy())))
            }
            InfixOp::In => {
                let l = self.eval_expr(left, scope)?;
                let r = self.eval_expr(right, scope)?;
                r.contains(&l)
                    .map(|b| Value::Number(f64::from(b)))
                    .ok_or_else(|| self.err(RuntimeErrorKind::GeometryEngine("values are not comparable via 'in'".to_string()), range))
            }
            InfixOp::Equal | InfixOp::NotEqual => {
                let l = self.eval_expr(left, scope)?;
                let r = self.eval_expr(right, scope)?;
                let equal = l.values_equal(&r);
                Ok(Value::Number(f64::from(if op == InfixOp::Equal { equal } else { !equal })))
            }
            InfixOp::Less | InfixOp::LessEqual | InfixOp::Greater | InfixOp::GreaterEqual => {
                let l = self.eval_expr(left, scope)?;
                let r = self.eval_expr(right, scope)?;
                let ordering = l
                    .compare(&r)
                    .ok_or_else(|| self.err(RuntimeErrorKind::GeometryEngine("values are not comparable".to_string()), range))?;
                let result = match op {
                    InfixOp::Less => ordering.is_lt(),
                    InfixOp::LessEqual => ordering.is_le(),
                    InfixOp::Greater => ordering.is_gt(),
                    InfixOp::GreaterEqual => ordering.is_ge(),
                    _ => unreachable!("guarded by the outer match arm"),
                };
                Ok(Value::Number(f64::from(result)))
            }
            InfixOp::Add | InfixOp::Subtract | InfixOp::Multiply | InfixOp::Divide | InfixOp::Modulo => {
                let l = self.eval_expr(left, scope)?;
                let r = self.eval_expr(right, scope)?;
                l.arithmetic(op, &r).map_err(|k| self.err(k, range))
            }
        }
    }

    fn eval_prefix(&self, op: PrefixOp, operand: &Expression, range: SourceRange, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        let value = self.eval_expr(operand, scope)?;
        match op {
            PrefixOp::Not => Ok(Value::Number(f64::from(!value.is_truthy()))),
            PrefixOp::Negate => negate_value(&value)
                .ok_or_else(|| self.err(RuntimeErrorKind::GeometryEngine(format!("{} cannot be negated", value.kind().describe())), range)),
        }
    }

    fn eval_identifier(&self, name: &str, range: SourceRange, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        if let Some(binding) = scope.resolve(name) {
            return Ok(match binding {
                Binding::Value(v) => v,
                Binding::Function { body, closure, .. } => Value::Block(Rc::new(crate::value::BlockValue { body, closure })),
                Binding::Option { default } => default,
            });
        }
        if name == "rnd" {
            return Ok(Value::Number(scope.next_random()));
        }
        if let Some(color) = named_color(name) {
            return Ok(Value::Color(color.map(|c| f64::from(c) / 255.0)));
        }
        Err(self.err(RuntimeErrorKind::GeometryEngine(format!("unknown symbol '{name}'")), range))
    }

    fn eval_function_call(&self, name: &str, arguments: &[Expression], range: SourceRange, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        if name == "rnd" {
            return Ok(Value::Number(scope.next_random()));
        }
        if let Some(Binding::Function { params, body, closure }) = scope.resolve(name) {
            let values = self.eval_args(arguments, scope)?;
            let (value, kids) = self.invoke_user_function(&params, &body, &closure, &values, range, scope)?;
            for kid in kids {
                scope.push_child(kid);
            }
            return Ok(value);
        }
        if let Some(sig) = scope.stdlib().lookup(name) {
            return match sig.kind {
                SymbolKind::Function => {
                    let values = self.eval_args(arguments, scope)?;
                    self.eval_builtin_function(name, &values, range)
                }
                SymbolKind::Constant => self.eval_identifier(name, range, scope),
                SymbolKind::Block | SymbolKind::Command => {
                    self.invoke_block(Some(name), arguments, &[], range, scope)?;
                    Ok(Value::unset())
                }
            };
        }
        Err(self.err(RuntimeErrorKind::GeometryEngine(format!("unknown symbol '{name}'")), range))
    }

    fn eval_builtin_function(&self, name: &str, args: &[Value], range: SourceRange) -> Result<Value, RuntimeError> {
        let num = |i: usize| -> Result<f64, RuntimeError> {
            args.get(i)
                .and_then(Value::as_number)
                .ok_or_else(|| self.err(RuntimeErrorKind::GeometryEngine(format!("'{name}' expects numeric arguments")), range))
        };
        let result = match name {
            "round" => num(0)?.round(),
            "floor" => num(0)?.floor(),
            "ceil" => num(0)?.ceil(),
            "abs" => num(0)?.abs(),
            "sign" => num(0)?.signum(),
            "sqrt" => num(0)?.sqrt(),
            "pow" => num(0)?.powf(num(1)?),
            "min" => self.fold_numbers(args, name, range, f64::min, f64::INFINITY)?,
            "max" => self.fold_numbers(args, name, range, f64::max, f64::NEG_INFINITY)?,
            "sum" => self.fold_numbers(args, name, range, |a, b| a + b, 0.0)?,
            "sin" => num(0)?.sin(),
            "cos" => num(0)?.cos(),
            "tan" => num(0)?.tan(),
            "asin" => num(0)?.asin(),
            "acos" => num(0)?.acos(),
            "atan" => num(0)?.atan(),
            "atan2" => num(0)?.atan2(num(1)?),
            "dot" | "cross" | "length" | "normalize" => return self.eval_vector_function(name, args, range),
            "split" | "join" | "trim" => return self.eval_string_function(name, args, range),
            _ => return Err(self.err(RuntimeErrorKind::GeometryEngine(format!("'{name}' is not implemented")), range)),
        };
        Ok(Value::Number(result))
    }

    fn fold_numbers(
        &self,
        args: &[Value],
        name: &str,
        range: SourceRange,
        f: impl Fn(f64, f64) -> f64,
        init: f64,
    ) -> Result<f64, RuntimeError> {
        let mut acc = init;
        for v in args {
            let n = v
                .as_number()
                .ok_or_else(|| self.err(RuntimeErrorKind::GeometryEngine(format!("'{name}' expects numeric arguments")), range))?;
            acc = f(acc, n);
        }
        if args.is_empty() {
            acc = 0.0;
        }
        Ok(acc)
    }

    fn eval_vector_function(&self, name: &str, args: &[Value], range: SourceRange) -> Result<Value, RuntimeError> {
        let bad = || self.err(RuntimeErrorKind::GeometryEngine(format!("'{name}' expects vector arguments")), range);
        match name {
            "dot" => {
                let a = value_to_vec3(args.first().ok_or_else(bad)?).ok_or_else(bad)?;
                let b = value_to_vec3(args.get(1).ok_or_else(bad)?).ok_or_else(bad)?;
                Ok(Value::Number(a.dot(b)))
            }
            "cross" => {
                let a = value_to_vec3(args.first().ok_or_else(bad)?).ok_or_else(bad)?;
                let b = value_to_vec3(args.get(1).ok_or_else(bad)?).ok_or_else(bad)?;
                let c = a.cross(b);
                Ok(Value::Vector([c.x, c.y, c.z]))
            }
            "length" => {
                let a = value_to_vec3(args.first().ok_or_else(bad)?).ok_or_else(bad)?;
                Ok(Value::Number(a.length()))
            }
            "normalize" => {
                let a = value_to_vec3(args.first().ok_or_else(bad)?).ok_or_else(bad)?;
                let n = a.normalize();
                Ok(Value::Vector([n.x, n.y, n.z]))
            }
            _ => unreachable!("dispatched only for dot/cross/length/normalize"),
        }
    }

    fn eval_string_function(&self, name: &str, args: &[Value], range: SourceRange) -> Result<Value, RuntimeError> {
        let bad = || self.err(RuntimeErrorKind::GeometryEngine(format!("'{name}' expects string arguments")), range);
        match name {
            "split" => {
                let s = value_to_string(args.first().ok_or_else(bad)?).ok_or_else(bad)?;
                let sep = value_to_string(args.get(1).ok_or_else(bad)?).ok_or_else(bad)?;
                let parts: Vec<Value> = if sep.is_empty() {
                    s.chars().map(|c| Value::String(Rc::from(c.to_string().as_str()))).collect()
                } else {
                    s.split(sep.as_str()).map(|p| Value::String(Rc::from(p))).collect()
                };
                Ok(Value::Tuple(Rc::new(parts)))
            }
            "join" => {
                let Value::Tuple(items) = args.first().ok_or_else(bad)? else {
                    return Err(bad());
                };
                let sep = value_to_string(args.get(1).ok_or_else(bad)?).ok_or_else(bad)?;
                let joined = items.iter().map(Value::display_string).collect::<Vec<_>>().join(&sep);
                Ok(Value::String(Rc::from(joined.as_str())))
            }
            "trim" => {
                let s = value_to_string(args.first().ok_or_else(bad)?).ok_or_else(bad)?;
                Ok(Value::String(Rc::from(s.trim())))
            }
            _ => unreachable!("dispatched only for split/join/trim"),
        }
    }
}

fn synthetic_runtime_error(message: String, range: Option<SourceRange>) -> RuntimeError {
    Located { kind: RuntimeErrorKind::GeometryEngine(message), range, hint: None }
}

fn map_import_error(e: shapescript_scene_port::ImportError) -> RuntimeErrorKind {
    use shapescript_scene_port::ImportError;
    match e {
        ImportError::AccessRestricted(p) => RuntimeErrorKind::FileAccessRestricted(p),
        ImportError::NotFound(p) => RuntimeErrorKind::FileNotFound(p),
        ImportError::TimedOut(p) => RuntimeErrorKind::FileTimedOut(p),
        ImportError::Circular(p) => RuntimeErrorKind::CircularImport(p),
        ImportError::Other(p, reason) => RuntimeErrorKind::GeometryEngine(format!("import of \"{p}\" failed: {reason}")),
    }
}

fn leading_option_names(body: &[Statement]) -> Vec<&str> {
    let mut names = Vec::new();
    for stmt in body {
        match &stmt.kind {
            StatementKind::Option { name, .. } => names.push(name.as_str()),
            _ => break,
        }
    }
    names
}

/// Matches a call-site statement that *shapes* like an option override:
/// `points 6` (a `Command`), the equivalent juxtaposed-tuple expression
/// form, or a bare `points` identifier. Returns the candidate option name
/// and its argument expressions; the caller still checks the name
/// against the callee's declared options before treating it as one.
fn option_override_shape(stmt: &Statement) -> Option<(&str, &[Expression])> {
    match &stmt.kind {
        StatementKind::Command { name, arguments, .. } => Some((name.as_str(), arguments.as_slice())),
        StatementKind::ExpressionStatement(expr) => match &expr.kind {
            ExpressionKind::Tuple(items) => match items.first() {
                Some(Expression { kind: ExpressionKind::Identifier(name), .. }) => Some((name.as_str(), &items[1..])),
                _ => None,
            },
            ExpressionKind::Identifier(name) => Some((name.as_str(), &[])),
            _ => None,
        },
        _ => None,
    }
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(Rc::from(s.as_str())),
        Literal::HexColor(c) => Value::Color(c.map(|channel| f64::from(channel) / 255.0)),
    }
}

fn negate_value(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::Number(-n)),
        Value::Vector(v) => Some(Value::Vector([-v[0], -v[1], -v[2]])),
        Value::Size(v) => Some(Value::Size([-v[0], -v[1], -v[2]])),
        Value::Rotation(v) => Some(Value::Rotation([-v[0], -v[1], -v[2]])),
        Value::Tuple(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                out.push(negate_value(item)?);
            }
            Some(Value::Tuple(Rc::new(out)))
        }
        _ => None,
    }
}

fn iterable_items(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Range(r) => Some(r.enumerate().into_iter().map(Value::Number).collect()),
        Value::Tuple(items) => Some(items.as_ref().clone()),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        _ => None,
    }
}

fn value_to_vec3(value: &Value) -> Option<Vec3> {
    match value {
        Value::Vector(v) | Value::Size(v) | Value::Rotation(v) => Some(Vec3::new(v[0], v[1], v[2])),
        Value::Tuple(items) if items.len() == 3 => {
            let mut c = [0.0; 3];
            for (slot, item) in c.iter_mut().zip(items.iter()) {
                *slot = item.as_number()?;
            }
            Some(Vec3::new(c[0], c[1], c[2]))
        }
        _ => None,
    }
}

fn vec3_from_values(values: &[Value]) -> Vec3 {
    let numbers: Vec<f64> = values.iter().filter_map(Value::as_number).collect();
    Vec3::new(numbers.first().copied().unwrap_or(0.0), numbers.get(1).copied().unwrap_or(0.0), numbers.get(2).copied().unwrap_or(0.0))
}

fn splat_or_vec3(values: &[Value]) -> Vec3 {
    let numbers: Vec<f64> = values.iter().filter_map(Value::as_number).collect();
    match numbers.len() {
        0 => Vec3::splat(1.0),
        1 => Vec3::splat(numbers[0]),
        2 => Vec3::new(numbers[0], numbers[1], 1.0),
        _ => Vec3::new(numbers[0], numbers[1], numbers[2]),
    }
}

fn values_to_color(values: &[Value]) -> Option<[f64; 4]> {
    if values.len() == 1 {
        if let Value::Color(c) = &values[0] {
            return Some(*c);
        }
        if let Value::String(s) = &values[0] {
            return named_color(s.as_ref()).map(|c| c.map(|channel| f64::from(channel) / 255.0));
        }
    }
    let numbers: Vec<f64> = values.iter().filter_map(Value::as_number).collect();
    match numbers.len() {
        1 => Some([numbers[0], numbers[0], numbers[0], 1.0]),
        3 => Some([numbers[0], numbers[1], numbers[2], 1.0]),
        4 => Some([numbers[0], numbers[1], numbers[2], numbers[3]]),
        _ => None,
    }
}

fn display_all(values: &[Value]) -> Vec<String> {
    values.iter().map(Value::display_string).collect()
}

/// Flattens child nodes' fingerprints for a CSG/builder/group plan's
/// `children` list. A child with `plan: None` (a pure grouping node) has
/// no fingerprint of its own, so its own children are spliced in instead
/// — a nested bare `{ }` never hides geometry from an enclosing CSG
/// operator.
fn collect_child_fingerprints(children: &[GeometryNode]) -> Vec<u128> {
    let mut out = Vec::new();
    for child in children {
        match &child.plan {
            Some(plan) => out.push(Fingerprint::of(plan).0),
            None => out.extend(collect_child_fingerprints(&child.children)),
        }
    }
    out
}

/// Flattens a path/polygon's accumulated points into a plan's `params`:
/// point count, then four `f64`s per point (`x, y, z, is_curved`).
fn encode_points(points: &[PointValue]) -> Vec<f64> {
    let mut out = Vec::with_capacity(1 + points.len() * 4);
    out.push(points.len() as f64);
    for point in points {
        out.push(point.position[0]);
        out.push(point.position[1]);
        out.push(point.position[2]);
        out.push(f64::from(point.is_curved));
    }
    out
}

fn stdlib_geometry_kind(name: &str) -> GeometryKind {
    match name {
        "cube" => GeometryKind::Cube,
        "sphere" => GeometryKind::Sphere,
        "cone" => GeometryKind::Cone,
        "cylinder" => GeometryKind::Cylinder,
        "circle" => GeometryKind::Circle,
        "square" => GeometryKind::Square,
        "roundrect" => GeometryKind::RoundRect,
        "polygon" => GeometryKind::Polygon,
        "path" | "mesh" => GeometryKind::Path,
        "text" => GeometryKind::Text,
        "fill" => GeometryKind::Fill,
        "lathe" => GeometryKind::Lathe,
        "extrude" => GeometryKind::Extrude,
        "loft" => GeometryKind::Loft,
        "hull" => GeometryKind::Hull,
        "minkowski" => GeometryKind::Minkowski,
        "union" => GeometryKind::Union,
        "difference" => GeometryKind::Difference,
        "intersection" => GeometryKind::Intersection,
        "xor" => GeometryKind::Xor,
        "stencil" => GeometryKind::Stencil,
        _ => GeometryKind::Group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::BuildState;

    struct StubDelegate;

    impl EvaluationDelegate for StubDelegate {
        fn resolve_url(&self, path: &str) -> shapescript_scene_port::Url {
            shapescript_scene_port::Url(path.to_string())
        }
        fn import_content(&self, _url: &shapescript_scene_port::Url) -> Result<ImportedContent, shapescript_scene_port::ImportError> {
            Err(shapescript_scene_port::ImportError::NotFound("unused in tests".to_string()))
        }
        fn debug_log(&self, _formatted_values: &[String]) {}
        fn print(&self, _formatted_values: &[String]) {}
    }

    fn eval_source(source: &str) -> Result<Scene, RuntimeError> {
        let (tokens, lex_error) = crate::lexer::lex(source);
        assert!(lex_error.is_none(), "lex error: {lex_error:?}");
        let stdlib = crate::stdlib::Stdlib::new();
        let (program, parse_error) = crate::parser::parse(tokens, &stdlib);
        assert!(parse_error.is_none(), "parse error: {parse_error:?}");
        let analysis_errors = crate::analyzer::analyze(&program, &stdlib);
        assert!(analysis_errors.is_empty(), "analysis errors: {analysis_errors:?}");
        evaluate(&program, &StubDelegate, &NeverCancel)
    }

    #[test]
    fn minimal_cube_produces_one_root_node() {
        let scene = eval_source("cube").unwrap();
        assert_eq!(scene.roots.len(), 1);
        assert_eq!(scene.roots[0].plan.as_ref().unwrap().kind, GeometryKind::Cube);
        assert!(matches!(*scene.roots[0].state.borrow(), BuildState::Declared));
    }

    #[test]
    fn color_command_does_not_leak_out_of_its_block() {
        let scene = eval_source("color red { cube } sphere").unwrap();
        assert_eq!(scene.roots.len(), 2);
        assert_eq!(scene.roots[0].material.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(scene.roots[1].material.color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn for_loop_with_step_emits_one_node_per_iteration() {
        let scene = eval_source("for i in 0 to 4 step 2 { cube }").unwrap();
        assert_eq!(scene.roots.len(), 3);
    }

    #[test]
    fn block_option_override_binds_before_body_runs() {
        let source = r#"
            define star {
                option points 5
                path {
                    for i in 1 to points {
                        point 0 -1
                        rotate 0 0 1
                    }
                }
            }
            star { points 6 }
        "#;
        let scene = eval_source(source).unwrap();
        assert_eq!(scene.roots.len(), 1);
        let path_plan = scene.roots[0].plan.as_ref().expect("star splices its path child as its own plan");
        assert_eq!(path_plan.params[0], 6.0);
    }

    #[test]
    fn difference_takes_material_from_first_child() {
        let scene = eval_source("difference { color red cube color blue sphere }").unwrap();
        let plan = scene.roots[0].plan.as_ref().unwrap();
        assert_eq!(plan.kind, GeometryKind::Difference);
        assert_eq!(plan.material.color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn stencil_takes_material_from_second_child() {
        let scene = eval_source("stencil { color red cube color blue sphere }").unwrap();
        let plan = scene.roots[0].plan.as_ref().unwrap();
        assert_eq!(plan.kind, GeometryKind::Stencil);
        assert_eq!(plan.material.color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn unknown_symbol_is_a_runtime_error() {
        let err = eval_source("frobnicate 1 2 3");
        assert!(err.is_err());
    }

    #[test]
    fn cancellation_is_observed_between_statements() {
        struct AlwaysCancel;
        impl CancelOracle for AlwaysCancel {
            fn is_cancelled(&self) -> bool {
                true
            }
        }
        let (tokens, _) = crate::lexer::lex("cube");
        let stdlib = crate::stdlib::Stdlib::new();
        let (program, _) = crate::parser::parse(tokens, &stdlib);
        let result = evaluate(&program, &StubDelegate, &AlwaysCancel);
        assert!(matches!(result, Err(e) if e.kind == RuntimeErrorKind::Cancelled));
    }
}
