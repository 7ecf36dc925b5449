// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The runtime value model: a tagged sum type with
//! structural coercion. Compound payloads are `Rc`-wrapped so copies are
//! O(1) — evaluation is single-threaded, so there is no need to pay for
//! `Arc`'s atomics.

use std::cmp::Ordering;
use std::rc::Rc;

use shapescript_scene_port::MaterialSpec;

use crate::ast::InfixOp;
use crate::error::RuntimeErrorKind;

/// A runtime value. Cloning is cheap: scalars copy, compounds share their
/// `Rc`-wrapped payload.
#[derive(Debug, Clone)]
pub enum Value {
    /// All numerics unified; `true = 1`, `false = 0`.
    Number(f64),
    /// A UTF-8 string.
    String(Rc<str>),
    /// An RGBA color, channels clamped to `[0, 1]` on construction.
    Color([f64; 4]),
    /// A 3-component vector, semantically distinct from [`Value::Size`]
    /// and [`Value::Rotation`] but interchangeable via coercion.
    Vector([f64; 3]),
    /// Width/height/depth.
    Size([f64; 3]),
    /// Roll/yaw/pitch, in radians.
    Rotation([f64; 3]),
    /// The universal compound: an ordered sequence, lazily reinterpreted
    /// as vector/size/color/rotation based on arity.
    Tuple(Rc<Vec<Value>>),
    /// A mapping from name to value, insertion-ordered internally but
    /// iterated in sorted key order.
    Object(Rc<ObjectValue>),
    /// An inclusive `start..=end` stepped range.
    Range(RangeValue),
    /// A 2D path: points, subpaths, and an optional containing plane.
    Path(Rc<PathValue>),
    /// A materialized mesh: polygons, bounds, watertightness, material.
    Mesh(Rc<MeshValue>),
    /// A single polygon.
    Polygon(Rc<PolygonValue>),
    /// A single path/polygon point.
    Point(Rc<PointValue>),
    /// A parameterless thunk captured with its defining scope, invoked by
    /// name at a block callsite.
    Block(Rc<BlockValue>),
}

/// An object value: insertion order preserved for evaluation order,
/// iteration order sorted by key.
#[derive(Debug, Clone, Default)]
pub struct ObjectValue {
    /// `(key, value)` pairs in insertion order.
    pub entries: Vec<(String, Value)>,
}

impl ObjectValue {
    /// Looks up a key, ignoring insertion order.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Keys and values in sorted-key order, matching this type's
    /// iteration rule.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<&(String, Value)> {
        let mut sorted: Vec<&(String, Value)> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
    }
}

/// An inclusive, stepped numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValue {
    /// Inclusive start.
    pub start: f64,
    /// Inclusive end.
    pub end: f64,
    /// Step; `0.0` is invalid and rejected at construction.
    pub step: f64,
}

impl RangeValue {
    /// Builds a range, returning `None` for the invalid `step = 0` case.
    #[must_use]
    pub fn new(start: f64, end: f64, step: f64) -> Option<Self> {
        if step == 0.0 {
            return None;
        }
        Some(Self { start, end, step })
    }

    /// Whether this range enumerates no values: `step > 0` with
    /// `start > end`, or `step < 0` with `start < end`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        (self.step > 0.0 && self.start > self.end) || (self.step < 0.0 && self.start < self.end)
    }

    /// Whether `value` is one of this range's enumerated members.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        if self.is_empty() {
            return false;
        }
        let steps_from_start = (value - self.start) / self.step;
        if steps_from_start < -f64::EPSILON {
            return false;
        }
        let rounded = steps_from_start.round();
        if (steps_from_start - rounded).abs() > 1e-9 {
            return false;
        }
        let at = self.start + rounded * self.step;
        if self.step > 0.0 { at <= self.end + 1e-9 } else { at >= self.end - 1e-9 }
    }

    /// Enumerates this range's members, inclusive of both endpoints.
    #[must_use]
    pub fn enumerate(&self) -> Vec<f64> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut values = Vec::new();
        let mut current = self.start;
        let ascending = self.step > 0.0;
        loop {
            values.push(current);
            current += self.step;
            let past_end = if ascending { current > self.end + 1e-9 } else { current < self.end - 1e-9 };
            if past_end {
                break;
            }
        }
        values
    }
}

/// A 2D path value.
#[derive(Debug, Clone, Default)]
pub struct PathValue {
    /// The path's points, in order.
    pub points: Vec<PointValue>,
    /// Indices into `points` dividing the path into subpaths.
    pub subpath_breaks: Vec<usize>,
    /// The plane the path's points lie in, if planar (`[a, b, c, d]` for
    /// `ax+by+cz=d`).
    pub plane: Option<[f64; 4]>,
}

impl PathValue {
    /// Whether this path's first and last point coincide.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() >= 2 => a.position == b.position,
            _ => false,
        }
    }
}

/// A single path/polygon point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointValue {
    /// The point's position.
    pub position: [f64; 3],
    /// Whether this point is a curve-through-control-point rather than a
    /// hard corner.
    pub is_curved: bool,
    /// An optional per-point color override.
    pub color: Option<[f64; 4]>,
}

/// A single polygon.
#[derive(Debug, Clone)]
pub struct PolygonValue {
    /// The polygon's vertices.
    pub vertices: Vec<PointValue>,
    /// The polygon's material.
    pub material: MaterialSpec,
    /// The plane this polygon lies in.
    pub plane: [f64; 4],
}

/// A materialized mesh: the evaluator's view of geometry once built by
/// the external geometry engine.
#[derive(Debug, Clone)]
pub struct MeshValue {
    /// The mesh's polygons.
    pub polygons: Vec<PolygonValue>,
    /// The mesh's axis-aligned bounds.
    pub bounds: shapescript_geom::Bounds,
    /// Whether the mesh forms a closed manifold.
    pub watertight: bool,
    /// The mesh's material.
    pub material: MaterialSpec,
}

/// A parameterless thunk captured with its defining scope.
#[derive(Debug, Clone)]
pub struct BlockValue {
    /// The block body's statements.
    pub body: Rc<Vec<crate::ast::Statement>>,
    /// The scope the block closes over.
    pub closure: Rc<crate::scope::Scope>,
}

/// Which [`Value`] variant a value holds, used for static type checking
/// and error messages without requiring a whole value in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Number`]
    Number,
    /// [`Value::String`]
    String,
    /// [`Value::Color`]
    Color,
    /// [`Value::Vector`]
    Vector,
    /// [`Value::Size`]
    Size,
    /// [`Value::Rotation`]
    Rotation,
    /// [`Value::Tuple`]
    Tuple,
    /// [`Value::Object`]
    Object,
    /// [`Value::Range`]
    Range,
    /// [`Value::Path`]
    Path,
    /// [`Value::Mesh`]
    Mesh,
    /// [`Value::Polygon`]
    Polygon,
    /// [`Value::Point`]
    Point,
    /// [`Value::Block`]
    Block,
}

impl ValueKind {
    /// A human-readable name for diagnostics.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Color => "color",
            ValueKind::Vector => "vector",
            ValueKind::Size => "size",
            ValueKind::Rotation => "rotation",
            ValueKind::Tuple => "tuple",
            ValueKind::Object => "object",
            ValueKind::Range => "range",
            ValueKind::Path => "path",
            ValueKind::Mesh => "mesh",
            ValueKind::Polygon => "polygon",
            ValueKind::Point => "point",
            ValueKind::Block => "block",
        }
    }
}

impl Value {
    /// This value's [`ValueKind`] tag.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Color(_) => ValueKind::Color,
            Value::Vector(_) => ValueKind::Vector,
            Value::Size(_) => ValueKind::Size,
            Value::Rotation(_) => ValueKind::Rotation,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Object(_) => ValueKind::Object,
            Value::Range(_) => ValueKind::Range,
            Value::Path(_) => ValueKind::Path,
            Value::Mesh(_) => ValueKind::Mesh,
            Value::Polygon(_) => ValueKind::Polygon,
            Value::Point(_) => ValueKind::Point,
            Value::Block(_) => ValueKind::Block,
        }
    }

    /// Builds a clamped color, defaulting alpha to `1.0`.
    #[must_use]
    pub fn color(r: f64, g: f64, b: f64, a: f64) -> Value {
        Value::Color([r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), a.clamp(0.0, 1.0)])
    }

    /// An empty tuple, which coerces to "unset" wherever a default is
    /// needed.
    #[must_use]
    pub fn unset() -> Value {
        Value::Tuple(Rc::new(Vec::new()))
    }

    /// Whether this value is the empty-tuple "unset" sentinel.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Tuple(items) if items.is_empty())
    }

    /// Truthiness: used by `if`/`and`/`or`/`not`. Numbers are truthy when
    /// nonzero; every other kind is truthy unless it is the unset tuple.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            other => !other.is_unset(),
        }
    }

    /// Coerces a value into a flat `f64` slice view when it structurally
    /// supports it (number, tuple-of-numbers, vector/size/rotation,
    /// color), for elementwise arithmetic.
    fn as_numeric_components(&self) -> Option<Vec<f64>> {
        match self {
            Value::Number(n) => Some(vec![*n]),
            Value::Vector(v) | Value::Size(v) | Value::Rotation(v) => Some(v.to_vec()),
            Value::Color(c) => Some(c.to_vec()),
            Value::Tuple(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    out.push(item.as_number()?);
                }
                Some(out)
            }
            _ => None,
        }
    }

    /// Coerces to a single number: numeric strings and single-element
    /// tuples also coerce.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Tuple(items) if items.len() == 1 => items[0].as_number(),
            _ => None,
        }
    }

    /// Rebuilds a value of `self`'s own shape from raw numeric
    /// components, used after elementwise arithmetic.
    fn rebuild_numeric(&self, components: Vec<f64>) -> Value {
        match self {
            Value::Vector(_) => Value::Vector(to_array3(&components)),
            Value::Size(_) => Value::Size(to_array3(&components)),
            Value::Rotation(_) => Value::Rotation(to_array3(&components)),
            Value::Color(_) => {
                let mut c = [0.0, 0.0, 0.0, 1.0];
                for (slot, value) in c.iter_mut().zip(components.iter()) {
                    *slot = *value;
                }
                Value::Color(c)
            }
            Value::Tuple(_) => Value::Tuple(Rc::new(components.into_iter().map(Value::Number).collect())),
            _ => Value::Number(components.first().copied().unwrap_or(0.0)),
        }
    }

    /// Elementwise/scalar arithmetic: number-number is
    /// scalar; tuple-number and tuple-tuple are elementwise, with
    /// multiplication/division truncating to the shorter operand's
    /// length and addition/subtraction preserving the left operand's
    /// length.
    pub fn arithmetic(&self, op: InfixOp, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        if let (Value::String(_), InfixOp::Add) = (self, op) {
            // String concatenation, the one non-numeric `+` overload.
        }
        if matches!((self, rhs), (Value::String(_), _)) && op == InfixOp::Add {
            let left = self.display_string();
            let right = rhs.display_string();
            return Ok(Value::String(Rc::from(format!("{left}{right}").as_str())));
        }

        let left = self.as_numeric_components().ok_or_else(|| type_error(self, "arithmetic operand"))?;
        let right = rhs.as_numeric_components().ok_or_else(|| type_error(rhs, "arithmetic operand"))?;

        let truncating = matches!(op, InfixOp::Multiply | InfixOp::Divide | InfixOp::Modulo);
        let len = if left.len() == 1 {
            right.len()
        } else if right.len() == 1 {
            left.len()
        } else if truncating {
            left.len().min(right.len())
        } else {
            left.len()
        };

        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let a = if left.len() == 1 { left[0] } else { *left.get(i).unwrap_or(&0.0) };
            let b = if right.len() == 1 { right[0] } else { *right.get(i).unwrap_or(&0.0) };
            out.push(apply_scalar_op(op, a, b));
        }

        let shape_source = if matches!(self, Value::Number(_)) { rhs } else { self };
        Ok(shape_source.rebuild_numeric(out))
    }

    /// Structural/lexicographic comparison. Returns
    /// `None` when the two values are not comparable (a `typeMismatch`
    /// at the analyzer/evaluator's discretion).
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.as_ref().cmp(other_str(b))),
            (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y) {
                        Some(Ordering::Equal) => continue,
                        other => return other,
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (Value::Color(a), Value::Color(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Structural equality (`=`/`<>`), permissive across the
    /// vector/size/rotation/tuple family.
    #[must_use]
    pub fn values_equal(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_numeric_components(), other.as_numeric_components()) {
            return a == b;
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    /// `in`: membership in a range, tuple, string (substring), or object
    /// (key existence).
    #[must_use]
    pub fn contains(&self, needle: &Value) -> Option<bool> {
        match self {
            Value::Range(range) => Some(range.contains(needle.as_number()?)),
            Value::Tuple(items) => Some(items.iter().any(|item| item.values_equal(needle))),
            Value::String(haystack) => {
                if let Value::String(n) = needle {
                    Some(haystack.contains(n.as_ref()))
                } else {
                    None
                }
            }
            Value::Object(obj) => {
                if let Value::String(key) = needle {
                    Some(obj.get(key).is_some())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Renders a value for `print`/`debug`/string concatenation.
    #[must_use]
    pub fn display_string(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Color(c) => format!("{} {} {} {}", c[0], c[1], c[2], c[3]),
            Value::Vector(v) | Value::Size(v) | Value::Rotation(v) => {
                format!("{} {} {}", v[0], v[1], v[2])
            }
            Value::Tuple(items) => {
                items.iter().map(Value::display_string).collect::<Vec<_>>().join(" ")
            }
            Value::Object(_) => "object".to_string(),
            Value::Range(r) => format!("{} to {} step {}", format_number(r.start), format_number(r.end), format_number(r.step)),
            Value::Path(_) => "path".to_string(),
            Value::Mesh(_) => "mesh".to_string(),
            Value::Polygon(_) => "polygon".to_string(),
            Value::Point(_) => "point".to_string(),
            Value::Block(_) => "block".to_string(),
        }
    }

    /// Member access by name.
    pub fn member(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        let unknown = || RuntimeErrorKind::UnknownMember(name.to_string());
        match (self, name) {
            (Value::Vector(v) | Value::Size(v) | Value::Rotation(v), _) => {
                vector_member(*v, self.kind(), name).ok_or_else(unknown)
            }
            (Value::Color(c), _) => color_member(*c, name).ok_or_else(unknown),
            (Value::Tuple(items), _) => tuple_member(items, name).ok_or_else(unknown),
            (Value::String(s), _) => string_member(s, name).ok_or_else(unknown),
            (Value::Path(path), _) => path_member(path, name).ok_or_else(unknown),
            (Value::Mesh(mesh), _) => mesh_member(mesh, name).ok_or_else(unknown),
            (Value::Polygon(poly), _) => polygon_member(poly, name).ok_or_else(unknown),
            (Value::Point(point), _) => point_member(point, name).ok_or_else(unknown),
            (Value::Object(obj), _) => obj.get(name).cloned().ok_or_else(unknown),
            _ => Err(unknown()),
        }
    }

    /// Subscript by string (named member) or integer (0-based, negative
    /// indexes from the end).
    pub fn subscript(&self, index: &Value) -> Result<Value, RuntimeErrorKind> {
        match index {
            Value::String(name) => self.member(name),
            Value::Number(n) => {
                let items = self.as_indexable().ok_or(RuntimeErrorKind::InvalidIndex)?;
                let i = *n as isize;
                let len = items.len() as isize;
                let resolved = if i < 0 { len + i } else { i };
                if resolved < 0 || resolved >= len {
                    return Err(RuntimeErrorKind::IndexOutOfRange(i));
                }
                Ok(items[resolved as usize].clone())
            }
            _ => Err(RuntimeErrorKind::InvalidIndex),
        }
    }

    fn as_indexable(&self) -> Option<Vec<Value>> {
        match self {
            Value::Tuple(items) => Some(items.as_ref().clone()),
            Value::Vector(v) | Value::Size(v) | Value::Rotation(v) => {
                Some(v.iter().map(|c| Value::Number(*c)).collect())
            }
            _ => None,
        }
    }
}

fn other_str(rc: &Rc<str>) -> &str {
    rc.as_ref()
}

fn to_array3(components: &[f64]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (slot, value) in out.iter_mut().zip(components.iter()) {
        *slot = *value;
    }
    out
}

fn apply_scalar_op(op: InfixOp, a: f64, b: f64) -> f64 {
    match op {
        InfixOp::Add => a + b,
        InfixOp::Subtract => a - b,
        InfixOp::Multiply => a * b,
        InfixOp::Divide => a / b,
        InfixOp::Modulo => a.rem_euclid(b),
        _ => unreachable!("arithmetic() only dispatches +,-,*,/,%"),
    }
}

fn type_error(value: &Value, context: &str) -> RuntimeErrorKind {
    RuntimeErrorKind::GeometryEngine(format!("{} is not valid in {context}", value.kind().describe()))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n}")
    } else {
        let mut s = format!("{n:.6}");
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}

fn vector_member(v: [f64; 3], kind: ValueKind, name: &str) -> Option<Value> {
    let (a, b, c) = match kind {
        ValueKind::Size => ("width", "height", "depth"),
        ValueKind::Rotation => ("roll", "yaw", "pitch"),
        _ => ("x", "y", "z"),
    };
    if name == a {
        Some(Value::Number(v[0]))
    } else if name == b {
        Some(Value::Number(v[1]))
    } else if name == c {
        Some(Value::Number(v[2]))
    } else {
        None
    }
}

fn color_member(c: [f64; 4], name: &str) -> Option<Value> {
    Some(match name {
        "red" => Value::Number(c[0]),
        "green" => Value::Number(c[1]),
        "blue" => Value::Number(c[2]),
        "alpha" => Value::Number(c[3]),
        _ => return None,
    })
}

fn tuple_member(items: &Rc<Vec<Value>>, name: &str) -> Option<Value> {
    match name {
        "first" => items.first().cloned(),
        "last" => items.last().cloned(),
        "second" => items.get(1).cloned(),
        "count" => Some(Value::Number(items.len() as f64)),
        "allButFirst" => Some(Value::Tuple(Rc::new(items.iter().skip(1).cloned().collect()))),
        "allButLast" => Some(Value::Tuple(Rc::new(
            items.iter().take(items.len().saturating_sub(1)).cloned().collect(),
        ))),
        _ => None,
    }
}

fn string_member(s: &str, name: &str) -> Option<Value> {
    match name {
        "count" => Some(Value::Number(s.chars().count() as f64)),
        "lines" => Some(Value::Tuple(Rc::new(
            s.lines().map(|l| Value::String(Rc::from(l))).collect(),
        ))),
        "words" => Some(Value::Tuple(Rc::new(
            s.split_whitespace().map(|w| Value::String(Rc::from(w))).collect(),
        ))),
        "characters" => Some(Value::Tuple(Rc::new(
            s.chars().map(|c| Value::String(Rc::from(c.to_string().as_str()))).collect(),
        ))),
        _ => None,
    }
}

fn path_member(path: &PathValue, name: &str) -> Option<Value> {
    match name {
        "points" => Some(Value::Tuple(Rc::new(
            path.points.iter().map(|p| Value::Point(Rc::new(*p))).collect(),
        ))),
        "bounds" => Some(path_bounds(path)),
        _ => None,
    }
}

fn path_bounds(path: &PathValue) -> Value {
    let points: Vec<shapescript_geom::Vec3> =
        path.points.iter().map(|p| shapescript_geom::Vec3::new(p.position[0], p.position[1], p.position[2])).collect();
    let bounds = shapescript_geom::Bounds::from_points(&points);
    Value::Object(Rc::new(ObjectValue {
        entries: vec![
            ("min".to_string(), vector_from_vec3(bounds.min())),
            ("max".to_string(), vector_from_vec3(bounds.max())),
        ],
    }))
}

fn vector_from_vec3(v: shapescript_geom::Vec3) -> Value {
    Value::Vector([v.x, v.y, v.z])
}

fn mesh_member(mesh: &MeshValue, name: &str) -> Option<Value> {
    match name {
        "polygons" => Some(Value::Tuple(Rc::new(
            mesh.polygons.iter().cloned().map(|p| Value::Polygon(Rc::new(p))).collect(),
        ))),
        "bounds" => Some(Value::Object(Rc::new(ObjectValue {
            entries: vec![
                ("min".to_string(), vector_from_vec3(mesh.bounds.min())),
                ("max".to_string(), vector_from_vec3(mesh.bounds.max())),
            ],
        }))),
        "center" => Some(vector_from_vec3(mesh.bounds.center())),
        "material" => Some(material_to_value(&mesh.material)),
        _ => None,
    }
}

fn polygon_member(poly: &PolygonValue, name: &str) -> Option<Value> {
    match name {
        "material" => Some(material_to_value(&poly.material)),
        _ => None,
    }
}

fn point_member(point: &PointValue, name: &str) -> Option<Value> {
    match name {
        "position" => Some(Value::Vector(point.position)),
        "isCurved" => Some(Value::Number(f64::from(point.is_curved))),
        "color" => point.color.map(Value::Color),
        _ => None,
    }
}

fn material_to_value(material: &MaterialSpec) -> Value {
    Value::Object(Rc::new(ObjectValue {
        entries: vec![("color".to_string(), Value::Color(material.color))],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_enumerates_inclusive() {
        let r = RangeValue::new(1.0, 5.0, 2.0).unwrap();
        assert_eq!(r.enumerate(), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn range_with_wrong_direction_step_is_empty() {
        let r = RangeValue::new(5.0, 1.0, 1.0).unwrap();
        assert!(r.is_empty());
        assert!(r.enumerate().is_empty());
    }

    #[test]
    fn vector_addition_is_elementwise() {
        let a = Value::Vector([1.0, 2.0, 3.0]);
        let b = Value::Vector([1.0, 1.0, 1.0]);
        let sum = a.arithmetic(InfixOp::Add, &b).unwrap();
        assert!(matches!(sum, Value::Vector([2.0, 3.0, 4.0])));
    }

    #[test]
    fn negative_subscript_indexes_from_end() {
        let t = Value::Tuple(Rc::new(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]));
        let last = t.subscript(&Value::Number(-1.0)).unwrap();
        assert!(matches!(last, Value::Number(n) if n == 3.0));
    }

    #[test]
    fn string_in_string_is_substring_membership() {
        let haystack = Value::String(Rc::from("hello world"));
        let needle = Value::String(Rc::from("wor"));
        assert_eq!(haystack.contains(&needle), Some(true));
    }
}
