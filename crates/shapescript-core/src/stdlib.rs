// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Built-in symbols: constants, functions, blocks, commands. The parser
//! consults [`Arity`] alone (to know how many bare
//! juxtaposed arguments a command/call consumes); the analyzer consults
//! the full [`Signature`] (to type-check arguments).

use std::collections::HashMap;

use crate::value::ValueKind;

/// How many positional arguments a symbol's invocation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Fixed(usize),
    /// Between `min` and `max` inclusive.
    Range {
        /// Minimum accepted argument count.
        min: usize,
        /// Maximum accepted argument count.
        max: usize,
    },
    /// Any number of arguments, each of the same expected type.
    Variadic,
}

impl Arity {
    /// Whether `count` arguments satisfy this arity.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => count == n,
            Arity::Range { min, max } => (min..=max).contains(&count),
            Arity::Variadic => true,
        }
    }

    /// A human-readable rendering for `wrongArity` diagnostics.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Arity::Fixed(n) => n.to_string(),
            Arity::Range { min, max } => format!("{min}..{max}"),
            Arity::Variadic => "any number of".to_string(),
        }
    }
}

/// What kind of symbol a name is bound to, driving how the evaluator
/// dispatches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A constant value, no invocation.
    Constant,
    /// A pure function: no side effects, returns a value.
    Function,
    /// A block: evaluated with a child scope, may emit geometry.
    Block,
    /// A command: impure, mutates the current scope's ambient state.
    Command,
}

/// A built-in symbol's static signature.
#[derive(Debug, Clone)]
pub struct Signature {
    /// Constant / function / block / command.
    pub kind: SymbolKind,
    /// Accepted argument count.
    pub arity: Arity,
    /// Expected argument types, used by the analyzer for `typeMismatch`.
    /// Empty for constants and variadic-typed builtins that accept
    /// anything coercible to a number.
    pub param_types: Vec<ValueKind>,
}

impl Signature {
    fn new(kind: SymbolKind, arity: Arity, param_types: &[ValueKind]) -> Self {
        Self { kind, arity, param_types: param_types.to_vec() }
    }
}

/// The immutable table of built-in names, constructed once and shared via
/// the root [`crate::scope::Scope`].
#[derive(Debug, Clone)]
pub struct Stdlib {
    symbols: HashMap<&'static str, Signature>,
}

impl Stdlib {
    /// Builds the full standard-library symbol table.
    #[must_use]
    pub fn new() -> Self {
        let mut symbols = HashMap::new();
        let n = ValueKind::Number;

        let mut def = |name: &'static str, kind: SymbolKind, arity: Arity, params: &[ValueKind]| {
            symbols.insert(name, Signature::new(kind, arity, params));
        };

        // Math.
        for name in ["round", "floor", "ceil", "abs", "sign", "sqrt"] {
            def(name, SymbolKind::Function, Arity::Fixed(1), &[n]);
        }
        def("pow", SymbolKind::Function, Arity::Fixed(2), &[n, n]);
        def("min", SymbolKind::Function, Arity::Variadic, &[]);
        def("max", SymbolKind::Function, Arity::Variadic, &[]);
        def("sum", SymbolKind::Function, Arity::Variadic, &[]);

        // Trig.
        for name in ["sin", "cos", "tan", "asin", "acos", "atan"] {
            def(name, SymbolKind::Function, Arity::Fixed(1), &[n]);
        }
        def("atan2", SymbolKind::Function, Arity::Fixed(2), &[n, n]);

        // Linear algebra.
        def("dot", SymbolKind::Function, Arity::Fixed(2), &[]);
        def("cross", SymbolKind::Function, Arity::Fixed(2), &[]);
        def("length", SymbolKind::Function, Arity::Fixed(1), &[]);
        def("normalize", SymbolKind::Function, Arity::Fixed(1), &[]);

        // String.
        def("split", SymbolKind::Function, Arity::Fixed(2), &[]);
        def("join", SymbolKind::Function, Arity::Fixed(2), &[]);
        def("trim", SymbolKind::Function, Arity::Fixed(1), &[]);

        // Random.
        def("rnd", SymbolKind::Function, Arity::Fixed(0), &[]);
        def("seed", SymbolKind::Command, Arity::Fixed(1), &[n]);

        // Color constants.
        for name in [
            "red", "green", "blue", "cyan", "magenta", "yellow", "black", "white", "gray", "grey", "orange",
        ] {
            def(name, SymbolKind::Constant, Arity::Fixed(0), &[]);
        }

        // Shape primitives: an optional 0-3 number dimension/position
        // shorthand (`cube 2`, `point 0 -1`), everything else (color,
        // options, ...) lives in the block body, not the argument list.
        for name in [
            "cube", "sphere", "cone", "cylinder", "circle", "square", "roundrect", "polygon", "path", "point",
            "curve", "text", "mesh",
        ] {
            def(name, SymbolKind::Block, Arity::Range { min: 0, max: 3 }, &[]);
        }

        // Builders: same 0-3 number shorthand as the primitives they wrap.
        for name in ["fill", "lathe", "extrude", "loft", "hull", "minkowski"] {
            def(name, SymbolKind::Block, Arity::Range { min: 0, max: 3 }, &[]);
        }

        // CSG.
        for name in ["union", "difference", "intersection", "xor", "stencil"] {
            def(name, SymbolKind::Block, Arity::Range { min: 0, max: 3 }, &[]);
        }

        // Structure: at most one positional argument, an object name.
        for name in ["group", "object", "light", "camera"] {
            def(name, SymbolKind::Block, Arity::Range { min: 0, max: 1 }, &[]);
        }

        // Commands.
        def("color", SymbolKind::Command, Arity::Range { min: 1, max: 4 }, &[]);
        def("colour", SymbolKind::Command, Arity::Range { min: 1, max: 4 }, &[]);
        def("texture", SymbolKind::Command, Arity::Fixed(1), &[]);
        def("opacity", SymbolKind::Command, Arity::Fixed(1), &[n]);
        def("font", SymbolKind::Command, Arity::Fixed(1), &[]);
        def("detail", SymbolKind::Command, Arity::Fixed(1), &[n]);
        def("smoothing", SymbolKind::Command, Arity::Fixed(1), &[n]);
        def("position", SymbolKind::Command, Arity::Fixed(3), &[n, n, n]);
        def("orientation", SymbolKind::Command, Arity::Fixed(3), &[n, n, n]);
        // `size`/`scale` accept 1-3 numbers (uniform/planar/full scale —
        // see `splat_or_vec3`), unlike their `position`/`translate`
        // siblings, which always take a full 3-component vector.
        def("size", SymbolKind::Command, Arity::Range { min: 1, max: 3 }, &[]);
        def("translate", SymbolKind::Command, Arity::Fixed(3), &[n, n, n]);
        def("rotate", SymbolKind::Command, Arity::Fixed(3), &[n, n, n]);
        def("scale", SymbolKind::Command, Arity::Range { min: 1, max: 3 }, &[]);
        def("background", SymbolKind::Command, Arity::Range { min: 1, max: 4 }, &[]);
        def("print", SymbolKind::Command, Arity::Variadic, &[]);
        def("assert", SymbolKind::Command, Arity::Fixed(1), &[]);
        def("debug", SymbolKind::Command, Arity::Variadic, &[]);
        def("import", SymbolKind::Command, Arity::Fixed(1), &[ValueKind::String]);

        Self { symbols }
    }

    /// Looks up a built-in's signature by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Signature> {
        self.symbols.get(name)
    }

    /// All built-in names, for "did you mean" suggestion candidates.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.symbols.keys().copied()
    }
}

impl Default for Stdlib {
    fn default() -> Self {
        Self::new()
    }
}

/// Named colors, as 8-bit RGBA, looked up by the evaluator when a
/// [`SymbolKind::Constant`] color name resolves.
#[must_use]
pub fn named_color(name: &str) -> Option<[u8; 4]> {
    Some(match name {
        "red" => [255, 0, 0, 255],
        "green" => [0, 128, 0, 255],
        "blue" => [0, 0, 255, 255],
        "cyan" => [0, 255, 255, 255],
        "magenta" => [255, 0, 255, 255],
        "yellow" => [255, 255, 0, 255],
        "black" => [0, 0, 0, 255],
        "white" => [255, 255, 255, 255],
        "gray" | "grey" => [128, 128, 128, 255],
        "orange" => [255, 165, 0, 255],
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_math_functions() {
        let lib = Stdlib::new();
        let sig = lib.lookup("sqrt").expect("sqrt is builtin");
        assert_eq!(sig.kind, SymbolKind::Function);
        assert_eq!(sig.arity, Arity::Fixed(1));
    }

    #[test]
    fn unknown_name_is_absent() {
        let lib = Stdlib::new();
        assert!(lib.lookup("not_a_real_builtin").is_none());
    }

    #[test]
    fn named_colors_cover_aliases() {
        assert_eq!(named_color("grey"), named_color("gray"));
        assert!(named_color("chartreuse").is_none());
    }
}
