// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Static analysis: a single pass over the AST that
//! resolves every symbol reference, checks call arity and (where the
//! callee's signature states a concrete parameter type) argument type,
//! and enforces the `option`-placement and no-forward-reference rules.
//! Every violation found in one pass is reported; this phase never
//! stops at the first error the way the parser does.

use std::collections::{HashMap, HashSet};

use crate::ast::{
    DefineBody, Expression, ExpressionKind, Program, Statement, StatementKind,
};
use crate::error::{AnalysisError, AnalysisErrorKind};
use crate::source::SourceRange;
use crate::stdlib::{Arity, Stdlib, SymbolKind};
use crate::suggest::suggest;
use crate::value::ValueKind;

/// Runs static analysis over `program`, returning every error found.
/// An empty result means the program is safe to evaluate.
#[must_use]
pub fn analyze(program: &Program, stdlib: &Stdlib) -> Vec<AnalysisError> {
    let mut analyzer = Analyzer { stdlib, scopes: vec![HashMap::new()], errors: Vec::new() };
    analyzer.analyze_block(&program.statements, false, false);
    analyzer.errors
}

#[derive(Debug, Clone, Copy)]
struct SymbolEntry {
    arity: Arity,
    #[allow(dead_code)] // carried for future evaluator-facing diagnostics
    kind: SymbolKind,
}

struct Analyzer<'a> {
    stdlib: &'a Stdlib,
    scopes: Vec<HashMap<String, SymbolEntry>>,
    errors: Vec<AnalysisError>,
}

impl<'a> Analyzer<'a> {
    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn define_local(&mut self, name: String, entry: SymbolEntry) {
        self.scopes.last_mut().expect("at least one scope is always active").insert(name, entry);
    }

    fn lookup_symbol(&self, name: &str) -> Option<SymbolEntry> {
        for scope in self.scopes.iter().rev() {
            if let Some(entry) = scope.get(name) {
                return Some(*entry);
            }
        }
        self.stdlib.lookup(name).map(|sig| SymbolEntry { arity: sig.arity, kind: sig.kind })
    }

    /// Names reachable from `self.stdlib` plus every name bound in any
    /// currently active scope, for "did you mean" suggestions.
    fn known_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stdlib.names().collect();
        for scope in &self.scopes {
            names.extend(scope.keys().map(String::as_str));
        }
        names
    }

    /// Processes a statement sequence as one lexical block: `push_scope`
    /// controls whether it gets its own fresh scope (`false` when the
    /// caller already pushed one, e.g. a `define`'s parameter scope),
    /// and `option_allowed` marks a `define`-block body where `option`
    /// statements may lead.
    fn analyze_block(&mut self, statements: &[Statement], option_allowed: bool, push_scope: bool) {
        if push_scope {
            self.push_scope();
        }
        let future_defines: HashSet<&str> = statements
            .iter()
            .filter_map(|s| match &s.kind {
                StatementKind::Define { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();

        let mut option_phase = option_allowed;
        for stmt in statements {
            let is_option = matches!(stmt.kind, StatementKind::Option { .. });
            if is_option && !option_phase {
                self.errors.push(AnalysisError::new(AnalysisErrorKind::InvalidOption, stmt.range));
            }
            self.analyze_statement(stmt, &future_defines);
            if !is_option {
                option_phase = false;
            }
        }
        if push_scope {
            self.pop_scope();
        }
    }

    fn analyze_statement(&mut self, stmt: &Statement, future_defines: &HashSet<&str>) {
        match &stmt.kind {
            StatementKind::Define { name, params, body, .. } => {
                // Registered before the body is analyzed so a recursive
                // self-reference resolves, mirroring the parser's
                // arity-table ordering.
                let kind = match body {
                    DefineBody::Block(_) => SymbolKind::Block,
                    DefineBody::Value(_) if params.is_empty() => SymbolKind::Constant,
                    DefineBody::Value(_) => SymbolKind::Function,
                };
                self.define_local(name.clone(), SymbolEntry { arity: Arity::Fixed(params.len()), kind });

                self.push_scope();
                for param in params {
                    self.define_local(param.clone(), SymbolEntry { arity: Arity::Fixed(0), kind: SymbolKind::Constant });
                }
                match body {
                    DefineBody::Value(expr) => self.analyze_expr(expr),
                    DefineBody::Block(body_stmts) => self.analyze_block(body_stmts, true, false),
                }
                self.pop_scope();
            }
            StatementKind::Option { name, default } => {
                self.analyze_expr(default);
                self.define_local(name.clone(), SymbolEntry { arity: Arity::Fixed(0), kind: SymbolKind::Constant });
            }
            StatementKind::ForLoop { binding, iterable, body } => {
                self.analyze_expr(iterable);
                self.push_scope();
                if let Some(name) = binding {
                    self.define_local(name.clone(), SymbolEntry { arity: Arity::Fixed(0), kind: SymbolKind::Constant });
                }
                self.analyze_block(body, false, false);
                self.pop_scope();
            }
            StatementKind::IfElse { condition, then_branch, else_branch } => {
                self.analyze_expr(condition);
                self.analyze_block(then_branch, false, true);
                if let Some(else_stmts) = else_branch {
                    self.analyze_block(else_stmts, false, true);
                }
            }
            StatementKind::Import { path } => self.analyze_expr(path),
            StatementKind::Command { name, name_range, arguments } => {
                self.check_call(name, *name_range, arguments, future_defines);
            }
            StatementKind::ExpressionStatement(expr) => self.analyze_expr_with(expr, future_defines),
            StatementKind::Block { name, name_range, arguments, body } => {
                match (name, name_range) {
                    (Some(name), Some(name_range)) => self.check_call(name, *name_range, arguments, future_defines),
                    _ => {
                        for arg in arguments {
                            self.analyze_expr(arg);
                        }
                    }
                }
                self.push_scope();
                self.analyze_block(body, false, false);
                self.pop_scope();
            }
        }
    }

    fn analyze_expr(&mut self, expr: &Expression) {
        self.analyze_expr_with(expr, &HashSet::new());
    }

    fn analyze_expr_with(&mut self, expr: &Expression, future_defines: &HashSet<&str>) {
        match &expr.kind {
            ExpressionKind::Literal(_) => {}
            ExpressionKind::Identifier(name) => {
                self.resolve_reference(name, expr.range, future_defines);
            }
            ExpressionKind::Tuple(items) => {
                for item in items {
                    self.analyze_expr_with(item, future_defines);
                }
            }
            ExpressionKind::Member { receiver, .. } => self.analyze_expr_with(receiver, future_defines),
            ExpressionKind::Subscript { receiver, index } => {
                self.analyze_expr_with(receiver, future_defines);
                self.analyze_expr_with(index, future_defines);
            }
            ExpressionKind::Range { start, end, step } => {
                self.analyze_expr_with(start, future_defines);
                self.analyze_expr_with(end, future_defines);
                if let Some(step) = step {
                    self.analyze_expr_with(step, future_defines);
                }
            }
            ExpressionKind::Infix { left, right, .. } => {
                self.analyze_expr_with(left, future_defines);
                self.analyze_expr_with(right, future_defines);
            }
            ExpressionKind::Prefix { operand, .. } => self.analyze_expr_with(operand, future_defines),
            ExpressionKind::FunctionCall { name, name_range, arguments } => {
                self.check_call(name, *name_range, arguments, future_defines);
            }
            ExpressionKind::BlockCall { name, arguments, body } => {
                if let Some(name) = name {
                    self.resolve_reference(name, expr.range, future_defines);
                }
                for arg in arguments {
                    self.analyze_expr_with(arg, future_defines);
                }
                self.push_scope();
                self.analyze_block(body, false, false);
                self.pop_scope();
            }
        }
    }

    fn resolve_reference(&mut self, name: &str, range: SourceRange, future_defines: &HashSet<&str>) {
        if self.lookup_symbol(name).is_some() {
            return;
        }
        self.report_unresolved(name, range, future_defines);
    }

    fn check_call(&mut self, name: &str, name_range: SourceRange, arguments: &[Expression], future_defines: &HashSet<&str>) {
        for arg in arguments {
            self.analyze_expr_with(arg, future_defines);
        }
        let Some(entry) = self.lookup_symbol(name) else {
            self.report_unresolved(name, name_range, future_defines);
            return;
        };
        if !entry.arity.accepts(arguments.len()) {
            self.errors.push(AnalysisError::new(
                AnalysisErrorKind::WrongArity { name: name.to_string(), expected: entry.arity.describe(), found: arguments.len() },
                name_range,
            ));
        }
        if let Some(sig) = self.stdlib.lookup(name) {
            for (expected, arg) in sig.param_types.iter().zip(arguments) {
                if let Some(found) = literal_kind(arg) {
                    if found != *expected {
                        self.errors.push(AnalysisError::new(
                            AnalysisErrorKind::TypeMismatch {
                                expected: expected.describe().to_string(),
                                found: found.describe().to_string(),
                                context: name.to_string(),
                            },
                            arg.range,
                        ));
                    }
                }
            }
        }
    }

    fn report_unresolved(&mut self, name: &str, range: SourceRange, future_defines: &HashSet<&str>) {
        if future_defines.contains(name) {
            self.errors.push(AnalysisError::new(AnalysisErrorKind::ForwardReference(name.to_string()), range));
            return;
        }
        let mut error = AnalysisError::new(AnalysisErrorKind::UnknownSymbol(name.to_string()), range);
        if let Some(candidate) = suggest(name, self.known_names()) {
            error = error.with_hint(format!("did you mean '{candidate}'?"));
        }
        self.errors.push(error);
    }
}

/// The [`ValueKind`] a literal expression trivially has, for the shallow
/// argument-type check: anything that is not a literal (an identifier, a
/// computed expression) is left to the evaluator, which has the actual
/// value in hand.
fn literal_kind(expr: &Expression) -> Option<ValueKind> {
    match &expr.kind {
        ExpressionKind::Literal(crate::ast::Literal::Number(_)) => Some(ValueKind::Number),
        ExpressionKind::Literal(crate::ast::Literal::String(_)) => Some(ValueKind::String),
        ExpressionKind::Literal(crate::ast::Literal::HexColor(_)) => Some(ValueKind::Color),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn analyze_source(src: &str) -> Vec<AnalysisError> {
        let stdlib = Stdlib::new();
        let (tokens, lex_err) = lex(src);
        assert!(lex_err.is_none(), "unexpected lex error: {lex_err:?}");
        let (program, parse_err) = parse(tokens, &stdlib);
        assert!(parse_err.is_none(), "unexpected parse error: {parse_err:?}");
        analyze(&program, &stdlib)
    }

    #[test]
    fn known_builtin_is_clean() {
        let errors = analyze_source("translate 1 2 3\n");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn unknown_symbol_is_reported_with_hint() {
        let errors = analyze_source("cuube\n");
        assert_eq!(errors.len(), 1);
        match &errors[0].kind {
            AnalysisErrorKind::UnknownSymbol(name) => assert_eq!(name, "cuube"),
            other => panic!("expected UnknownSymbol, got {other:?}"),
        }
        assert!(errors[0].hint.is_some());
    }

    #[test]
    fn wrong_arity_is_reported() {
        let errors = analyze_source("translate 1 2\n");
        assert!(matches!(errors[0].kind, AnalysisErrorKind::WrongArity { .. }));
    }

    #[test]
    fn forward_reference_is_distinguished_from_unknown() {
        let errors = analyze_source("foo 1\ndefine foo(x) {\n    cube\n}\n");
        assert!(matches!(errors[0].kind, AnalysisErrorKind::ForwardReference(_)));
    }

    #[test]
    fn recursive_define_resolves_itself() {
        let errors = analyze_source("define countdown(n) {\n    if n > 0 {\n        countdown(n)\n    }\n}\n");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn option_outside_block_head_is_invalid() {
        let errors = analyze_source("define thing() {\n    cube\n    option extra 1\n}\n");
        assert!(matches!(errors[0].kind, AnalysisErrorKind::InvalidOption));
    }

    #[test]
    fn type_mismatch_on_literal_argument() {
        let errors = analyze_source("opacity \"oops\"\n");
        assert!(matches!(errors[0].kind, AnalysisErrorKind::TypeMismatch { .. }));
    }
}
