// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tokens → AST.
//!
//! The grammar is unusual: a command or function call takes a
//! whitespace-separated argument list whose length is the callee's
//! arity, not bracket-delimited. This means the parser must already know
//! each name's arity — built-ins from [`Stdlib`], user names from the
//! `define`s seen so far in this same pass (full type resolution is
//! still deferred to the analyzer).

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{
    DefineBody, Expression, ExpressionKind, InfixOp, Literal, PrefixOp, Program, Statement, StatementKind,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::source::SourceRange;
use crate::stdlib::{Arity, Stdlib, SymbolKind};
use crate::token::{Keyword, Operator, Punctuation, Token, TokenKind};

/// Parses a token stream into a [`Program`], stopping at the first
/// syntax error and returning it as a single optional error.
#[must_use]
pub fn parse(tokens: Vec<Token>, stdlib: &Stdlib) -> (Program, Option<ParseError>) {
    let source_range = tokens.last().map_or(SourceRange::empty_at(0), |t| SourceRange::new(0, t.range.end));
    let mut parser = Parser::new(tokens, stdlib);
    let mut statements = Vec::new();
    parser.skip_terminators();
    while !parser.at_eof() && parser.error.is_none() {
        match parser.parse_statement() {
            Ok(stmt) => statements.push(stmt),
            Err(err) => {
                parser.error = Some(err);
                break;
            }
        }
        parser.skip_terminators();
    }
    (Program { statements, range: source_range }, parser.error)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    stdlib: &'a Stdlib,
    /// Arities (and symbol kinds) of names introduced by `define` earlier
    /// in this same parse, consulted alongside [`Stdlib`] for
    /// argument-list length and for the statement-boundary lookahead in
    /// [`Parser::parse_argument_list`].
    local_arities: HashMap<String, (Arity, SymbolKind)>,
    paren_depth: u32,
    error: Option<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, stdlib: &'a Stdlib) -> Self {
        Self { tokens, pos: 0, stdlib, local_arities: HashMap::new(), paren_depth: 0, error: None }
    }

    // --- token stream primitives -----------------------------------

    /// Inside parens, a line break is a continuation rather than a
    /// statement terminator; skip past it as if it were ordinary
    /// whitespace.
    fn skip_transparent_breaks(&mut self) {
        while self.paren_depth > 0 && matches!(self.tokens[self.pos].kind, TokenKind::LineBreak) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Token {
        self.skip_transparent_breaks();
        self.tokens[self.pos].clone()
    }

    fn peek_at(&mut self, ahead: usize) -> Token {
        self.skip_transparent_breaks();
        self.tokens.get(self.pos + ahead).cloned().unwrap_or_else(|| self.tokens[self.tokens.len() - 1].clone())
    }

    fn advance(&mut self) -> Token {
        self.skip_transparent_breaks();
        let token = self.tokens[self.pos].clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&mut self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn skip_terminators(&mut self) {
        while matches!(self.peek().kind, TokenKind::LineBreak) {
            self.advance();
        }
    }

    fn error_at(&self, kind: ParseErrorKind, range: SourceRange) -> ParseError {
        ParseError::new(kind, range)
    }

    fn unexpected(&mut self) -> ParseError {
        let tok = self.peek();
        self.error_at(ParseErrorKind::UnexpectedToken, tok.range)
    }

    fn expect_identifier(&mut self) -> Result<(String, SourceRange), ParseError> {
        let tok = self.peek();
        if let TokenKind::Identifier(name) = tok.kind {
            self.advance();
            Ok((name, tok.range))
        } else if matches!(tok.kind, TokenKind::Eof) {
            Err(self.error_at(ParseErrorKind::UnexpectedEof, tok.range))
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_punct(&mut self, p: Punctuation) -> Result<Token, ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Punctuation(found) if found == p => {
                self.advance();
                Ok(tok)
            }
            TokenKind::Eof => Err(self.error_at(ParseErrorKind::UnexpectedEof, tok.range)),
            _ => Err(self.unexpected()),
        }
    }

    fn check_punct(&mut self, p: Punctuation) -> bool {
        matches!(self.peek().kind, TokenKind::Punctuation(found) if found == p)
    }

    fn check_keyword(&mut self, k: Keyword) -> bool {
        matches!(self.peek().kind, TokenKind::Keyword(found) if found == k)
    }

    fn match_keyword(&mut self, k: Keyword) -> bool {
        if self.check_keyword(k) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_statement_boundary(&mut self) -> bool {
        matches!(self.peek().kind, TokenKind::LineBreak | TokenKind::Eof)
            || self.check_punct(Punctuation::RBrace)
    }

    /// Whether a name currently resolves to a known arity (built-in or
    /// already `define`d), and if so, what kind of symbol it is.
    fn lookup_arity(&self, name: &str) -> Option<(Arity, SymbolKind)> {
        if let Some(entry) = self.local_arities.get(name) {
            return Some(*entry);
        }
        self.stdlib.lookup(name).map(|sig| (sig.arity, sig.kind))
    }

    /// Whether the upcoming token is an identifier naming a `Block` or
    /// `Command` symbol — one that starts a statement of its own, rather
    /// than standing as a value. Consulted by [`Parser::parse_argument_list`]
    /// so a short argument list stops before swallowing the next
    /// statement's leading command name (a plain value reference, like a
    /// color constant or a value-`define`d name, is not a stop here).
    fn next_starts_statement(&mut self) -> bool {
        let TokenKind::Identifier(name) = self.peek().kind else { return false };
        matches!(self.lookup_arity(&name), Some((_, SymbolKind::Block | SymbolKind::Command)))
    }

    // --- statements ---------------------------------------------------

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().range;
        let kind = if self.check_keyword(Keyword::Define) {
            self.parse_define()?
        } else if self.check_keyword(Keyword::Option) {
            self.parse_option()?
        } else if self.check_keyword(Keyword::For) {
            self.parse_for()?
        } else if self.check_keyword(Keyword::If) {
            self.parse_if()?
        } else if self.check_keyword(Keyword::Import) {
            self.parse_import()?
        } else if self.check_punct(Punctuation::LBrace) {
            let body = self.parse_braced_block()?;
            StatementKind::Block { name: None, name_range: None, arguments: Vec::new(), body }
        } else if let TokenKind::Identifier(name) = self.peek().kind {
            self.parse_name_led_statement(name)?
        } else {
            let expr = self.parse_expression()?;
            StatementKind::ExpressionStatement(expr)
        };
        let end = self.tokens[self.pos.saturating_sub(1)].range;
        Ok(Statement { kind, range: start.union(&end) })
    }

    fn parse_name_led_statement(&mut self, name: String) -> Result<StatementKind, ParseError> {
        let name_tok = self.advance();
        let name_range = name_tok.range;

        match self.lookup_arity(&name) {
            Some((arity, _kind)) => {
                let arguments = self.parse_argument_list(arity)?;
                if self.check_punct(Punctuation::LBrace) {
                    let body = self.parse_braced_block()?;
                    Ok(StatementKind::Block { name: Some(name), name_range: Some(name_range), arguments, body })
                } else {
                    Ok(StatementKind::Command { name, name_range, arguments })
                }
            }
            None => {
                // Not yet a known arity: either a bare identifier
                // reference/tuple in expression position, or a
                // C-style call `name(args)`.
                let mut expr = self.finish_identifier_expression(name, name_range)?;
                while !self.is_statement_boundary() && self.can_start_expression() {
                    let next = self.parse_expression_no_juxtaposition()?;
                    expr = combine_into_tuple(expr, next);
                }
                Ok(StatementKind::ExpressionStatement(expr))
            }
        }
    }

    /// Parses exactly as many argument expressions as `arity` allows,
    /// stopping early at a statement boundary, a `{`, or the next
    /// statement's leading command/block name (see
    /// [`Parser::next_starts_statement`]).
    fn parse_argument_list(&mut self, arity: Arity) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        let max = match arity {
            Arity::Fixed(n) => n,
            Arity::Range { max, .. } => max,
            Arity::Variadic => usize::MAX,
        };
        while args.len() < max && !self.is_statement_boundary() && !self.check_punct(Punctuation::LBrace) {
            if !self.can_start_expression() {
                break;
            }
            if self.next_starts_statement() {
                break;
            }
            args.push(self.parse_expression_no_juxtaposition()?);
        }
        if let Arity::Fixed(n) = arity {
            if args.len() != n {
                // A short argument list is reported by the analyzer as
                // `wrongArity` (it needs the callee's name in scope);
                // the parser only needs to stop consuming cleanly.
                return Ok(args);
            }
        }
        Ok(args)
    }

    fn can_start_expression(&mut self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Identifier(_)
                | TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::HexColor(_)
                | TokenKind::Punctuation(Punctuation::LParen)
                | TokenKind::Operator(Operator::Minus | Operator::Plus, _)
                | TokenKind::Keyword(Keyword::Not)
        )
    }

    fn parse_define(&mut self) -> Result<StatementKind, ParseError> {
        self.advance(); // `define`
        let (name, name_range) = self.expect_identifier()?;

        let mut params = Vec::new();
        let paren_tok = self.peek();
        if matches!(paren_tok.kind, TokenKind::Punctuation(Punctuation::LParen))
            && immediately_adjacent(&name_range, &paren_tok.range)
        {
            self.advance();
            self.paren_depth += 1;
            if !self.check_punct(Punctuation::RParen) {
                loop {
                    let (param, _) = self.expect_identifier()?;
                    params.push(param);
                    if self.check_punct(Punctuation::Comma) {
                        self.advance();
                        if self.check_punct(Punctuation::RParen) {
                            let tok = self.peek();
                            return Err(self.error_at(ParseErrorKind::TrailingComma, tok.range));
                        }
                        continue;
                    }
                    break;
                }
            }
            self.paren_depth -= 1;
            self.expect_punct(Punctuation::RParen)?;
        }

        // Registered before the body is parsed, so a recursive
        // self-reference inside it resolves to the right arity. The kind
        // is provisional (a value body can't yet be distinguished from a
        // block body) and corrected below once the body is known.
        self.local_arities.insert(name.clone(), (Arity::Fixed(params.len()), SymbolKind::Function));

        let body = if self.check_punct(Punctuation::LBrace) {
            DefineBody::Block(self.parse_braced_block()?)
        } else {
            DefineBody::Value(self.parse_expression()?)
        };

        let kind = match &body {
            DefineBody::Block(_) => SymbolKind::Block,
            DefineBody::Value(_) if params.is_empty() => SymbolKind::Constant,
            DefineBody::Value(_) => SymbolKind::Function,
        };
        self.local_arities.insert(name.clone(), (Arity::Fixed(params.len()), kind));

        Ok(StatementKind::Define { name, name_range, params, body })
    }

    fn parse_option(&mut self) -> Result<StatementKind, ParseError> {
        self.advance(); // `option`
        let (name, _) = self.expect_identifier()?;
        let default = self.parse_expression()?;
        Ok(StatementKind::Option { name, default })
    }

    fn parse_for(&mut self) -> Result<StatementKind, ParseError> {
        self.advance(); // `for`
        // Look ahead for the optional `NAME in` prefix without consuming
        // on a miss.
        let binding = if let TokenKind::Identifier(candidate) = self.peek().kind {
            if matches!(self.peek_at(1).kind, TokenKind::Keyword(Keyword::In)) {
                self.advance(); // identifier
                self.advance(); // `in`
                Some(candidate)
            } else {
                None
            }
        } else {
            None
        };
        let iterable = self.parse_expression()?;
        let body = self.parse_braced_block()?;
        Ok(StatementKind::ForLoop { binding, iterable, body })
    }

    fn parse_if(&mut self) -> Result<StatementKind, ParseError> {
        self.advance(); // `if`
        let condition = self.parse_expression()?;
        let then_branch = self.parse_braced_block()?;
        let else_branch = if self.match_keyword(Keyword::Else) {
            if self.check_keyword(Keyword::If) {
                let nested_start = self.peek().range;
                let nested_kind = self.parse_if()?;
                Some(vec![Statement { kind: nested_kind, range: nested_start }])
            } else {
                Some(self.parse_braced_block()?)
            }
        } else {
            None
        };
        Ok(StatementKind::IfElse { condition, then_branch, else_branch })
    }

    fn parse_import(&mut self) -> Result<StatementKind, ParseError> {
        self.advance(); // `import`
        let path = self.parse_expression()?;
        Ok(StatementKind::Import { path })
    }

    fn parse_braced_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        let open = self.peek();
        if !matches!(open.kind, TokenKind::Punctuation(Punctuation::LBrace)) {
            return Err(self.error_at(ParseErrorKind::UnexpectedToken, open.range));
        }
        self.advance();
        self.skip_terminators();
        let mut statements = Vec::new();
        while !self.check_punct(Punctuation::RBrace) {
            if self.at_eof() {
                return Err(self.error_at(ParseErrorKind::MissingClosingBrace, open.range));
            }
            statements.push(self.parse_statement()?);
            self.skip_terminators();
        }
        self.advance(); // `}`
        Ok(statements)
    }

    // --- expressions ----------------------------------------------

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_range_or_in()
    }

    /// Parses exactly one argument's worth of expression: unlike
    /// [`Parser::parse_expression`], the caller is responsible for
    /// looping to collect a juxtaposed argument list, so this never
    /// itself folds multiple bare expressions into a tuple.
    fn parse_expression_no_juxtaposition(&mut self) -> Result<Expression, ParseError> {
        self.parse_range_or_in()
    }

    fn parse_range_or_in(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_or()?;
        if self.match_keyword(Keyword::To) {
            let end = self.parse_or()?;
            let step =
                if self.match_keyword(Keyword::Step) { Some(Box::new(self.parse_or()?)) } else { None };
            let range = left.range.union(&end.range);
            Ok(Expression {
                range,
                kind: ExpressionKind::Range { start: Box::new(left), end: Box::new(end), step },
            })
        } else if self.match_keyword(Keyword::In) {
            let right = self.parse_or()?;
            let range = left.range.union(&right.range);
            Ok(Expression {
                range,
                kind: ExpressionKind::Infix { left: Box::new(left), op: InfixOp::In, right: Box::new(right) },
            })
        } else {
            Ok(left)
        }
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while self.match_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            let range = left.range.union(&right.range);
            left = Expression { range, kind: ExpressionKind::Infix { left: Box::new(left), op: InfixOp::Or, right: Box::new(right) } };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_not()?;
        while self.match_keyword(Keyword::And) {
            let right = self.parse_not()?;
            let range = left.range.union(&right.range);
            left = Expression { range, kind: ExpressionKind::Infix { left: Box::new(left), op: InfixOp::And, right: Box::new(right) } };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression, ParseError> {
        if self.check_keyword(Keyword::Not) {
            let tok = self.advance();
            let operand = self.parse_not()?;
            let range = tok.range.union(&operand.range);
            return Ok(Expression { range, kind: ExpressionKind::Prefix { op: PrefixOp::Not, operand: Box::new(operand) } });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_additive()?;
        let Some(op) = self.peek_comparison_operator() else {
            return Ok(left);
        };
        self.advance();
        let right = self.parse_additive()?;
        if self.peek_comparison_operator().is_some() {
            let tok = self.peek();
            return Err(self.error_at(ParseErrorKind::UnexpectedToken, tok.range));
        }
        let range = left.range.union(&right.range);
        Ok(Expression { range, kind: ExpressionKind::Infix { left: Box::new(left), op, right: Box::new(right) } })
    }

    fn peek_comparison_operator(&mut self) -> Option<InfixOp> {
        match self.peek().kind {
            TokenKind::Operator(op, _) if InfixOp::from_token_operator(op).is_comparison() => {
                Some(InfixOp::from_token_operator(op))
            }
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let tok = self.peek();
            let TokenKind::Operator(op @ (Operator::Plus | Operator::Minus), adjacency) = tok.kind else {
                break;
            };
            // A sign with whitespace on both sides is infix; tight to
            // what follows, it starts a new (unary) term instead and is
            // left for the caller to pick up.
            if adjacency.tight_before || adjacency.tight_after {
                break;
            }
            self.advance();
            let right = self.parse_multiplicative()?;
            let range = left.range.union(&right.range);
            left = Expression {
                range,
                kind: ExpressionKind::Infix { left: Box::new(left), op: InfixOp::from_token_operator(op), right: Box::new(right) },
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let matches_op = matches!(
                self.peek().kind,
                TokenKind::Operator(Operator::Star | Operator::Slash | Operator::Percent, _)
            );
            if !matches_op {
                break;
            }
            let TokenKind::Operator(op, _) = self.advance().kind else { unreachable!() };
            let right = self.parse_unary()?;
            let range = left.range.union(&right.range);
            left = Expression {
                range,
                kind: ExpressionKind::Infix { left: Box::new(left), op: InfixOp::from_token_operator(op), right: Box::new(right) },
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Operator(Operator::Minus, _) => {
                self.advance();
                let operand = self.parse_unary()?;
                let range = tok.range.union(&operand.range);
                Ok(Expression { range, kind: ExpressionKind::Prefix { op: PrefixOp::Negate, operand: Box::new(operand) } })
            }
            TokenKind::Operator(Operator::Plus, _) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check_punct(Punctuation::Dot) {
                self.advance();
                let (member, member_range) = self.expect_identifier()?;
                let range = expr.range.union(&member_range);
                expr = Expression { range, kind: ExpressionKind::Member { receiver: Box::new(expr), member, member_range } };
            } else if self.check_punct(Punctuation::LBracket) {
                self.advance();
                self.paren_depth += 1;
                let index = self.parse_expression()?;
                self.paren_depth -= 1;
                let close = self.expect_punct(Punctuation::RBracket)?;
                let range = expr.range.union(&close.range);
                expr = Expression { range, kind: ExpressionKind::Subscript { receiver: Box::new(expr), index: Box::new(index) } };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let tok = self.peek();
        match tok.kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expression { range: tok.range, kind: ExpressionKind::Literal(Literal::Number(n)) })
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expression { range: tok.range, kind: ExpressionKind::Literal(Literal::String(s)) })
            }
            TokenKind::HexColor(rgba) => {
                self.advance();
                Ok(Expression { range: tok.range, kind: ExpressionKind::Literal(Literal::HexColor(rgba)) })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                self.finish_identifier_expression(name, tok.range)
            }
            TokenKind::Punctuation(Punctuation::LParen) => self.parse_parenthesized(),
            TokenKind::Eof => Err(self.error_at(ParseErrorKind::UnexpectedEof, tok.range)),
            _ => Err(self.error_at(ParseErrorKind::ExpectedExpression, tok.range)),
        }
    }

    /// After consuming a bare identifier, decides whether it opens a
    /// tight C-style call `name(args)` or stands alone as a reference.
    fn finish_identifier_expression(&mut self, name: String, name_range: SourceRange) -> Result<Expression, ParseError> {
        let paren = self.peek();
        if matches!(paren.kind, TokenKind::Punctuation(Punctuation::LParen)) && immediately_adjacent(&name_range, &paren.range) {
            self.advance();
            self.paren_depth += 1;
            let mut arguments = Vec::new();
            if !self.check_punct(Punctuation::RParen) {
                loop {
                    arguments.push(self.parse_expression()?);
                    if self.check_punct(Punctuation::Comma) {
                        self.advance();
                        if self.check_punct(Punctuation::RParen) {
                            let tok = self.peek();
                            self.paren_depth -= 1;
                            return Err(self.error_at(ParseErrorKind::TrailingComma, tok.range));
                        }
                        continue;
                    }
                    break;
                }
            }
            self.paren_depth -= 1;
            let close = self.expect_punct(Punctuation::RParen)?;
            let range = name_range.union(&close.range);
            // An unresolved callee here is left for the analyzer, which
            // holds the full symbol table and can attach a "did you
            // mean" hint via `suggest::suggest`.
            Ok(Expression { range, kind: ExpressionKind::FunctionCall { name, name_range, arguments } })
        } else {
            Ok(Expression { range: name_range, kind: ExpressionKind::Identifier(name) })
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Expression, ParseError> {
        let open = self.advance();
        self.paren_depth += 1;
        let mut items = vec![self.parse_expression()?];
        while self.can_start_expression() {
            items.push(self.parse_expression_no_juxtaposition()?);
        }
        self.paren_depth -= 1;
        let close = self.expect_punct(Punctuation::RParen)?;
        let range = open.range.union(&close.range);
        if items.len() == 1 {
            let mut only = items.pop().expect("items has exactly one element");
            only.range = range;
            Ok(only)
        } else {
            Ok(Expression { range, kind: ExpressionKind::Tuple(items) })
        }
    }
}

fn immediately_adjacent(a: &SourceRange, b: &SourceRange) -> bool {
    a.end == b.start
}

fn combine_into_tuple(left: Expression, right: Expression) -> Expression {
    let range = left.range.union(&right.range);
    match left.kind {
        ExpressionKind::Tuple(mut items) => {
            items.push(right);
            Expression { range, kind: ExpressionKind::Tuple(items) }
        }
        _ => Expression { range, kind: ExpressionKind::Tuple(vec![left, right]) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_source(src: &str) -> (Program, Option<ParseError>) {
        let stdlib = Stdlib::new();
        let (tokens, lex_err) = lex(src);
        assert!(lex_err.is_none(), "unexpected lex error: {lex_err:?}");
        parse(tokens, &stdlib)
    }

    #[test]
    fn parses_simple_command() {
        let (program, err) = parse_source("translate 1 2 3\n");
        assert!(err.is_none(), "{err:?}");
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0].kind, StatementKind::Command { .. }));
    }

    #[test]
    fn parses_block_with_body() {
        let (program, err) = parse_source("cube {\n    size 2\n}\n");
        assert!(err.is_none(), "{err:?}");
        assert!(matches!(program.statements[0].kind, StatementKind::Block { .. }));
    }

    #[test]
    fn parses_define_with_params() {
        let (program, err) = parse_source("define box(w, h) {\n    cube\n}\n");
        assert!(err.is_none(), "{err:?}");
        match &program.statements[0].kind {
            StatementKind::Define { params, .. } => assert_eq!(params, &vec!["w".to_string(), "h".to_string()]),
            other => panic!("expected Define, got {other:?}"),
        }
    }

    #[test]
    fn missing_closing_brace_is_an_error() {
        let (_, err) = parse_source("cube {\n    size 2\n");
        assert!(matches!(err.map(|e| e.kind), Some(ParseErrorKind::MissingClosingBrace)));
    }

    #[test]
    fn line_break_inside_parens_is_a_continuation() {
        let (program, err) = parse_source("define total (\n    1\n    2\n)\n");
        assert!(err.is_none(), "{err:?}");
        let _ = program;
    }

    #[test]
    fn chained_comparison_is_an_error() {
        let (_, err) = parse_source("define ok 1 < 2 < 3\n");
        assert!(matches!(err.map(|e| e.kind), Some(ParseErrorKind::UnexpectedToken)));
    }

    #[test]
    fn c_style_call_requires_tight_paren() {
        let (program, err) = parse_source("define x sqrt(4)\n");
        assert!(err.is_none(), "{err:?}");
        match &program.statements[0].kind {
            StatementKind::Define { body: DefineBody::Value(expr), .. } => {
                assert!(matches!(expr.kind, ExpressionKind::FunctionCall { .. }));
            }
            other => panic!("expected Define, got {other:?}"),
        }
    }
}
