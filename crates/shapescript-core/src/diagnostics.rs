// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Caret-aligned diagnostic rendering.

use std::fmt::Display;

use crate::error::Located;
use crate::source::{display_width, SourceRange};

/// Renders a located error against its source text as a single multi-line
/// diagnostic:
///
/// ```text
/// <message> at line <n>, column <n>.
///
///     <line of source>
///     <caret underline aligned to range>
///
/// <optional hint>
/// ```
#[must_use]
pub fn format_diagnostic<K: Display>(error: &Located<K>, source: &str) -> String {
    let Some(range) = error.range else {
        return match &error.hint {
            Some(hint) => format!("{}.\n\n{hint}", error.kind),
            None => format!("{}.", error.kind),
        };
    };

    let position = range.start_position(source);
    let line_text = line_at(source, position.line);

    let mut out = String::new();
    out.push_str(&format!("{} at line {}, column {}.\n\n", error.kind, position.line, position.column));
    out.push_str("    ");
    out.push_str(line_text);
    out.push('\n');
    out.push_str("    ");
    out.push_str(&caret_underline(position.column, &range, source));
    out.push('\n');
    if let Some(hint) = &error.hint {
        out.push('\n');
        out.push_str(hint);
    }
    out
}

fn line_at(source: &str, line_number: usize) -> &str {
    source.lines().nth(line_number - 1).unwrap_or("")
}

/// Builds a caret underline aligned to `range`'s extent on its starting
/// line, widening for wide/emoji characters so the underline still
/// spans their true display width.
fn caret_underline(start_column: usize, range: &SourceRange, source: &str) -> String {
    let end_column = if range.end > range.start {
        // Only widen the underline across characters that are still on
        // the same line as the range's start.
        let end_position = range.end.min(source.len());
        let same_line_end = source[range.start..end_position].find('\n').map_or(end_position, |nl| range.start + nl);
        let consumed: usize = source[range.start..same_line_end].chars().map(display_width).sum();
        start_column + consumed.max(1)
    } else {
        start_column + 1
    };

    let mut underline = String::new();
    for _ in 0..start_column.saturating_sub(1) {
        underline.push(' ');
    }
    for _ in start_column..end_column {
        underline.push('^');
    }
    underline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Located, ParseErrorKind};

    #[test]
    fn formats_with_caret_under_range() {
        let source = "cube 1 2 x";
        let range = SourceRange::new(9, 10);
        let error = Located::new(ParseErrorKind::UnexpectedToken, range);
        let rendered = format_diagnostic(&error, source);
        assert!(rendered.contains("cube 1 2 x"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn includes_hint_when_present() {
        let error =
            Located::new(ParseErrorKind::ExpectedExpression, SourceRange::new(0, 1)).with_hint("did you mean 'cube'?");
        let rendered = format_diagnostic(&error, "x");
        assert!(rendered.ends_with("did you mean 'cube'?"));
    }
}
