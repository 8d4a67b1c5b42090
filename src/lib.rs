#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::{
    compiler::compiler::{compile, Compilation},
    config::CompilerOptions,
    errors::errors::{Diagnostic, ErrorTip},
};

pub mod ast;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod scope;
pub mod type_checker;

extern crate regex;

/// A location in a source document. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Position { offset, line, column }
    }

    pub fn null() -> Self {
        Position::new(0, 1, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// Span used for diagnostics that have no source location.
    pub fn synthetic() -> Self {
        Span::new(Position::null(), Position::null())
    }

    /// Widens `self` so it also covers `other`.
    pub fn to(&self, other: &Span) -> Span {
        let start = if other.start.offset < self.start.offset { other.start } else { self.start };
        let end = if other.end.offset > self.end.offset { other.end } else { self.end };
        Span { start, end }
    }
}

/// The in-memory document handed to the core by the driver.
///
/// `text` is `None` when the driver could not provide any content.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub filename: String,
    pub text: Option<String>,
}

impl SourceDocument {
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        SourceDocument {
            filename: filename.into(),
            text: Some(text.into()),
        }
    }

    pub fn missing(filename: impl Into<String>) -> Self {
        SourceDocument {
            filename: filename.into(),
            text: None,
        }
    }

    pub fn name(&self) -> Rc<String> {
        Rc::new(self.filename.clone())
    }
}

/// Compiles one document with default options.
pub fn compile_unit(document: &SourceDocument) -> Compilation {
    compile(document, &CompilerOptions::default())
}

pub fn compile_unit_with(document: &SourceDocument, options: &CompilerOptions) -> Compilation {
    compile(document, options)
}

/// Returns the 1-based line number, the full line text and the 0-based offset of
/// `position` within that line.
pub fn get_line_at_position(content: &str, position: usize) -> (usize, String, usize) {
    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&position) {
            return (line_number, line.to_string(), position - start);
        }

        start = end;
        line_number += 1;
    }

    // Past the end: point just behind the last character of the last line.
    let last = content.split_inclusive('\n').last().unwrap_or("");
    (line_number.saturating_sub(1).max(1), last.to_string(), last.trim_end_matches('\n').len())
}

/// Renders a diagnostic with its source line and a caret underline.
pub fn display_diagnostic(diagnostic: &Diagnostic, source: &str) -> String {
    /*
        error: message
        -> final.lang:20:9
           |
        20 | let a = #;
           | --------^
    */
    let span = diagnostic.get_span();
    let (line, line_text, line_pos) = get_line_at_position(source, span.start.offset);

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    let mut out = String::new();
    if let ErrorTip::None = diagnostic.get_tip() {
        out.push_str(&format!("{}: {}\n", diagnostic.severity(), diagnostic.message()));
    } else {
        out.push_str(&format!(
            "{}: {} ({})\n",
            diagnostic.severity(),
            diagnostic.message(),
            diagnostic.get_tip()
        ));
    }
    out.push_str(&format!("-> {}:{}:{}\n", diagnostic.document(), span.start.line, span.start.column));
    out.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let width = span.end.offset.saturating_sub(span.start.offset).max(1);
    let arrows = line_pos.saturating_sub(removed_whitespace) + width;
    out.push_str(&format!("{:>padding$} {}{}", "|", "-".repeat(arrows - width), "^".repeat(width)));

    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_line_at_position() {
        let content = "Hello, world!\nfoo\nbar\nTesting { }\n";
        let (line_number, line, line_pos) = get_line_at_position(content, 10);
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = get_line_at_position(content, 30);
        assert_eq!(line_number, 4);
        assert_eq!(line, "Testing { }\n");
        assert_eq!(line_pos, 8);
    }

    #[test]
    fn test_span_widening() {
        let a = Span::new(Position::new(4, 1, 5), Position::new(6, 1, 7));
        let b = Span::new(Position::new(0, 1, 1), Position::new(2, 1, 3));
        let merged = a.to(&b);
        assert_eq!(merged.start.offset, 0);
        assert_eq!(merged.end.offset, 6);
    }

    #[test]
    fn test_display_diagnostic_points_at_offending_text() {
        let source = "declare x = 1 + \"s\";\n";
        let compilation = compile_unit(&SourceDocument::new("test.lang", source));
        let diagnostic = compilation.diagnostics.iter().next().unwrap();

        let rendered = display_diagnostic(diagnostic, source);
        assert!(rendered.starts_with("error: Type mismatch"));
        assert!(rendered.contains("-> test.lang:1:"));
        assert!(rendered.contains("1 | declare x = 1 + \"s\";"));
        assert!(rendered.contains('^'));
    }
}
