use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span,
};

use super::diagnostics::{DiagnosticEngine, DiagnosticLevel};

fn span(start: u32, end: u32) -> Span {
    Span::new(&Rc::new("main.jot".to_string()), start, end)
}

#[test]
fn test_counts_by_level() {
    let mut engine = DiagnosticEngine::new();
    engine.add_error(span(0, 1), "first");
    engine.add_warning(span(2, 3), "unused");
    engine.report(span(4, 5), "second", DiagnosticLevel::Error);

    assert_eq!(engine.error_count(), 2);
    assert_eq!(engine.warning_count(), 1);
    assert!(engine.has_errors());
    assert_eq!(engine.diagnostics()[1].message, "unused");
}

#[test]
fn test_render_points_at_offset() {
    let source = "fun main() {\n    var a = #;\n}\n";
    let offset = source.find('#').unwrap() as u32;

    let mut engine = DiagnosticEngine::new();
    engine.add_error(span(offset, offset + 1), "unexpected character");

    let expected = "\
Error: unexpected character
-> main.jot
  |
2 | var a = #;
  | --------^
";
    assert_eq!(engine.render(source, "main.jot"), expected);
}

#[test]
fn test_report_error_includes_tip() {
    let mut engine = DiagnosticEngine::new();
    let error = Error::new(
        ErrorImpl::BreakOutsideLoop,
        Position(3, Rc::new("main.jot".to_string())),
    );
    engine.report_error(&error);

    let diagnostic = &engine.diagnostics()[0];
    assert_eq!(diagnostic.level, DiagnosticLevel::Error);
    assert_eq!(diagnostic.location.start.0, 3);
    assert!(diagnostic.message.contains("inside a loop"));
}
