use std::fmt::{Display, Write};

use tracing::{error, warn};

use crate::{
    errors::errors::{Error, ErrorTip},
    Span,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

impl Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticLevel::Warning => write!(f, "Warning"),
            DiagnosticLevel::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub location: Span,
    pub message: String,
    pub level: DiagnosticLevel,
}

/// Sink for diagnostics reported while compiling one unit.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        DiagnosticEngine {
            diagnostics: vec![],
        }
    }

    pub fn report(&mut self, location: Span, message: impl Into<String>, level: DiagnosticLevel) {
        let message = message.into();
        match level {
            DiagnosticLevel::Warning => warn!(location = %location.start, "{}", message),
            DiagnosticLevel::Error => error!(location = %location.start, "{}", message),
        }

        self.diagnostics.push(Diagnostic {
            location,
            message,
            level,
        });
    }

    pub fn add_error(&mut self, location: Span, message: impl Into<String>) {
        self.report(location, message, DiagnosticLevel::Error);
    }

    pub fn add_warning(&mut self, location: Span, message: impl Into<String>) {
        self.report(location, message, DiagnosticLevel::Warning);
    }

    /// Records a fatal code generation error, together with its tip.
    pub fn report_error(&mut self, error: &Error) {
        let position = error.get_position().clone();
        let message = match error.get_tip() {
            ErrorTip::None => error.get_internal_error().to_string(),
            tip => format!("{} ({})", error.get_internal_error(), tip),
        };

        self.add_error(
            Span {
                start: position.clone(),
                end: position,
            },
            message,
        );
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(DiagnosticLevel::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.level == level)
            .count()
    }

    /// Renders every diagnostic against the source text it points into.
    ///
    /// ```text
    /// Error: message
    /// -> main.jot
    ///    |
    /// 20 | var a = #;
    ///    | --------^
    /// ```
    pub fn render(&self, source: &str, file: &str) -> String {
        let mut output = String::new();
        for diagnostic in self.diagnostics.iter() {
            render_diagnostic(&mut output, diagnostic, source, file);
        }
        output
    }
}

fn render_diagnostic(output: &mut String, diagnostic: &Diagnostic, source: &str, file: &str) {
    let (line, line_text, column) = line_at_offset(source, diagnostic.location.start.0 as usize);

    let line_str = line.to_string();
    let padding = line_str.len() + 2;

    let _ = writeln!(output, "{}: {}", diagnostic.level, diagnostic.message);
    let _ = writeln!(output, "-> {}", file);
    let _ = writeln!(output, "{:>padding$}", "|");

    let trimmed = line_text.trim_start_matches(' ');
    let removed_whitespace = line_text.len() - trimmed.len();
    let _ = writeln!(output, "{} | {}", line_str, trimmed.trim_end());

    let arrows = column.saturating_sub(removed_whitespace) + 1;
    let _ = writeln!(output, "{:>padding$} {:->arrows$}", "|", "^");
}

/// One based line number, text of that line and column of `offset` in it.
fn line_at_offset(source: &str, offset: usize) -> (usize, &str, usize) {
    let offset = offset.min(source.len());
    let mut line_start = 0;
    let mut line = 1;

    for (index, character) in source.char_indices() {
        if index >= offset {
            break;
        }
        if character == '\n' {
            line += 1;
            line_start = index + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map_or(source.len(), |end| line_start + end);

    (line, &source[line_start..line_end], offset - line_start)
}
