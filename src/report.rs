// 📝 Error Reporter - ordered diagnostics for one pass
//
// Diagnostics are appended in firing order (rows top to bottom, rules 1→8
// within a row) and rendered in exactly that order. No deduplication, no
// severity levels.

use crate::data_quality::Rule;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// DIAGNOSTIC
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based row number
    pub row_number: usize,
    pub rule: Rule,
    /// Column name, absent for row-level rules
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic tied to a specific column and value
    pub fn for_column(row_number: usize, rule: Rule, column: &str, value: &str) -> Self {
        Diagnostic {
            row_number,
            rule,
            column: Some(column.to_string()),
            value: Some(value.to_string()),
            message: rule.message().to_string(),
        }
    }

    /// Diagnostic about the row as a whole
    pub fn for_row(row_number: usize, rule: Rule) -> Self {
        Diagnostic {
            row_number,
            rule,
            column: None,
            value: None,
            message: rule.message().to_string(),
        }
    }

    /// One report line
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(
                f,
                "ROW_NO: {:06}: Column: {} Value: \"{}\" - {}",
                self.row_number,
                column,
                self.value.as_deref().unwrap_or(""),
                self.message
            ),
            // The mandatory-fields line has never had a separator
            None if self.rule == Rule::MandatoryFields => {
                write!(f, "ROW_NO: {:06}: {}", self.row_number, self.message)
            }
            None => write!(f, "ROW_NO: {:06}: - {}", self.row_number, self.message),
        }
    }
}

// ============================================================================
// ERROR REPORTER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        ErrorReporter {
            diagnostics: Vec::new(),
        }
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(rule = diagnostic.rule.name(), "{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn extend<I>(&mut self, diagnostics: I)
    where
        I: IntoIterator<Item = Diagnostic>,
    {
        for diagnostic in diagnostics {
            self.record(diagnostic);
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Rendered report, one line per diagnostic, in firing order
    pub fn render_lines(&self) -> Vec<String> {
        self.diagnostics.iter().map(Diagnostic::render).collect()
    }

    /// Number of distinct rows with at least one diagnostic
    pub fn rows_with_diagnostics(&self) -> usize {
        let mut rows: Vec<usize> = self.diagnostics.iter().map(|d| d.row_number).collect();
        rows.dedup();
        rows.len()
    }

    pub fn count_for(&self, rule: Rule) -> usize {
        self.diagnostics.iter().filter(|d| d.rule == rule).count()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
