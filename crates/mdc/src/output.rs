//! Colored terminal output for conversion progress.

use std::path::Path;

use console::{Style, Term};

/// Progress and status reporter writing to stderr.
///
/// Converted documents may be written to stdout, so nothing here touches it.
pub(crate) struct Output {
    term: Term,
    green: Style,
    red: Style,
    dim: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// Report one converted document.
    pub(crate) fn converted(&self, input: &Path, target: &Path) {
        let _ = self.term.write_line(&format!(
            "{} {} {}",
            input.display(),
            self.dim.apply_to("->"),
            target.display()
        ));
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}
