//! `mdc styles` command implementation.

use std::io::Write;

use clap::Args;
use mdc_highlight::SyntectHighlighter;

use crate::error::CliError;

/// Arguments for the styles command.
#[derive(Args)]
pub(crate) struct StylesArgs {
    /// Print the CSS stylesheet for classed output in this style.
    #[arg(long, value_name = "STYLE")]
    css: Option<String>,
}

impl StylesArgs {
    /// Execute the styles command.
    ///
    /// # Errors
    ///
    /// Returns an error if the style is unknown or stdout is closed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let highlighter = SyntectHighlighter::new();
        let mut stdout = std::io::stdout().lock();

        match self.css {
            Some(style) => stdout.write_all(highlighter.stylesheet(&style)?.as_bytes())?,
            None => {
                for name in highlighter.style_names() {
                    writeln!(stdout, "{name}")?;
                }
            }
        }
        Ok(())
    }
}
