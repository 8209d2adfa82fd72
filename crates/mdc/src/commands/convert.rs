//! `mdc convert` command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use mdc_config::{CliSettings, Config};
use mdc_highlight::SyntectHighlighter;
use mdc_renderer::{Converter, HighlightError};
use rayon::prelude::*;

use crate::error::CliError;
use crate::output::Output;

/// Extension of files written next to their inputs.
const OUTPUT_EXTENSION: &str = "xhtml";

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markdown files to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file for a single input (default: stdout).
    /// Multiple inputs are written next to each input as `<stem>.xhtml`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTML-escape code block bodies (overrides config).
    #[arg(long)]
    escape: bool,

    /// Emit the body only, without the XHTML document shell.
    #[arg(long)]
    no_wrap: bool,

    /// Enable syntax highlighting.
    #[arg(long)]
    highlight: bool,

    /// Highlight style (implies --highlight).
    #[arg(long)]
    style: Option<String>,

    /// Use inline styles instead of CSS classes (implies --highlight).
    #[arg(long)]
    inline_styles: bool,

    /// Number highlighted code lines (implies --highlight).
    #[arg(long)]
    line_numbers: bool,

    /// Document title (default: config value, then input file stem).
    #[arg(long)]
    title: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or any document fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        if self.output.is_some() && self.inputs.len() > 1 {
            return Err(CliError::Validation(
                "--output can only be used with a single input".to_owned(),
            ));
        }

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }
        let converter = build_converter(&config)?;

        if let [input] = self.inputs.as_slice() {
            let title = self.resolve_title(&config, input);
            let html = convert_file(&converter, input, &title)?;
            match &self.output {
                Some(path) => {
                    write_file(path, &html)?;
                    output.success(&format!("Wrote {}", path.display()));
                }
                None => std::io::stdout().lock().write_all(html.as_bytes())?,
            }
            return Ok(());
        }

        self.convert_all(&config, &converter, &output)
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            escape: self.escape.then_some(true),
            wrap: self.no_wrap.then_some(false),
            highlight: self.highlight.then_some(true),
            inline_styles: self.inline_styles.then_some(true),
            line_numbers: self.line_numbers.then_some(true),
            style: self.style.clone(),
        }
    }

    fn resolve_title(&self, config: &Config, input: &Path) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        if !config.document.title.is_empty() {
            return config.document.title.clone();
        }
        input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Convert every input in parallel, writing `<stem>.xhtml` next to it.
    fn convert_all(
        &self,
        config: &Config,
        converter: &Converter,
        output: &Output,
    ) -> Result<(), CliError> {
        let results: Vec<(&PathBuf, Result<PathBuf, CliError>)> = self
            .inputs
            .par_iter()
            .map(|input| {
                let title = self.resolve_title(config, input);
                let result = convert_file(converter, input, &title).and_then(|html| {
                    let target = output_path(input);
                    write_file(&target, &html)?;
                    Ok(target)
                });
                (input, result)
            })
            .collect();

        let mut failed = 0;
        for (input, result) in &results {
            match result {
                Ok(target) => output.converted(input, target),
                Err(err) => {
                    failed += 1;
                    output.error(&format!("Error: {err}"));
                }
            }
        }

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} documents failed to convert",
                results.len()
            )));
        }

        output.success(&format!("Converted {} documents", results.len()));
        Ok(())
    }
}

/// Build a converter from configuration, attaching a highlighter when enabled.
fn build_converter(config: &Config) -> Result<Converter, CliError> {
    let fenced_code = config.fenced_code_config()?;
    let highlight = fenced_code.highlight.clone();
    let converter = Converter::new(fenced_code, config.document_options());

    let Some(settings) = highlight else {
        return Ok(converter);
    };

    let highlighter = SyntectHighlighter::new();
    if settings.use_external && !highlighter.style_names().any(|name| name == settings.style) {
        return Err(HighlightError::UnknownStyle(settings.style).into());
    }
    Ok(converter.with_highlighter(Arc::new(highlighter)))
}

/// Read and convert one markdown file.
fn convert_file(converter: &Converter, path: &Path, title: &str) -> Result<String, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let html = converter
        .convert_bytes_with_title(&bytes, title)
        .map_err(|source| CliError::Render {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "Converted document");
    Ok(html)
}

fn write_file(path: &Path, html: &str) -> Result<(), CliError> {
    std::fs::write(path, html).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Output path for an input converted in batch mode.
fn output_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc_renderer::RenderError;
    use pretty_assertions::assert_eq;

    fn args(inputs: Vec<PathBuf>) -> ConvertArgs {
        ConvertArgs {
            inputs,
            output: None,
            config: None,
            escape: false,
            no_wrap: false,
            highlight: false,
            style: None,
            inline_styles: false,
            line_numbers: false,
            title: None,
            verbose: false,
        }
    }

    fn config_in(dir: &Path, toml: &str) -> PathBuf {
        let path = dir.join("mdc.toml");
        std::fs::write(&path, toml).unwrap();
        path
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("docs/guide.md")),
            PathBuf::from("docs/guide.xhtml")
        );
        assert_eq!(output_path(Path::new("README")), PathBuf::from("README.xhtml"));
    }

    #[test]
    fn test_cli_settings_only_set_flags() {
        let mut args = args(vec![PathBuf::from("a.md")]);
        args.no_wrap = true;
        args.style = Some("InspiredGitHub".to_owned());

        let settings = args.cli_settings();
        assert_eq!(settings.escape, None);
        assert_eq!(settings.wrap, Some(false));
        assert_eq!(settings.highlight, None);
        assert_eq!(settings.style.as_deref(), Some("InspiredGitHub"));
    }

    #[test]
    fn test_resolve_title() {
        let config = Config::default();
        let mut args = args(vec![]);
        assert_eq!(args.resolve_title(&config, Path::new("dir/guide.md")), "guide");

        let mut config = Config::default();
        config.document.title = "Configured".to_owned();
        assert_eq!(args.resolve_title(&config, Path::new("guide.md")), "Configured");

        args.title = Some("Flag".to_owned());
        assert_eq!(args.resolve_title(&config, Path::new("guide.md")), "Flag");
    }

    #[test]
    fn test_convert_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.md");
        std::fs::write(&input, "Hi\n\n```python\nprint(1)\n```\n").unwrap();
        let mut config = Config::default();
        config.document.wrap = false;

        let converter = build_converter(&config).unwrap();
        let html = convert_file(&converter, &input, "page").unwrap();

        assert_eq!(
            html,
            "<p>Hi</p>\n\
             <ac:structured-macro ac:name=\"code\">\
             <ac:parameter ac:name=\"language\">python</ac:parameter>\
             <ac:plain-text-body><![CDATA[print(1)\n]]></ac:plain-text-body>\
             </ac:structured-macro>\n"
        );
    }

    #[test]
    fn test_convert_file_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.md");
        std::fs::write(&input, b"\xfe\xff").unwrap();

        let converter = build_converter(&Config::default()).unwrap();
        let err = convert_file(&converter, &input, "bad").unwrap_err();

        assert!(matches!(
            err,
            CliError::Render {
                source: RenderError::Encoding(_),
                ..
            }
        ));
        assert!(err.to_string().contains("bad.md"));
    }

    #[test]
    fn test_convert_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let converter = build_converter(&Config::default()).unwrap();

        let err = convert_file(&converter, &dir.path().join("none.md"), "").unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }

    #[test]
    fn test_build_converter_unknown_style() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_in(dir.path(), "[highlight]\nstyle = \"no-such-style\"\n");
        let config = Config::load(Some(&path), None).unwrap();

        let err = build_converter(&config).err().unwrap();
        assert!(matches!(
            err,
            CliError::Highlight(HighlightError::UnknownStyle(_))
        ));
    }

    #[test]
    fn test_build_converter_with_highlighting() {
        let mut config = Config::default();
        config.document.wrap = false;
        config.highlight = Some(mdc_config::HighlightConfig::default());

        let converter = build_converter(&config).unwrap();
        let html = converter.convert("```rust\nfn main() {}\n```").unwrap();
        assert!(html.starts_with("<div class=\"codehilite\"><pre>"));
    }

    #[test]
    fn test_execute_single_input_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "[document]\ntitle = \"Manual\"\n");
        let input = dir.path().join("intro.md");
        let target = dir.path().join("out.xhtml");
        std::fs::write(&input, "# Intro\n").unwrap();

        let mut args = args(vec![input]);
        args.config = Some(config);
        args.output = Some(target.clone());
        args.execute().unwrap();

        let page = std::fs::read_to_string(target).unwrap();
        assert!(page.contains("<title>Manual</title>"));
        assert!(page.contains("<h1>Intro</h1>"));
    }

    #[test]
    fn test_execute_multiple_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "");
        let first = dir.path().join("one.md");
        let second = dir.path().join("two.md");
        std::fs::write(&first, "one").unwrap();
        std::fs::write(&second, "~~~\ntwo\n~~~\n").unwrap();

        let mut args = args(vec![first, second]);
        args.config = Some(config);
        args.no_wrap = true;
        args.execute().unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("one.xhtml")).unwrap(),
            "<p>one</p>\n"
        );
        let two = std::fs::read_to_string(dir.path().join("two.xhtml")).unwrap();
        assert!(two.contains("<![CDATA[two\n]]>"));
    }

    #[test]
    fn test_execute_multiple_inputs_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "");
        let good = dir.path().join("good.md");
        std::fs::write(&good, "ok").unwrap();

        let mut args = args(vec![good, dir.path().join("missing.md")]);
        args.config = Some(config);
        let err = args.execute().unwrap_err();

        assert!(err.to_string().contains("1 of 2"));
        assert!(dir.path().join("good.xhtml").exists());
    }

    #[test]
    fn test_output_with_multiple_inputs_rejected() {
        let mut args = args(vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);
        args.output = Some(PathBuf::from("out.xhtml"));

        assert!(matches!(args.execute(), Err(CliError::Validation(_))));
    }
}
