//! Configuration management for mdc.
//!
//! Parses `mdc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `document.title`
//! - `highlight.style`
//! - `highlight.css_class`
//!
//! ## Example
//!
//! ```toml
//! [fenced_code]
//! escape = true
//!
//! [highlight]
//! style = "base16-ocean.dark"
//! line_numbers = true
//!
//! [document]
//! title = "${PROJECT:-Docs}"
//! raw_html = "escape"
//! ```

mod expand;

use std::path::{Path, PathBuf};

use mdc_renderer::{
    CONFLUENCE_CODE_WRAP, CONFLUENCE_LANG_TAG, DocumentOptions, Extensions, FencedCodeConfig,
    HighlightSettings, RawHtml, Template, TemplateError,
};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
/// Highlighting overrides other than `highlight` itself enable highlighting.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override code body escaping.
    pub escape: Option<bool>,
    /// Override the document shell.
    pub wrap: Option<bool>,
    /// Enable or disable highlighting.
    pub highlight: Option<bool>,
    /// Override inline styles.
    pub inline_styles: Option<bool>,
    /// Override line numbers.
    pub line_numbers: Option<bool>,
    /// Override the highlight style.
    pub style: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdc.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fenced code block rendering.
    pub fenced_code: FencedCodeSection,
    /// Syntax highlighting (optional section). Present means enabled.
    pub highlight: Option<HighlightConfig>,
    /// Document rendering.
    pub document: DocumentConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[fenced_code]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FencedCodeSection {
    /// HTML-escape code bodies.
    pub escape: bool,
    /// Code wrapper template with `{lang}` and `{code}` holes.
    pub code_wrap: String,
    /// Language tag template with a `{lang}` hole.
    pub lang_tag: String,
}

impl Default for FencedCodeSection {
    fn default() -> Self {
        Self {
            escape: false,
            code_wrap: CONFLUENCE_CODE_WRAP.to_owned(),
            lang_tag: CONFLUENCE_LANG_TAG.to_owned(),
        }
    }
}

/// `[highlight]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub line_numbers: bool,
    pub guess_language: bool,
    pub css_class: String,
    pub style: String,
    pub use_external: bool,
    pub inline_styles: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        let settings = HighlightSettings::default();
        Self {
            line_numbers: settings.line_numbers,
            guess_language: settings.guess_language,
            css_class: settings.css_class,
            style: settings.style,
            use_external: settings.use_external,
            inline_styles: settings.inline_styles,
        }
    }
}

impl From<&HighlightConfig> for HighlightSettings {
    fn from(config: &HighlightConfig) -> Self {
        Self {
            line_numbers: config.line_numbers,
            guess_language: config.guess_language,
            css_class: config.css_class.clone(),
            style: config.style.clone(),
            use_external: config.use_external,
            inline_styles: config.inline_styles,
        }
    }
}

/// Raw HTML handling as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawHtmlMode {
    #[default]
    Replace,
    Escape,
    Keep,
}

impl From<RawHtmlMode> for RawHtml {
    fn from(mode: RawHtmlMode) -> Self {
        match mode {
            RawHtmlMode::Replace => Self::Replace,
            RawHtmlMode::Escape => Self::Escape,
            RawHtmlMode::Keep => Self::Keep,
        }
    }
}

/// Markdown extensions as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionSet {
    #[default]
    Extra,
    CommonMark,
}

impl From<ExtensionSet> for Extensions {
    fn from(set: ExtensionSet) -> Self {
        match set {
            ExtensionSet::Extra => Self::Extra,
            ExtensionSet::CommonMark => Self::CommonMark,
        }
    }
}

/// `[document]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Wrap output in an XHTML document shell.
    pub wrap: bool,
    /// Document title. Empty means the CLI uses the input file stem.
    pub title: String,
    /// Raw HTML handling.
    pub raw_html: RawHtmlMode,
    /// Markdown extensions.
    pub extensions: ExtensionSet,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            wrap: true,
            title: String::new(),
            raw_html: RawHtmlMode::default(),
            extensions: ExtensionSet::default(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Invalid markup template.
    #[error("Invalid template in {field}: {source}")]
    Template {
        /// Config field path (e.g., "`fenced_code.code_wrap`").
        field: &'static str,
        #[source]
        source: TemplateError,
    },
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`document.title`").
        field: String,
        /// Error message (e.g., "${`PROJECT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn template_error(field: &'static str) -> impl FnOnce(TemplateError) -> ConfigError {
    move |source| ConfigError::Template { field, source }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdc.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading; the result is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(escape) = settings.escape {
            self.fenced_code.escape = escape;
        }
        if let Some(wrap) = settings.wrap {
            self.document.wrap = wrap;
        }
        match settings.highlight {
            Some(false) => self.highlight = None,
            Some(true) => {
                self.highlight.get_or_insert_with(HighlightConfig::default);
            }
            None => {}
        }
        if let Some(inline_styles) = settings.inline_styles {
            self.highlight
                .get_or_insert_with(HighlightConfig::default)
                .inline_styles = inline_styles;
        }
        if let Some(line_numbers) = settings.line_numbers {
            self.highlight
                .get_or_insert_with(HighlightConfig::default)
                .line_numbers = line_numbers;
        }
        if let Some(style) = &settings.style {
            self.highlight
                .get_or_insert_with(HighlightConfig::default)
                .style
                .clone_from(style);
        }
    }

    /// Search for a config file in `start` and its parents.
    #[must_use]
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Template` for malformed templates and
    /// `ConfigError::Validation` for empty highlight settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fenced_code_config()?;
        if let Some(highlight) = &self.highlight {
            require_non_empty(&highlight.css_class, "highlight.css_class")?;
            require_non_empty(&highlight.style, "highlight.style")?;
        }
        Ok(())
    }

    /// Build the fenced code configuration for the renderer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Template` if a template is malformed.
    pub fn fenced_code_config(&self) -> Result<FencedCodeConfig, ConfigError> {
        let code_wrap = Template::code_wrap(self.fenced_code.code_wrap.as_str())
            .map_err(template_error("fenced_code.code_wrap"))?;
        let lang_tag = Template::lang_tag(self.fenced_code.lang_tag.as_str())
            .map_err(template_error("fenced_code.lang_tag"))?;

        Ok(FencedCodeConfig {
            escape: self.fenced_code.escape,
            code_wrap,
            lang_tag,
            highlight: self.highlight.as_ref().map(HighlightSettings::from),
        })
    }

    /// Build the document rendering options for the renderer.
    #[must_use]
    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            raw_html: self.document.raw_html.into(),
            extensions: self.document.extensions.into(),
            wrap: self.document.wrap,
            title: self.document.title.clone(),
        }
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.document.title = expand::expand_env(&self.document.title, "document.title")?;

        if let Some(ref mut highlight) = self.highlight {
            highlight.style = expand::expand_env(&highlight.style, "highlight.style")?;
            highlight.css_class = expand::expand_env(&highlight.css_class, "highlight.css_class")?;
        }

        Ok(())
    }
}
