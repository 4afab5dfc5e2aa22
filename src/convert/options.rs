//! Conversion options.

use crate::error::{Error, Result};
use crate::model::FigureFormat;
use crate::parser::{ErrorMode, ParseOptions};
use crate::render::RenderOptions;
use serde_json::Value;

/// Options for one notebook conversion.
///
/// # Example
///
/// ```
/// use nbpaper::{ConvertOptions, FigureFormat};
///
/// let options = ConvertOptions::new()
///     .with_template("two-column")
///     .with_figure_format(FigureFormat::Raster)
///     .with_code(true);
/// assert!(options.include_code);
///
/// let options = ConvertOptions::from_json_str(r#"{"saveFigures": "no", "figure_format": "png"}"#)?;
/// assert!(!options.save_figures);
/// # Ok::<(), nbpaper::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Template name; overrides the template chosen in the notebook
    pub template: Option<String>,

    /// Extract and write figures
    pub save_figures: bool,

    /// Target figure format
    pub figure_format: FigureFormat,

    /// Keep code cells as listings
    pub include_code: bool,

    /// Notebook loading options
    pub parse: ParseOptions,

    /// Rendering options
    pub render: RenderOptions,
}

impl ConvertOptions {
    /// Create new conversion options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template name.
    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    /// Enable or disable figure extraction.
    pub fn with_save_figures(mut self, save: bool) -> Self {
        self.save_figures = save;
        self
    }

    /// Set the figure format.
    pub fn with_figure_format(mut self, format: FigureFormat) -> Self {
        self.figure_format = format;
        self
    }

    /// Keep or drop code listings.
    pub fn with_code(mut self, include: bool) -> Self {
        self.include_code = include;
        self
    }

    /// Set notebook loading options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Skip malformed cells instead of failing.
    pub fn lenient(mut self) -> Self {
        self.parse = self.parse.lenient();
        self
    }

    /// Rendering options with the template name applied.
    pub fn effective_render_options(&self) -> RenderOptions {
        let mut render = self.render.clone();
        if let Some(template) = &self.template {
            render.template = Some(template.clone());
        }
        render
    }

    /// Check values that cannot be expressed in the types.
    pub fn validate(&self) -> Result<()> {
        let name = &self.render.bibliography_name;
        if name.trim().is_empty() || name.contains(|c: char| c == '/' || c == '\\') {
            return Err(Error::invalid_option(
                "bibliography_name",
                name.as_str(),
                "a file stem without path separators",
            ));
        }
        if self.render.code_language.trim().is_empty() {
            return Err(Error::invalid_option(
                "code_language",
                "",
                "a listings language name",
            ));
        }
        Ok(())
    }

    /// Load options from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    /// Load options from a JSON value.
    ///
    /// Keys may be camelCase or snake_case. Booleans may also be given as
    /// `"true"`/`"false"`, `"yes"`/`"no"` or `1`/`0`. Unknown keys are
    /// ignored.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            Error::invalid_option("options", value.to_string(), "a JSON object")
        })?;

        let mut options = Self::default();
        for (raw_key, value) in map {
            let key = normalize_key(raw_key);
            match key.as_str() {
                "template" => {
                    options.template = match value {
                        Value::Null => None,
                        Value::String(s) if s.trim().is_empty() => None,
                        Value::String(s) => Some(s.clone()),
                        other => {
                            return Err(Error::invalid_option(
                                "template",
                                other.to_string(),
                                "a template name",
                            ))
                        }
                    };
                }
                "save_figures" => options.save_figures = parse_bool(&key, value)?,
                "include_code" => options.include_code = parse_bool(&key, value)?,
                "figure_format" => {
                    options.figure_format = value
                        .as_str()
                        .and_then(FigureFormat::parse)
                        .ok_or_else(|| {
                            Error::invalid_option(
                                "figure_format",
                                display_value(value),
                                "vector or raster",
                            )
                        })?;
                }
                "lenient" => {
                    let mode = if parse_bool(&key, value)? {
                        ErrorMode::Lenient
                    } else {
                        ErrorMode::Strict
                    };
                    options.parse = options.parse.with_error_mode(mode);
                }
                "bibliography_name" => {
                    options.render.bibliography_name = parse_string(&key, value)?;
                }
                "code_language" => {
                    options.render.code_language = parse_string(&key, value)?;
                }
                _ => log::debug!("Ignoring unknown option '{}'", raw_key),
            }
        }

        options.validate()?;
        Ok(options)
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            template: None,
            save_figures: true,
            figure_format: FigureFormat::Vector,
            include_code: false,
            parse: ParseOptions::default(),
            render: RenderOptions::default(),
        }
    }
}

/// `saveFigures`, `save-figures` and `save_figures` all become `save_figures`.
fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.trim().chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '-' || c == ' ' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_bool(key: &str, value: &Value) -> Result<bool> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| Error::invalid_option(key, display_value(value), "a boolean"))
}

fn parse_string(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_option(key, display_value(value), "a string"))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert!(options.template.is_none());
        assert!(options.save_figures);
        assert_eq!(options.figure_format, FigureFormat::Vector);
        assert!(!options.include_code);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json_mixed_keys() {
        let options = ConvertOptions::from_json_str(
            r#"{
                "template": "ieee-style",
                "saveFigures": "yes",
                "figure_format": "PNG",
                "includeCode": 1,
                "lenient": true,
                "workflow_version": 3
            }"#,
        )
        .unwrap();

        assert_eq!(options.template.as_deref(), Some("ieee-style"));
        assert!(options.save_figures);
        assert_eq!(options.figure_format, FigureFormat::Raster);
        assert!(options.include_code);
        assert!(options.parse.is_lenient());
    }

    #[test]
    fn test_invalid_values() {
        let err = ConvertOptions::from_json_str(r#"{"figure_format": "bmp"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref key, ref value, .. } if key == "figure_format" && value == "bmp"));

        let err = ConvertOptions::from_json_str(r#"{"save_figures": "maybe"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref key, .. } if key == "save_figures"));

        let err = ConvertOptions::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::InvalidOption { .. }));

        let err = ConvertOptions::from_json_str(r#"{"bibliographyName": "../refs"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref key, .. } if key == "bibliography_name"));
    }

    #[test]
    fn test_unknown_template_is_not_an_error() {
        let options = ConvertOptions::from_json_str(r#"{"template": "nonexistent"}"#).unwrap();
        assert_eq!(options.template.as_deref(), Some("nonexistent"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("saveFigures"), "save_figures");
        assert_eq!(normalize_key("figure-format"), "figure_format");
        assert_eq!(normalize_key("include_code"), "include_code");
    }

    #[test]
    fn test_effective_render_options() {
        let options = ConvertOptions::new().with_template("thesis");
        assert_eq!(
            options.effective_render_options().template.as_deref(),
            Some("thesis")
        );
    }
}
