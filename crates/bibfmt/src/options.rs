//! Output options and their resolution.
//!
//! Options arrive in up to three layers: built-in defaults, options stored on
//! the [`Cite`](crate::Cite) instance, and options passed to one `get` call.
//! [`Options::resolve`] merges them field by field, later layers winning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether output is materialized or left as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    /// Parsed JSON values and markup nodes.
    #[default]
    Real,
    String,
}

/// The representation requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputType {
    String,
    Html,
    #[default]
    Json,
}

/// The top-level part of a style string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleKind {
    Csl,
    Bibtex,
    Citation,
    /// Anything else, kept verbatim for error reporting.
    Other(String),
}

/// A style string split into kind and format: `citation-apa` is kind
/// `citation` with format `apa`; `csl` has an empty format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    raw: String,
    kind: StyleKind,
    format: String,
}

impl Style {
    /// Split at the first `-`. Never fails; unknown kinds become
    /// [`StyleKind::Other`].
    pub fn parse(raw: &str) -> Style {
        let (kind, format) = raw.split_once('-').unwrap_or((raw, ""));
        let kind = match kind {
            "csl" => StyleKind::Csl,
            "bibtex" => StyleKind::Bibtex,
            "citation" => StyleKind::Citation,
            other => StyleKind::Other(other.to_string()),
        };
        Style {
            raw: raw.to_string(),
            kind,
            format: format.to_string(),
        }
    }

    pub fn kind(&self) -> &StyleKind {
        &self.kind
    }

    /// The part after the first hyphen, possibly empty.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::parse("csl")
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

macro_rules! keyword_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}', expected one of: {}",
                        stringify!($ty),
                        other,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }
    };
}

keyword_enum!(Format { Real => "real", String => "string" });
keyword_enum!(OutputType { String => "string", Html => "html", Json => "json" });

/// A layer of options where every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialOptions {
    pub format: Option<Format>,
    #[serde(rename = "type")]
    pub output_type: Option<OutputType>,
    pub style: Option<String>,
    pub lang: Option<String>,
    /// Locale XML used instead of the built-in locales.
    pub locale: Option<String>,
    /// CSL style XML used instead of a built-in template.
    pub template: Option<String>,
}

impl PartialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = Some(output_type);
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Field-wise merge; fields set in `over` win.
    pub fn merge(&self, over: &PartialOptions) -> PartialOptions {
        PartialOptions {
            format: over.format.or(self.format),
            output_type: over.output_type.or(self.output_type),
            style: over.style.clone().or_else(|| self.style.clone()),
            lang: over.lang.clone().or_else(|| self.lang.clone()),
            locale: over.locale.clone().or_else(|| self.locale.clone()),
            template: over.template.clone().or_else(|| self.template.clone()),
        }
    }
}

/// Fully resolved options for one `get` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub format: Format,
    pub output_type: OutputType,
    pub style: Style,
    pub lang: String,
    /// Empty means "use the built-in locale for `lang`".
    pub locale: String,
    /// Empty means "use the built-in template named by the style format".
    pub template: String,
}

impl Options {
    /// Merge defaults, instance options, and call options.
    ///
    /// `locale` and `template` are reset to empty between the instance and
    /// call layers, so they only ever come from the call.
    pub fn resolve(instance: &PartialOptions, call: &PartialOptions) -> Options {
        let defaults = PartialOptions::new()
            .format(Format::Real)
            .output_type(OutputType::Json)
            .style("csl")
            .lang(bibfmt_citeproc::locale::DEFAULT_LANG);
        let forced = PartialOptions::new().locale("").template("");

        let merged = defaults.merge(instance).merge(&forced).merge(call);

        Options {
            format: merged.format.unwrap_or_default(),
            output_type: merged.output_type.unwrap_or_default(),
            style: merged.style.as_deref().map(Style::parse).unwrap_or_default(),
            lang: merged.lang.unwrap_or_default(),
            locale: merged.locale.unwrap_or_default(),
            template: merged.template.unwrap_or_default(),
        }
    }
}
