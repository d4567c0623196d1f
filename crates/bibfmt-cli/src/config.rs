//! Option files.
//!
//! A config file is a TOML table of default options, for example:
//!
//! ```toml
//! type = "html"
//! style = "citation-vancouver"
//! lang = "en-GB"
//! format = "string"
//! ```
//!
//! These act as instance-level options: command-line flags override them.
//! `locale` and `template` are accepted but have no effect here, since
//! they only apply when given per call (`--locale`, `--template`).

use anyhow::{Context, Result};
use bibfmt::PartialOptions;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub fn load(path: &Path) -> Result<PartialOptions> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let options: PartialOptions = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    if options.locale.is_some() || options.template.is_some() {
        warn!(
            path = %path.display(),
            "locale and template in a config file are ignored; pass --locale or --template"
        );
    }
    debug!(path = %path.display(), ?options, "loaded config");
    Ok(options)
}
