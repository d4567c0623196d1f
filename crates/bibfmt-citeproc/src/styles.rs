//! Built-in CSL style templates.

use rust_embed::Embed;

/// Embedded style files from the styles/ directory.
#[derive(Embed)]
#[folder = "styles/"]
#[include = "*.csl"]
struct StyleFiles;

/// The template used when a requested one is not available.
pub const DEFAULT_TEMPLATE: &str = "apa";

/// Look up a built-in template by name ("apa", "vancouver", ...).
pub fn fetch_template(name: &str) -> Option<String> {
    let file = StyleFiles::get(&format!("{}.csl", name))?;
    std::str::from_utf8(file.data.as_ref())
        .ok()
        .map(str::to_string)
}

/// Names of every built-in template, sorted.
pub fn available_templates() -> Vec<String> {
    let mut names: Vec<String> = StyleFiles::iter()
        .filter_map(|name| name.strip_suffix(".csl").map(str::to_string))
        .collect();
    names.sort();
    names
}
