//! bibfmt CLI - Main entry point

use anyhow::{Context, Result, bail};
use bibfmt::{Cite, Format, Output, OutputType, PartialOptions};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

#[derive(Parser)]
#[command(name = "bibfmt")]
#[command(version)]
#[command(about = "Format CSL-JSON bibliographies as JSON, BibTeX or rendered citations", long_about = None)]
struct Cli {
    /// CSL-JSON input file (reads stdin when absent or '-')
    input: Option<PathBuf>,

    /// Output type: string, html or json
    #[arg(short = 't', long = "type")]
    output_type: Option<OutputType>,

    /// Output style: csl, bibtex or citation-<template>
    #[arg(short, long)]
    style: Option<String>,

    /// Language tag for citation output
    #[arg(short, long)]
    lang: Option<String>,

    /// real (parsed JSON, normalized markup) or string (raw text)
    #[arg(short, long)]
    format: Option<Format>,

    /// CSL locale file to use instead of the built-in locales
    #[arg(long)]
    locale: Option<PathBuf>,

    /// CSL style file to use instead of the built-in templates
    #[arg(long)]
    template: Option<PathBuf>,

    /// TOML file with default options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print entry ids, one per line, instead of formatting
    #[arg(long)]
    ids: bool,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "bibfmt=debug,bibfmt_citeproc=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let output = run(&cli)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<String> {
    let input = read_input(cli.input.as_deref())?;
    let instance = match &cli.config {
        Some(path) => config::load(path)?,
        None => PartialOptions::default(),
    };
    let cite = Cite::from_csl_json(&input)
        .context("Failed to parse CSL-JSON input")?
        .with_options(instance);

    if cli.ids {
        return Ok(cite.get_ids().join("\n"));
    }

    let output = cite.get(&call_options(cli)?)?;
    render(output)
}

fn call_options(cli: &Cli) -> Result<PartialOptions> {
    Ok(PartialOptions {
        format: cli.format,
        output_type: cli.output_type,
        style: cli.style.clone(),
        lang: cli.lang.clone(),
        locale: cli.locale.as_deref().map(read_file).transpose()?,
        template: cli.template.as_deref().map(read_file).transpose()?,
    })
}

fn render(output: Output) -> Result<String> {
    Ok(match output {
        Output::Undefined => bail!("No output for this type/style combination"),
        Output::Json(value) => serde_json::to_string_pretty(&value)?,
        other => other.to_string(),
    })
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => read_file(path),
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "bibfmt",
            "refs.json",
            "--type",
            "html",
            "-s",
            "citation-apa",
            "-f",
            "string",
        ])
        .unwrap();
        assert_eq!(cli.input.as_deref(), Some(Path::new("refs.json")));
        assert_eq!(cli.output_type, Some(OutputType::Html));
        assert_eq!(cli.format, Some(Format::String));
        let options = call_options(&cli).unwrap();
        assert_eq!(options.style.as_deref(), Some("citation-apa"));
        assert_eq!(options.template, None);
    }

    #[test]
    fn test_cli_rejects_unknown_type() {
        assert!(Cli::try_parse_from(["bibfmt", "--type", "xml"]).is_err());
    }

    #[test]
    fn test_render_undefined_is_an_error() {
        assert!(render(Output::Undefined).is_err());
        assert_eq!(
            render(Output::Json(serde_json::json!([1]))).unwrap(),
            "[\n  1\n]"
        );
    }
}
