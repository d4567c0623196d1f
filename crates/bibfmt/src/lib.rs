//! Output dispatch for CSL-JSON bibliographies.
//!
//! A [`Cite`] holds an ordered collection of entries. [`Cite::get`] turns it
//! into one of several representations, picked by an output *type*
//! (`string`, `html`, `json`) and a *style* (`csl`, `bibtex`,
//! `citation-<template>`):
//!
//! ```text
//! options ─► Options::resolve ─► Snapshot::capture ─► Pipeline::select
//!                                                          │
//!        ┌─────────────────────────────────────────────────┤
//!        ▼                                                 ▼
//!   bibliography (engine)                     CSL-JSON / BibTeX
//!        └──────────────────────┬──────────────────────────┘
//!                               ▼
//!                          materialize ─► Output
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bibfmt::{Cite, OutputType, PartialOptions, Format};
//!
//! let cite = Cite::from_csl_json(r#"[{"id": "a", "title": "X"}]"#)?;
//! let html = cite.get(
//!     &PartialOptions::new()
//!         .output_type(OutputType::Html)
//!         .style("citation-apa")
//!         .format(Format::String),
//! )?;
//! ```

pub mod bibliography;
pub mod bibtex;
pub mod cite;
pub mod entry;
pub mod error;
pub mod markup;
pub mod materialize;
pub mod options;
pub mod pipeline;
pub mod snapshot;

pub use bibliography::BibliographyResult;
pub use cite::Cite;
pub use entry::Entry;
pub use error::{Error, Result};
pub use markup::{FragmentRenderer, MarkupRenderer, Node, strip_tags};
pub use materialize::Output;
pub use options::{Format, Options, OutputType, PartialOptions, Style, StyleKind};
pub use pipeline::Pipeline;
pub use snapshot::Snapshot;
