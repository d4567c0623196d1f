//! Bibliography rendering with CSL (Citation Style Language) styles.
//!
//! This crate provides a small citation engine that takes:
//! - A CSL style template (built-in via [`styles`], or any XML string)
//! - CSL-JSON items, pulled by id through a callback
//! - Locale XML, pulled by language tag through a callback
//!
//! And produces a bibliography as HTML strings, one per entry, in sorted
//! order.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  EngineFactory::create(style, lang, template, callbacks) │
//! └───────────────────────────┬──────────────────────────────┘
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  CitationEngine                                          │
//! │    update_items(ids)   -> ids in bibliography order      │
//! │    make_bibliography() -> bibstart, entries, bibend      │
//! └───────────────────────────┬──────────────────────────────┘
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  style (CSL subset) + locale terms + eval -> Output HTML  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bibfmt_citeproc::{BuiltinEngine, EngineFactory, locale, styles};
//!
//! let template = styles::fetch_template("apa").unwrap();
//! let mut engine = BuiltinEngine.create(
//!     "apa",
//!     "en-US",
//!     &template,
//!     Box::new(|id| items.get(id).cloned()),
//!     Box::new(locale::fetch_locale),
//! )?;
//! let order = engine.update_items(&ids)?;
//! let bibliography = engine.make_bibliography()?;
//! ```

pub mod engine;
pub mod error;
pub mod locale;
pub mod output;
pub mod reference;
pub mod style;
pub mod styles;
pub mod types;
pub mod xml;

mod eval;

// Re-export main types
pub use engine::{
    Bibliography, BuiltinEngine, CitationEngine, EngineFactory, ItemCallback, LocaleCallback,
};
pub use error::{Error, Result};
pub use reference::ItemData;
pub use types::Processor;
