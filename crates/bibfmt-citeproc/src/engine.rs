//! The citation engine interface.
//!
//! An engine is created for one bibliography request, fed the item ids in
//! document order, and asked once for the rendered bibliography. Items and
//! locales are pulled through callbacks, so the engine never sees the
//! caller's collection directly.

use crate::Result;
use crate::reference::ItemData;
use crate::types::Processor;

/// Fetches one item's data by id.
pub type ItemCallback<'a> = Box<dyn Fn(&str) -> Option<ItemData> + 'a>;

/// Fetches locale XML by language tag.
pub type LocaleCallback<'a> = Box<dyn Fn(&str) -> Option<String> + 'a>;

/// A rendered bibliography: wrapper markup plus one string per entry, in
/// the order returned by [`CitationEngine::update_items`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bibliography {
    pub bibstart: String,
    pub bibend: String,
    pub entries: Vec<String>,
}

/// A stateful citation processor.
pub trait CitationEngine {
    /// Register items by id, replacing any earlier registration, and return
    /// the ids in bibliography order.
    fn update_items(&mut self, ids: &[String]) -> Result<Vec<String>>;

    /// Render the bibliography for the registered items.
    fn make_bibliography(&mut self) -> Result<Bibliography>;
}

/// Builds engines. One engine is built per bibliography request.
pub trait EngineFactory {
    fn create<'a>(
        &self,
        style_format: &str,
        lang: &str,
        template: &str,
        retrieve_item: ItemCallback<'a>,
        retrieve_locale: LocaleCallback<'a>,
    ) -> Result<Box<dyn CitationEngine + 'a>>;
}

/// Factory for the built-in [`Processor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEngine;

impl EngineFactory for BuiltinEngine {
    fn create<'a>(
        &self,
        style_format: &str,
        lang: &str,
        template: &str,
        retrieve_item: ItemCallback<'a>,
        retrieve_locale: LocaleCallback<'a>,
    ) -> Result<Box<dyn CitationEngine + 'a>> {
        let processor = Processor::new(style_format, lang, template, retrieve_item, retrieve_locale)?;
        Ok(Box::new(processor))
    }
}
