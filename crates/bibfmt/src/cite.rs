//! The entry collection and its `get` operation.

use crate::entry::Entry;
use crate::markup::{FragmentRenderer, MarkupRenderer};
use crate::materialize::{Output, materialize};
use crate::options::{Options, PartialOptions};
use crate::pipeline::Pipeline;
use crate::snapshot::Snapshot;
use crate::Result;
use bibfmt_citeproc::{BuiltinEngine, EngineFactory};
use tracing::{debug, error};

/// An ordered collection of CSL-JSON entries with default output options.
pub struct Cite {
    data: Vec<Entry>,
    options: PartialOptions,
    engines: Box<dyn EngineFactory + Send + Sync>,
    renderer: Option<Box<dyn MarkupRenderer + Send + Sync>>,
}

impl Cite {
    /// A collection using the built-in engine and fragment renderer.
    pub fn new(entries: Vec<Entry>) -> Self {
        Cite {
            data: entries,
            options: PartialOptions::default(),
            engines: Box::new(BuiltinEngine),
            renderer: Some(Box::new(FragmentRenderer)),
        }
    }

    /// Parse CSL-JSON (an array of entries, or a single entry).
    pub fn from_csl_json(json: &str) -> Result<Self> {
        Ok(Cite::new(Entry::parse_list(json)?))
    }

    /// Instance-level options, applied to every `get` before call options.
    pub fn with_options(mut self, options: PartialOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_engine(mut self, engines: impl EngineFactory + Send + Sync + 'static) -> Self {
        self.engines = Box::new(engines);
        self
    }

    pub fn with_renderer(mut self, renderer: impl MarkupRenderer + Send + Sync + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Disable markup rendering: real html output stays text.
    pub fn without_renderer(mut self) -> Self {
        self.renderer = None;
        self
    }

    pub fn add(&mut self, entry: Entry) {
        self.data.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.data
    }

    pub fn options(&self) -> &PartialOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: PartialOptions) {
        self.options = options;
    }

    /// Ids of the live collection, in order. Entries without an id are
    /// skipped.
    pub fn get_ids(&self) -> Vec<String> {
        self.data.iter().filter_map(Entry::id).collect()
    }

    /// Format the collection.
    ///
    /// An invalid type/style pair is logged and yields [`Output::Undefined`];
    /// engine and materialization failures are returned as errors.
    pub fn get(&self, options: &PartialOptions) -> Result<Output> {
        match self.try_get(options) {
            Err(e) if e.is_invalid_request() => {
                error!("[get] {}", e);
                Ok(Output::Undefined)
            }
            other => other,
        }
    }

    /// Like [`Cite::get`], but invalid type/style pairs are errors too.
    pub fn try_get(&self, options: &PartialOptions) -> Result<Output> {
        let resolved = Options::resolve(&self.options, options);
        let pipeline = Pipeline::select(resolved.output_type, &resolved.style)?;
        debug!(
            ?pipeline,
            output_type = %resolved.output_type,
            style = %resolved.style,
            format = %resolved.format,
            "selected pipeline"
        );

        let snapshot = Snapshot::capture(&self.data);
        let text = pipeline.run(&snapshot, &resolved, self.engines.as_ref())?;

        let renderer = self
            .renderer
            .as_ref()
            .map(|r| r.as_ref() as &dyn MarkupRenderer);
        materialize(Output::Text(text), &resolved, renderer)
    }
}

impl std::fmt::Debug for Cite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cite")
            .field("data", &self.data)
            .field("options", &self.options)
            .field("renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}
