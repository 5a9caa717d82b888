//! Execution engine module
//!
//! Walks the endpoint graph depth-first, paging through every endpoint,
//! emitting selected records and threading child keys down the tree.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - orchestrates a run with checkpointing
//! - `SyncConfig` - page size, depth ceiling, resume and cancellation
//! - `SyncStats` - pages, records and timing of the last run

mod types;

pub use types::{CancellationFlag, SyncConfig, SyncStats};

use crate::catalog::{discover, Catalog, SelectionSet};
use crate::error::{Error, Result};
use crate::keys::KeyBag;
use crate::loader::{EndpointDefinition, EndpointGraph};
use crate::metrics::Counter;
use crate::output::RecordSink;
use crate::pagination::{paginator_for, read_count, PaginationState, PAGE_COUNT_FIELD};
use crate::schema::{Schema, Transformer};
use crate::source::PageSource;
use crate::state::StateManager;
use crate::template;
use crate::types::JsonValue;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Catalog and selection fixed for one run
struct RunContext<'a> {
    catalog: &'a Catalog,
    selection: &'a SelectionSet,
}

/// What an emitting endpoint writes its records with
struct EmitPlan {
    schema: Schema,
    excluded: BTreeSet<String>,
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// Page fetcher
    source: Arc<dyn PageSource>,
    /// Destination of schema and record messages
    sink: Arc<dyn RecordSink>,
    /// Checkpoint and bookmark tracker
    state: StateManager,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
    /// Streams whose schema was written this run
    schemas_written: HashSet<String>,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(
        source: Arc<dyn PageSource>,
        sink: Arc<dyn RecordSink>,
        state: StateManager,
    ) -> Self {
        Self {
            source,
            sink,
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
            schemas_written: HashSet::new(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get the sync configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every top-level stream of `graph` in declared order.
    ///
    /// Without a catalog the graph is discovered and every stream is
    /// selected. On error `currently_syncing` is left pointing at the
    /// in-flight stream.
    pub async fn run(
        &mut self,
        graph: &EndpointGraph,
        catalog: Option<&Catalog>,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        self.stats = SyncStats::new();
        self.schemas_written.clear();

        if graph.depth() > self.config.max_depth {
            return Err(Error::config(format!(
                "Endpoint graph depth {} exceeds the maximum of {}",
                graph.depth(),
                self.config.max_depth
            )));
        }

        let discovered;
        let (catalog, selection) = match catalog {
            Some(catalog) => (catalog, catalog.selection()),
            None => {
                discovered = discover(graph, None)?;
                let selection = SelectionSet::all(&discovered);
                (&discovered, selection)
            }
        };
        info!(
            graph = %graph.name,
            selected = selection.len(),
            "Starting sync"
        );

        let run = RunContext {
            catalog,
            selection: &selection,
        };

        let resume_from = self.resume_point(graph).await;
        let mut skipping = resume_from.is_some();

        for endpoint in graph.top_level() {
            if skipping {
                if resume_from.as_deref() == Some(endpoint.name.as_str()) {
                    info!(stream = %endpoint.name, "Resuming from checkpoint");
                    skipping = false;
                } else {
                    debug!(stream = %endpoint.name, "Skipping stream before checkpoint");
                    continue;
                }
            }

            self.check_cancelled(&endpoint.name)?;
            self.state.mark_syncing(Some(&endpoint.name)).await?;
            info!(stream = %endpoint.name, "Syncing stream");

            self.sync_endpoint(&run, endpoint, KeyBag::new(), 1).await?;
            self.stats.add_stream();
        }

        self.state.mark_syncing(None).await?;

        self.stats
            .set_duration(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));
        info!(
            records = self.stats.total_records(),
            pages = self.stats.pages_fetched,
            duration_ms = self.stats.duration_ms,
            "Sync complete"
        );
        Ok(self.stats.clone())
    }

    /// Top-level stream to resume from, when resuming is enabled
    async fn resume_point(&self, graph: &EndpointGraph) -> Option<String> {
        if !self.config.resume_from_checkpoint {
            return None;
        }
        let stream = self.state.currently_syncing().await?;
        if graph.is_top_level(&stream) {
            Some(stream)
        } else {
            warn!(stream = %stream, "Checkpoint does not name a top-level stream, starting over");
            None
        }
    }

    fn check_cancelled(&self, stream: &str) -> Result<()> {
        if self.config.cancellation.is_cancelled() {
            return Err(Error::Cancelled {
                stream: stream.to_string(),
            });
        }
        Ok(())
    }

    /// Write the stream's schema the first time it is entered.
    ///
    /// SCHEMA is written only for streams that emit records in this run:
    /// persisted and selected. Unselected streams are walked silently.
    fn prepare_emit(
        &mut self,
        run: &RunContext<'_>,
        endpoint: &EndpointDefinition,
    ) -> Result<Option<EmitPlan>> {
        if !endpoint.persist || !run.selection.contains(&endpoint.name) {
            return Ok(None);
        }

        let entry = run.catalog.get(&endpoint.name);
        let schema = entry
            .map(|e| e.schema.clone())
            .or_else(|| endpoint.schema.clone())
            .unwrap_or_else(Schema::permissive_object);
        let key_properties = entry.map_or(&endpoint.primary_key, |e| &e.key_properties);
        let excluded = entry.map(|e| e.excluded_fields()).unwrap_or_default();

        if self.schemas_written.insert(endpoint.name.clone()) {
            self.sink
                .emit_schema(&endpoint.name, &schema, key_properties)?;
        }

        Ok(Some(EmitPlan { schema, excluded }))
    }

    fn sync_endpoint<'a>(
        &'a mut self,
        run: &'a RunContext<'a>,
        endpoint: &'a EndpointDefinition,
        key_bag: KeyBag,
        depth: usize,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let stream = endpoint.name.as_str();
            if depth > self.config.max_depth {
                return Err(Error::config(format!(
                    "Stream '{stream}' is nested deeper than {}",
                    self.config.max_depth
                )));
            }

            let path = template::render_path(&endpoint.path, &key_bag, stream)?;
            let plan = self.prepare_emit(run, endpoint)?;
            let paginator = paginator_for(endpoint.paginate);
            let mut page = PaginationState::new(self.config.page_size);

            loop {
                self.check_cancelled(stream)?;

                let params = paginator.params(&page);
                let Some(body) = self.source.fetch_page(&path, &params, stream).await? else {
                    debug!(stream, path = %path, "No data, skipping endpoint");
                    return Ok(());
                };
                let time_extracted = Utc::now();
                self.stats.add_page();

                let records = extract_records(endpoint, &body)?;
                debug!(
                    stream,
                    path = %path,
                    page_number = page.page_number,
                    records = records.len(),
                    "Fetched page"
                );

                let mut counter = Counter::record_count(stream);
                let mut transformer = Transformer::new();
                for record in records {
                    self.check_cancelled(stream)?;

                    if let Some(plan) = &plan {
                        let typed = transformer
                            .transform(record, &plan.schema, &plan.excluded)
                            .map_err(|e| Error::Validation {
                                stream: stream.to_string(),
                                path: e.path,
                                message: e.message,
                            })?;
                        self.sink.emit_record(stream, typed, Some(time_extracted))?;
                        counter.increment();
                        self.stats.add_record(stream);
                    } else {
                        self.stats.add_traversed();
                    }

                    if endpoint.has_children() {
                        let child_bag = key_bag.derive(stream, &endpoint.provides, record)?;
                        for child in &endpoint.children {
                            self.sync_endpoint(run, child, child_bag.clone(), depth + 1)
                                .await?;
                        }
                    }
                }
                transformer.log_summary(stream);
                counter.flush();

                if paginator.process_response(&body, &mut page).is_done() {
                    break;
                }
            }

            Ok(())
        }
        .boxed()
    }
}

/// Records on one page.
///
/// Without a data key the whole body is a single record. The data key may
/// only be absent on an explicitly empty listing (`page_count: 0`).
fn extract_records<'b>(
    endpoint: &EndpointDefinition,
    body: &'b JsonValue,
) -> Result<Vec<&'b JsonValue>> {
    let Some(data_key) = &endpoint.data_key else {
        return Ok(vec![body]);
    };

    match body.get(data_key.as_str()) {
        None | Some(JsonValue::Null) if read_count(body, PAGE_COUNT_FIELD) == Some(0) => {
            debug!(stream = %endpoint.name, data_key = %data_key, "Empty listing");
            Ok(Vec::new())
        }
        None | Some(JsonValue::Null) => Err(Error::record_extraction(
            &endpoint.name,
            data_key,
            "key missing from response",
        )),
        Some(JsonValue::Array(items)) => Ok(items.iter().collect()),
        Some(other) => Err(Error::record_extraction(
            &endpoint.name,
            data_key,
            format!("expected an array, found {}", json_kind(other)),
        )),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
