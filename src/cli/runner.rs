//! CLI runner - executes commands

use crate::catalog::{discover, Catalog};
use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::connectors::list_builtin_info;
use crate::engine::{CancellationFlag, SyncConfig, SyncEngine};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::loader::{load_graph, EndpointGraph};
use crate::output::{JsonLinesSink, RecordSink};
use crate::state::{FileStateStore, SinkStateStore, State, StateManager, StateStore};
use crate::template;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Sync {
                streams,
                resume,
                state_output,
            } => self.sync(streams, *resume, state_output.as_deref()).await,
            Commands::Validate => self.validate(),
            Commands::Streams => self.streams(),
            Commands::List => self.list_graphs(),
        }
    }

    /// Load the endpoint graph
    fn load_graph(&self) -> Result<EndpointGraph> {
        load_graph(&self.cli.graph)
    }

    /// Load the tap config, inline JSON taking precedence over the file
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json(json_str);
        }
        match &self.cli.config {
            Some(path) => TapConfig::from_path(path),
            None => Err(Error::config(
                "Config not specified (use -C or --config-json)",
            )),
        }
    }

    /// Load the starting state
    async fn load_state(&self) -> Result<State> {
        if let Some(state_json) = &self.cli.state_json {
            State::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            FileStateStore::new(path).load().await
        } else {
            Ok(State::new())
        }
    }

    /// Catalog from `--catalog`, or discovered when schema files are given
    fn load_catalog(&self, graph: &EndpointGraph) -> Result<Option<Catalog>> {
        if let Some(path) = &self.cli.catalog {
            return Catalog::from_path(path).map(Some);
        }
        match &self.cli.schemas_dir {
            Some(dir) => discover(graph, Some(dir)).map(Some),
            None => Ok(None),
        }
    }

    fn build_client(config: &TapConfig, graph: &EndpointGraph) -> Result<HttpClient> {
        let auth = config.auth_config()?;
        info!(auth = auth.kind_name(), "Building HTTP client");
        HttpClient::with_auth(config.http_config(graph.base_url.as_deref()), auth)
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let graph = self.load_graph()?;
        let config = self.load_config()?;
        let client = Self::build_client(&config, &graph)?;

        let path = match &graph.check {
            Some(check) => check.path.clone(),
            None => graph
                .top_level()
                .iter()
                .find(|e| !template::has_placeholders(&e.path))
                .map(|e| e.path.clone())
                .ok_or_else(|| Error::config("Graph has no check path"))?,
        };

        info!(graph = %graph.name, path = %path, "Checking connection");

        let result = match client.get_page(&path, &[], "check").await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(Error::config(format!(
                "Check path '{path}' returned no data"
            ))),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": "Connection successful"
                    }
                }));
                Ok(())
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
                Err(e)
            }
        }
    }

    /// Print the catalog
    fn discover(&self) -> Result<()> {
        let graph = self.load_graph()?;
        let catalog = discover(&graph, self.cli.schemas_dir.as_deref())?;
        println!("{}", catalog.to_json_pretty()?);
        Ok(())
    }

    /// Sync to stdout
    async fn sync(
        &self,
        streams: &[String],
        resume: bool,
        state_output: Option<&Path>,
    ) -> Result<()> {
        let graph = self.load_graph()?;
        let config = self.load_config()?;
        let state = self.load_state().await?;

        let mut catalog = self.load_catalog(&graph)?;
        if !streams.is_empty() {
            let mut selected = match catalog.take() {
                Some(catalog) => catalog,
                None => discover(&graph, None)?,
            };
            selected.select_only(streams)?;
            catalog = Some(selected);
        }

        let sink: Arc<dyn RecordSink> = Arc::new(JsonLinesSink::stdout());
        let mut manager = StateManager::new(state.clone())
            .with_store(Arc::new(SinkStateStore::new(sink.clone()).with_initial(state)));
        if let Some(path) = state_output {
            manager = manager.with_store(Arc::new(FileStateStore::new(path)));
        }

        let cancellation = CancellationFlag::new();
        let flag = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current request");
                flag.cancel();
            }
        });

        let sync_config = SyncConfig::new()
            .with_page_size(config.page_size)
            .with_resume(resume)
            .with_cancellation(cancellation);

        let client = Arc::new(Self::build_client(&config, &graph)?);
        let mut engine = SyncEngine::new(client, sink, manager).with_config(sync_config);
        let stats = engine.run(&graph, catalog.as_ref()).await?;

        for (stream, count) in &stats.records_emitted {
            info!(stream = %stream, records = count, "Stream summary");
        }
        Ok(())
    }

    /// Validate the endpoint graph
    fn validate(&self) -> Result<()> {
        let graph = self.load_graph()?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Graph '{}' v{} is valid with {} streams (depth {})",
                    graph.name,
                    graph.version,
                    graph.stream_names().len(),
                    graph.depth()
                )
            }
        }));

        Ok(())
    }

    /// Print the stream tree
    fn streams(&self) -> Result<()> {
        let graph = self.load_graph()?;

        let streams: Vec<Value> = graph
            .walk()
            .into_iter()
            .map(|node| {
                json!({
                    "name": node.endpoint.name,
                    "path": node.endpoint.path,
                    "depth": node.depth,
                    "parent": node.parent,
                    "persist": node.endpoint.persist,
                    "paginate": node.endpoint.paginate
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "STREAMS",
            "graph": graph.name,
            "streams": streams
        }));

        Ok(())
    }

    /// List built-in graphs
    fn list_graphs(&self) -> Result<()> {
        let graphs: Vec<Value> = list_builtin_info()
            .into_iter()
            .map(|info| {
                let config_fields: Vec<Value> = info
                    .config_schema
                    .iter()
                    .map(|field| {
                        json!({
                            "name": field.name,
                            "type": field.field_type,
                            "required": field.required,
                            "secret": field.secret,
                            "description": field.description,
                            "default": field.default
                        })
                    })
                    .collect();

                json!({
                    "name": info.name,
                    "description": info.description,
                    "category": info.category,
                    "aliases": info.aliases,
                    "config_schema": config_fields
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "GRAPHS",
            "graphs": graphs
        }));

        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        println!("{}", serde_json::to_string(msg).unwrap_or_default());
    }
}
