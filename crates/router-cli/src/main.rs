//! Process wiring for the semantic router: loads a servers-config file,
//! builds the runtime's subsystems from the environment-variable table,
//! and dispatches to either a one-shot indexing pass or a long-running
//! `semantic_router` service.

mod config;

use anyhow::Context as _;
use axum::{extract::State, routing::post, Json, Router};
use clap::{Parser, Subcommand, ValueEnum};
use config::RuntimeEnv;
use router_content_store::ContentStore;
use router_indexer::Indexer;
use router_protocol::RouterError;
use router_providers::{OpenAiDescriber, OpenAiEmbedder, OpenAiVision};
use router_server::RouterService;
use router_supervisor::ServerSupervisor;
use router_task_pool::TaskPool;
use router_vector_index::InProcessVectorStore;
use rmcp::ServiceExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(5 * 60);
const EVICTION_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const TASK_POOL_WORKERS: usize = 4;

#[derive(Parser)]
#[command(name = "semantic-router")]
#[command(about = "Semantic router and lifecycle manager for MCP tool servers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every non-ignored configured server's tools into the vector store.
    Index {
        #[arg(long)]
        config: PathBuf,

        /// Reindex every server, even one already indexed and not marked `overwrite`.
        #[arg(long)]
        force: bool,
    },

    /// Run the semantic_router service.
    Serve {
        #[arg(long)]
        config: PathBuf,

        #[arg(long, value_enum, default_value_t = Transport::Stdio)]
        transport: Transport,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 7878)]
        port: u16,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum Transport {
    Http,
    Stdio,
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Index { config, force } => run_index(&config, force).await,
        Commands::Serve {
            config,
            transport,
            host,
            port,
        } => run_serve(&config, transport, &host, port).await,
    };

    std::process::exit(exit_code);
}

async fn run_index(config_path: &PathBuf, force: bool) -> i32 {
    match try_index(config_path, force).await {
        Ok(had_errors) => {
            if had_errors {
                3
            } else {
                0
            }
        }
        Err(err) => {
            log::error!("{err}");
            err.exit_code()
        }
    }
}

async fn try_index(config_path: &PathBuf, force: bool) -> Result<bool, RouterError> {
    let configs = config::load_servers_config(config_path).await?;
    let env = RuntimeEnv::from_env()?;

    let vector_index = InProcessVectorStore::open(
        &env.qdrant_storage_path,
        env.dimensions,
    )
    .await
    .map_err(RouterError::from)?;

    let embedder = OpenAiEmbedder::from_env(env.dimensions).map_err(RouterError::from)?;
    let describer = OpenAiDescriber::from_env().map_err(RouterError::from)?;

    let indexer = Indexer::new(&vector_index, &embedder, Some(&describer));
    let stats = indexer.index(&configs, force).await.map_err(RouterError::from)?;

    log::info!(
        "indexed {} server(s), skipped {}, upserted {} tool(s), deleted {}, describer fallbacks {}",
        stats.servers_indexed,
        stats.servers_skipped,
        stats.tools_upserted,
        stats.tools_deleted,
        stats.describer_fallbacks
    );
    for error in &stats.errors {
        log::error!("indexing error: {error}");
    }

    Ok(stats.had_errors())
}

async fn run_serve(config_path: &PathBuf, transport: Transport, host: &str, port: u16) -> i32 {
    match try_serve(config_path, transport, host, port).await {
        Ok(()) => 0,
        Err(err) => {
            log::error!("{err}");
            if matches!(err, RouterError::ConfigError(_)) {
                err.exit_code()
            } else {
                4
            }
        }
    }
}

async fn try_serve(
    config_path: &PathBuf,
    transport: Transport,
    host: &str,
    port: u16,
) -> Result<(), RouterError> {
    let configs = config::load_servers_config(config_path).await?;
    let env = RuntimeEnv::from_env()?;

    let vector_index: Arc<dyn router_vector_index::VectorStore> = Arc::new(
        InProcessVectorStore::open(
            &env.qdrant_storage_path,
            env.dimensions,
        )
        .await
        .map_err(RouterError::from)?,
    );
    let embedder: Arc<dyn router_providers::Embedder> =
        Arc::new(OpenAiEmbedder::from_env(env.dimensions).map_err(RouterError::from)?);

    let content_store = Arc::new(
        ContentStore::with_max_result_tokens(env.content_storage_path.as_str(), env.max_result_tokens)
            .await
            .map_err(RouterError::from)?,
    );

    let vision: Option<Arc<dyn router_providers::Vision>> = if env.describe_images {
        match OpenAiVision::from_env() {
            Ok(vision) => Some(Arc::new(vision)),
            Err(err) => {
                log::warn!("vision provider unavailable, image captions disabled: {err}");
                None
            }
        }
    } else {
        None
    };

    let supervisor = Arc::new(ServerSupervisor::new(configs.clone()));
    tokio::spawn(supervisor.clone().run_eviction_sweeper(DEFAULT_IDLE_TTL, EVICTION_SWEEP_INTERVAL));

    let task_pool = Arc::new(TaskPool::new(supervisor.clone(), content_store.clone(), vision, env.describe_images));
    for handle in task_pool.spawn_workers(TASK_POOL_WORKERS) {
        // Workers run for the process lifetime; nothing awaits these handles.
        drop(handle);
    }

    let server_configs = configs.into_iter().map(|c| (c.name.clone(), c)).collect();
    let service = RouterService::new(
        server_configs,
        vector_index,
        embedder,
        supervisor,
        task_pool,
        content_store,
    );

    match transport {
        Transport::Stdio => serve_stdio(service).await,
        Transport::Http => serve_http(service, host, port).await,
    }
}

async fn serve_stdio(service: RouterService) -> Result<(), RouterError> {
    let server = service
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|err| RouterError::ProtocolError(err.to_string()))?;
    server
        .waiting()
        .await
        .map_err(|err| RouterError::ProtocolError(err.to_string()))?;
    Ok(())
}

/// Minimal HTTP-over-MCP surface: a single `POST /semantic_router` endpoint
/// accepting the same `{operation, ...}` envelope the stdio transport's
/// `semantic_router` tool accepts, bypassing full JSON-RPC wire framing.
async fn serve_http(service: RouterService, host: &str, port: u16) -> Result<(), RouterError> {
    let state = Arc::new(service);
    let app = Router::new()
        .route("/semantic_router", post(http_dispatch))
        .with_state(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))
        .map_err(|err| RouterError::ProtocolError(err.to_string()))?;
    log::info!("serving semantic_router over HTTP on {addr}");
    axum::serve(listener, app)
        .await
        .map_err(|err| RouterError::ProtocolError(err.to_string()))
}

async fn http_dispatch(
    State(service): State<Arc<RouterService>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    match service.dispatch_value(body).await {
        Ok(value) => Json(value),
        Err(err) => Json(serde_json::json!({ "error": { "kind": err.kind(), "message": err.to_string() } })),
    }
}
