use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use carlens_server::config::{connect_store, AppConfig};
use carlens_server::logging::{init_tracing, LogFormat};
use carlens_server::network::NetworkModule;
use carlens_server::service::QueryService;
use carlens_server::storage::StoreBackend;
use clap::{Parser, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    Mongo,
    Memory,
}

#[derive(Parser)]
#[command(name = "carlens-server", about = "Vehicle listing dashboard server")]
struct Cli {
    /// `MongoDB` connection string.
    #[arg(long, env = "CARLENS_MONGO_URI", default_value = "mongodb://localhost:27017/")]
    mongo_uri: String,

    #[arg(long, env = "CARLENS_DATABASE", default_value = "car_db")]
    database: String,

    #[arg(long, env = "CARLENS_COLLECTION", default_value = "cars_joined")]
    collection: String,

    #[arg(long, value_enum, env = "CARLENS_BACKEND", default_value = "mongo")]
    backend: Backend,

    /// JSON array of vehicle documents loaded into the memory backend.
    #[arg(long, env = "CARLENS_SEED")]
    seed: Option<PathBuf>,

    #[arg(long, env = "CARLENS_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "CARLENS_PORT", default_value_t = carlens_server::config::DEFAULT_PORT)]
    port: u16,

    /// Entries per query cache; 0 disables memoization.
    #[arg(long, env = "CARLENS_CACHE_CAPACITY", default_value_t = 256)]
    cache_capacity: usize,

    /// `text` or `json`.
    #[arg(long, env = "CARLENS_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Allowed CORS origin; repeat for several. Defaults to any.
    #[arg(long = "cors-origin", env = "CARLENS_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    #[arg(long, env = "CARLENS_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    #[arg(long, env = "CARLENS_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    connect_timeout_secs: u64,
}

impl Cli {
    fn into_config(self) -> AppConfig {
        let mut config = AppConfig::default();

        config.store.backend = match self.backend {
            Backend::Mongo => StoreBackend::Mongo,
            Backend::Memory => StoreBackend::Memory { seed: self.seed },
        };
        config.store.uri = self.mongo_uri;
        config.store.database = self.database;
        config.store.collection = self.collection;
        config.store.connect_timeout = Duration::from_secs(self.connect_timeout_secs);

        config.network.host = self.host;
        config.network.port = self.port;
        config.network.request_timeout = Duration::from_secs(self.request_timeout_secs);
        if !self.cors_origins.is_empty() {
            config.network.cors_origins = self.cors_origins;
        }

        config.service.cache_capacity = self.cache_capacity;
        config.log_format = self.log_format;
        config
    }
}

/// Clears every memoized query result on SIGHUP, e.g. after the collection
/// was reloaded out of band.
#[cfg(unix)]
fn spawn_cache_reset(service: Arc<QueryService>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(err) => {
            warn!(error = %err, "failed to register SIGHUP handler; cache reset disabled");
            return;
        }
    };
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("SIGHUP received, clearing query caches");
            service.clear_caches();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();
    init_tracing(config.log_format)?;

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, "metrics recorder not installed; /metrics disabled");
            None
        }
    };

    let store = match connect_store(&config.store).await {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "store unavailable at startup");
            eprintln!("carlens-server: {err}");
            std::process::exit(1);
        }
    };

    let service = Arc::new(QueryService::new(store, config.service.clone()));
    #[cfg(unix)]
    spawn_cache_reset(Arc::clone(&service));

    let mut module = NetworkModule::new(config.network.clone(), service);
    if let Some(handle) = metrics {
        module = module.with_metrics(handle);
    }

    let port = module.start().await?;
    info!(
        port,
        cache_capacity = config.service.cache_capacity,
        "carlens-server started, press Ctrl+C to stop"
    );

    module
        .serve(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for Ctrl+C");
            }
        })
        .await
}
