mod app;
mod cli;
mod error;
mod handlers;
mod model;
mod state;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use linkhop_cache::{MokaEdgeCache, RedisEdgeCache};
use linkhop_core::{EdgeCache, LinkStore};
use linkhop_generator::{AlphabetGenerator, AlphabetSettings, Generator, SeqGenerator};
use linkhop_redirector::{RecorderConfig, ResolverService};
use linkhop_shortener::{ShortenerConfig, ShortenerService};
use linkhop_storage::{InMemoryLinkStore, MySqlLinkStore};
use tracing::{error, info};

use crate::app::App;
use crate::cli::{CacheBackendArg, SlugGeneratorArg, StorageBackendArg, CLI};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    telemetry::init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        slug_generator = %config.slug_generator,
        "starting linkhop"
    );

    let (store, mysql) = build_store(&config).await?;
    let cache = build_cache(&config).await?;
    let generator = build_generator(&config)?;

    let recorder_config = RecorderConfig::builder()
        .max_in_flight(config.recorder_max_in_flight)
        .deadline(config.record_deadline())
        .build();
    let resolver = ResolverService::new(Arc::clone(&store), Arc::clone(&cache), recorder_config);
    let recorder = resolver.recorder().clone();

    let shortener_config = ShortenerConfig::builder()
        .max_attempts(config.slug_attempts)
        .stats_window(config.stats_window())
        .build();
    let shortener = ShortenerService::new(store, cache, generator, shortener_config);

    let router = App::router(AppState::new(Arc::new(resolver), Arc::new(shortener)));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("http server failed")?;

    info!("http server stopped");
    recorder.shutdown(config.shutdown_grace()).await;

    if let Some(mysql) = mysql {
        mysql.close().await;
    }
    info!("linkhop stopped");
    Ok(())
}

async fn build_store(
    config: &CLI,
) -> anyhow::Result<(Arc<dyn LinkStore>, Option<MySqlLinkStore>)> {
    match config.storage {
        StorageBackendArg::InMemory => {
            let store: Arc<dyn LinkStore> = Arc::new(InMemoryLinkStore::new());
            Ok((store, None))
        }
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlLinkStore::connect(dsn, config.mysql_max_connections)
                .await
                .context("failed to connect to mysql")?;
            store.migrate().await.context("failed to migrate mysql")?;
            let shared: Arc<dyn LinkStore> = Arc::new(store.clone());
            Ok((shared, Some(store)))
        }
    }
}

async fn build_cache(config: &CLI) -> anyhow::Result<Arc<dyn EdgeCache>> {
    match config.cache {
        CacheBackendArg::Moka => Ok(Arc::new(MokaEdgeCache::with_capacity(config.cache_capacity))),
        CacheBackendArg::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            let cache = RedisEdgeCache::connect(url)
                .await
                .context("failed to connect to redis")?;
            Ok(Arc::new(cache))
        }
    }
}

fn build_generator(config: &CLI) -> anyhow::Result<Arc<dyn Generator>> {
    match config.slug_generator {
        SlugGeneratorArg::Random => {
            let settings = AlphabetSettings::builder()
                .length(config.slug_length)
                .build();
            let generator =
                AlphabetGenerator::new(settings).context("invalid slug generator settings")?;
            Ok(Arc::new(generator))
        }
        SlugGeneratorArg::Sequential => {
            let generator = SeqGenerator::with_prefix(config.slug_prefix.clone())
                .context("invalid slug generator settings")?;
            Ok(Arc::new(generator))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
