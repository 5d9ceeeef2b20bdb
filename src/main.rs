use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use racefinder::{
    application::{
        error::AppError,
        races::{Aggregator, RaceService},
    },
    cache::{CacheConfig, MemoryRaceCache, RaceCache},
    config::{self, ScrapeArgs, Settings},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        scrape::{FetchPolicy, HttpPageFetcher},
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Scrape(args) => run_scrape(settings, args).await,
    }
}

fn build_race_service(settings: &Settings) -> Result<Arc<RaceService>, AppError> {
    let fetcher = HttpPageFetcher::new(FetchPolicy::from(&settings.scrape))?;
    let aggregator = Aggregator::new(
        Arc::new(fetcher),
        settings.sources.clone(),
        settings.scrape.result_ceiling,
    );
    let cache: Arc<dyn RaceCache> = Arc::new(MemoryRaceCache::new());

    Ok(Arc::new(RaceService::new(
        aggregator,
        cache,
        CacheConfig::from(&settings.cache),
        settings.scrape.timezone,
    )))
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let races = build_race_service(&settings)?;
    let router = http::build_router(HttpState { races });

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target: "racefinder::serve",
        addr = %settings.server.addr,
        sources = settings.sources.len(),
        cache_ttl_secs = settings.cache.ttl.as_secs(),
        "Listening for race queries"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = drain_deadline(signalled_rx, settings.server.graceful_shutdown) => {
            warn!(
                target: "racefinder::serve",
                grace_secs = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target: "racefinder::serve", "Server stopped");
    Ok(())
}

/// Resolves `grace` after shutdown starts; never resolves if it does not.
async fn drain_deadline(signalled: oneshot::Receiver<()>, grace: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!(target: "racefinder::serve", "Shutdown signal received");
}

async fn run_scrape(settings: Settings, args: ScrapeArgs) -> Result<(), AppError> {
    let races = build_race_service(&settings)?.aggregate().await?;

    info!(
        target: "racefinder::scrape",
        races = races.len(),
        "One-shot aggregation finished"
    );

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&races)
    } else {
        serde_json::to_string(&races)
    }
    .map_err(|err| AppError::unexpected(format!("failed to encode races: {err}")))?;

    println!("{rendered}");
    Ok(())
}
