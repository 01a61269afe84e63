use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{self, AppState};
use crate::cli::commands::ServeArgs;
use crate::config::{self, BountydConfig};
use crate::cve::CveMonitor;
use crate::db::Database;
use crate::errors::BountydError;
use crate::oracle::{self, AssessmentProvider};
use crate::platforms::{AlgoraClient, PlatformPoller, PolarClient};
use crate::triage::{spawn_admission_worker, AdmissionFilter, TriageQueue, TriageService};
use crate::webhook::SignatureVerifier;
use crate::worker::{BountyWorker, CommandProcessor};

pub async fn handle_serve(args: ServeArgs) -> Result<(), BountydError> {
    let config = match &args.config {
        Some(path) => config::parse_config(Path::new(path)).await?,
        None => BountydConfig::default(),
    };

    let host = args.host.unwrap_or_else(|| config.host());
    let port = args.port.unwrap_or_else(|| config.port());
    let db_path = args.db.unwrap_or_else(|| config.database_path());

    info!(host = %host, port, db = %db_path, "Starting bountyd");

    let db = Database::new(&db_path)?;
    let verifier = Arc::new(SignatureVerifier::new(config.github_secret()));

    let api_key = config.oracle_api_key().ok_or_else(|| {
        BountydError::Config(
            "No assessment API key configured (set oracle.api_key or the provider's env var)"
                .to_string(),
        )
    })?;
    let oracle: Arc<dyn AssessmentProvider> = Arc::from(oracle::create_provider(
        &config.oracle_provider(),
        &api_key,
        config.oracle_model().as_deref(),
        config.oracle_base_url().as_deref(),
    )?);

    let queue = TriageQueue::with_key(db.clone(), &config.queue_key());
    let filter = AdmissionFilter::new(oracle)
        .with_thresholds(config.min_confidence(), config.max_time_minutes())
        .with_timeout(config.oracle_timeout());
    let service = Arc::new(
        TriageService::new(db.clone(), queue.clone(), filter)
            .with_amount_limits(config.minimum_amount_cents(), config.maximum_amount_cents()),
    );

    let shutdown = CancellationToken::new();
    let (dispatcher, admission_handle) = spawn_admission_worker(
        service.clone(),
        config.dispatch_capacity(),
        config.ack_deadline(),
        shutdown.clone(),
    );

    let mut background = Vec::new();

    if config.worker_enabled() {
        match config.worker_command() {
            Some(command) => {
                let worker = BountyWorker::new(
                    db.clone(),
                    queue.clone(),
                    Arc::new(CommandProcessor::new(&command)),
                )
                .with_poll_interval(config.worker_poll_interval());
                let token = shutdown.clone();
                background.push(tokio::spawn(async move { worker.run(token).await }));
            }
            None => {
                info!("No worker command configured; queue is left for an external consumer")
            }
        }
    }

    if config.polling_enabled() {
        let mut algora = AlgoraClient::new(&config.algora_api_url());
        if let Some(key) = config.algora_api_key() {
            algora = algora.with_api_key(&key);
        }
        let mut polar = PolarClient::new(&config.polar_api_url());
        if let Some(key) = config.polar_api_key() {
            polar = polar.with_api_key(&key);
        }
        let poller = PlatformPoller::new(algora, polar, service.clone())
            .with_interval(config.polling_interval())
            .with_initial_delay(config.polling_initial_delay());
        let token = shutdown.clone();
        background.push(tokio::spawn(async move { poller.run(token).await }));
    }

    let state = AppState {
        db: db.clone(),
        verifier,
        dispatcher,
        cve_monitor: Arc::new(CveMonitor::new(db)),
        queue,
    };
    let app = api::build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| BountydError::Internal(format!("Server error: {}", e)))?;

    info!("Shutting down background tasks");
    shutdown.cancel();
    admission_handle.await.ok();
    for handle in background {
        handle.await.ok();
    }

    Ok(())
}
