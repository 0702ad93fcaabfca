use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use seatwatch_alert::{AlertEvaluator, BatchOrchestrator, FixedIntervalPacer, NotificationGate};
use seatwatch_store::app_config::Config;
use seatwatch_store::{DbClient, EventProducer, HttpAvailabilitySource, KafkaAlertSender, PostgresUserStore, PostgresWatchStore};
use seatwatch_worker::{app, scheduler, AlertMetrics, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "seatwatch_worker=debug,seatwatch_alert=debug,seatwatch_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Seatwatch worker on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    // Kafka
    let producer = EventProducer::new(&config.kafka.brokers).context("Failed to create Kafka producer")?;

    let availability = HttpAvailabilitySource::new(&config.availability.base_url, config.availability.timeout())
        .context("Failed to build availability client")?;

    let alerts = &config.alerts;
    let orchestrator = BatchOrchestrator::new(
        Arc::new(PostgresWatchStore::new(db.pool.clone(), alerts.lookahead())),
        Arc::new(PostgresUserStore::new(db.pool.clone())),
        Arc::new(KafkaAlertSender::new(producer, config.kafka.alert_topic.clone())),
        Arc::new(availability),
    )
    .with_evaluator(AlertEvaluator::new(alerts.assumed_capacity))
    .with_gate(NotificationGate::new(alerts.cooldown(), alerts.urgency_window()))
    .with_pacer(Arc::new(FixedIntervalPacer::new(alerts.group_pacing())))
    .with_history_limit(alerts.trigger_history_limit);

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        metrics: AlertMetrics::new().context("Failed to register metrics")?,
    };

    tokio::spawn(scheduler::start_scheduler(
        state.clone(),
        config.scheduler.interval(),
        config.scheduler.run_on_start,
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
