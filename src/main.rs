//! entitlement-sync server binary.
//!
//! Loads configuration, wires adapters into the webhook pipeline and the
//! entitlement gate, and serves the HTTP API until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use entitlement_sync::adapters::http::{app_router, EntitlementAppState};
use entitlement_sync::adapters::{
    InMemoryEntitlementRepository, InMemoryWebhookEventRepository, PostgresEntitlementRepository,
    PostgresWebhookEventRepository, StripeBillingProvider, StripeConfig,
};
use entitlement_sync::application::{
    EntitlementGate, EntitlementWebhookDispatcher, GetEntitlementHandler,
    HandleBillingWebhookHandler, ProvisionCompanyHandler, PruneWebhookEventsCommand,
    PruneWebhookEventsHandler, RemoveCompanyHandler,
};
use entitlement_sync::config::AppConfig;
use entitlement_sync::domain::billing::BillingWebhookVerifier;
use entitlement_sync::ports::{EntitlementRepository, WebhookEventRepository};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let trial = config.trial.window()?;
    tracing::info!(
        environment = ?config.server.environment,
        trial_start = %trial.start().as_datetime(),
        trial_end = %trial.end().as_datetime(),
        enforce_gate = config.features.enforce_entitlement_gate,
        stripe_test_mode = config.billing.is_test_mode(),
        "Starting entitlement-sync"
    );

    let (entitlements, webhook_events) = build_stores(&config).await?;

    let billing_provider = Arc::new(StripeBillingProvider::new(
        StripeConfig::new(config.billing.api_key.clone())
            .with_base_url(config.billing.api_base_url.clone())
            .with_timeout(config.billing.request_timeout())
            .with_retry_backoff(config.billing.retry_backoff()),
    )?);

    let verifier = BillingWebhookVerifier::new(config.billing.webhook_secret.clone())
        .with_tolerance(
            config.billing.signature_tolerance_secs,
            config.billing.clock_skew_secs,
        );
    let dispatcher = Arc::new(EntitlementWebhookDispatcher::new(
        entitlements.clone(),
        billing_provider.clone(),
    ));

    if config.server.admin_token.is_none() {
        tracing::warn!("No admin token configured; provisioning routes reject every request");
    }

    let state = EntitlementAppState {
        webhook_handler: Arc::new(HandleBillingWebhookHandler::new(
            verifier,
            webhook_events.clone(),
            dispatcher,
        )),
        entitlement_query: Arc::new(GetEntitlementHandler::new(entitlements.clone(), trial)),
        checker: Arc::new(EntitlementGate::new(
            entitlements.clone(),
            trial,
            config.features.enforce_entitlement_gate,
        )),
        provision_handler: Arc::new(ProvisionCompanyHandler::new(
            entitlements.clone(),
            billing_provider,
        )),
        remove_handler: Arc::new(RemoveCompanyHandler::new(entitlements)),
        admin_token: config.server.admin_token.clone().map(Arc::new),
    };

    spawn_webhook_pruner(
        webhook_events,
        config.billing.webhook_retention_days,
        config.billing.prune_interval(),
    );

    let app = app_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn EntitlementRepository>, Arc<dyn WebhookEventRepository>), BoxError> {
    if config.features.in_memory_store {
        tracing::warn!("Using in-memory stores; state is lost on restart");
        return Ok((
            Arc::new(InMemoryEntitlementRepository::new()),
            Arc::new(InMemoryWebhookEventRepository::new()),
        ));
    }

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok((
        Arc::new(PostgresEntitlementRepository::new(pool.clone())),
        Arc::new(PostgresWebhookEventRepository::new(pool)),
    ))
}

fn spawn_webhook_pruner(
    webhook_events: Arc<dyn WebhookEventRepository>,
    retention_days: i64,
    interval: Duration,
) {
    let handler = PruneWebhookEventsHandler::new(webhook_events);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match handler
                .handle(PruneWebhookEventsCommand { retention_days })
                .await
            {
                Ok(deleted) => tracing::debug!(deleted, "Pruned processed webhook events"),
                Err(e) => tracing::warn!(error = %e, "Failed to prune webhook events"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
