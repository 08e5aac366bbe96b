//! Reusable booking service runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: storage selection, migrations,
//! service wiring, the REST API, the event log task and graceful shutdown.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::{
    create_event_bus, BookingService, CheckInVerifier, RefundGateway, RefundGatewayConfig,
    SharedEventBus,
};
use crate::config::AppConfig;
use crate::domain::BookingRepository;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{
    init_database, DatabaseConfig, InMemoryBookingRepository, SeaOrmBookingRepository,
};
use crate::interfaces::http::modules::metrics::describe_metrics;
use crate::interfaces::{create_api_router, ApiState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true)
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Handle to a running booking service.
///
/// ```rust,no_run
/// use hotel_booking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub bookings: Arc<BookingService>,
    pub event_bus: SharedEventBus,
    pub config: AppConfig,
    /// Port actually bound, which differs from the config when it asked for 0
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    event_log_task: JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        info!("Starting hotel booking service...");

        let prometheus = prometheus_handle()?;

        // ── Storage ────────────────────────────────────────────
        let (repo, db): (Arc<dyn BookingRepository>, Option<DatabaseConnection>) =
            if app_cfg.database.memory {
                warn!("Using in-memory booking store; data is lost on shutdown");
                (Arc::new(InMemoryBookingRepository::new()), None)
            } else {
                let db = init_database(&DatabaseConfig {
                    url: app_cfg.database.url.clone(),
                })
                .await?;
                if opts.auto_migrate {
                    info!("Running database migrations...");
                    Migrator::up(&db, None).await?;
                    info!("Migrations completed");
                }
                (Arc::new(SeaOrmBookingRepository::new(db.clone())), Some(db))
            };

        // ── Services ───────────────────────────────────────────
        let event_bus = create_event_bus();
        let bookings = Arc::new(
            BookingService::new(repo, event_bus.clone())
                .with_max_retries(app_cfg.booking.max_transition_retries)
                .with_currency(app_cfg.refunds.currency.clone()),
        );
        let checkin = Arc::new(CheckInVerifier::new(
            bookings.clone(),
            app_cfg.checkin.scan_history_limit,
        ));
        let refunds = Arc::new(RefundGateway::new(
            bookings.clone(),
            RefundGatewayConfig::from(&app_cfg.refunds),
        ));

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let event_log_task = spawn_event_log(&event_bus, shutdown.signal());

        // ── REST API ───────────────────────────────────────────
        let router = create_api_router(
            ApiState {
                bookings: bookings.clone(),
                checkin,
                refunds,
                db: db.clone(),
                storage: app_cfg.storage_backend(),
                started_at: Arc::new(Instant::now()),
            },
            Some(prometheus),
        );

        let api_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let bound = listener.local_addr()?;
        info!("REST API listening on http://{}", bound);
        info!("Swagger UI available at http://{}/docs/", bound);

        let api_shutdown = shutdown.signal();
        let api_server = axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API received shutdown signal");
            });
        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            bookings,
            event_bus,
            config: app_cfg,
            api_port: bound.port(),
            db,
            shutdown,
            api_task,
            event_log_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGTERM / Ctrl+C.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for in-flight requests to drain, bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let timeout = Duration::from_secs(self.shutdown.timeout_secs());
        match tokio::time::timeout(timeout, self.api_task).await {
            Ok(Ok(())) => info!("REST API stopped"),
            Ok(Err(e)) => error!("REST API task panicked: {}", e),
            Err(_) => warn!("REST API did not stop within {}s", timeout.as_secs()),
        }
        self.event_log_task.abort();

        if let Some(db) = self.db {
            match db.close().await {
                Ok(()) => info!("Database connection closed"),
                Err(e) => warn!("Error closing database connection: {}", e),
            }
        }
        info!("Hotel booking service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down hotel booking service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// The global recorder can only be installed once per process; restarts
/// within one process reuse it.
fn prometheus_handle() -> Result<PrometheusHandle, BuildError> {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    info!("Prometheus metrics recorder installed");
    Ok(HANDLE.get_or_init(|| handle).clone())
}

/// Structured log line per domain event until shutdown.
fn spawn_event_log(bus: &SharedEventBus, shutdown: ShutdownSignal) -> JoinHandle<()> {
    let mut subscriber = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                message = subscriber.recv() => match message {
                    Some(message) => debug!(
                        event_id = %message.id,
                        event_type = message.event.event_type(),
                        booking_id = message.event.booking_id(),
                        "Domain event"
                    ),
                    None => break,
                },
            }
        }
    })
}

/// Initialize tracing from the logging config. Call once, before
/// [`ServerHandle::start`]. `RUST_LOG` overrides `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::model::tests::new_event_booking;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 5;
        config.database.memory = true;
        config
    }

    #[tokio::test]
    async fn starts_and_stops_on_memory_store() {
        let handle = ServerHandle::start(ServerOptions {
            config: memory_config(),
            auto_migrate: false,
        })
        .await
        .unwrap();

        assert_ne!(handle.api_port, 0);
        assert!(handle.is_running());
        assert_eq!(handle.event_bus.subscriber_count(), 1);

        handle.bookings.register(new_event_booking("b1")).await.unwrap();
        assert_eq!(handle.bookings.get("b1").await.unwrap().id, "b1");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn sqlite_store_is_migrated_on_start() {
        let mut config = memory_config();
        config.database.memory = false;
        config.database.url = DatabaseConfig::in_memory().url;

        let handle = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: true,
        })
        .await
        .unwrap();

        handle.bookings.register(new_event_booking("b1")).await.unwrap();
        assert_eq!(handle.config.storage_backend(), "sqlite");

        handle.shutdown().await;
    }
}
