use polycopy::api::router::create_router;
use polycopy::config::AppConfig;
use polycopy::engine::ledger;
use polycopy::services::expiry_sweeper::run_expiry_sweeper;
use polycopy::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.log_format);

    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connected, migrations applied");

    let metrics_handle = metrics::init_metrics()?;
    let open = ledger::sync_open_positions_gauge(&db).await?;
    tracing::info!(open_positions = open, "Metrics recorder installed");

    // --- Optional expiry sweep for pending decisions that never executed ---
    if config.expiry_sweep_enabled {
        let sweeper_db = db.clone();
        let horizon = config.expiry_horizon_secs;
        let every = config.expiry_sweep_interval_secs;
        tokio::spawn(async move {
            run_expiry_sweeper(sweeper_db, horizon, every).await;
        });
    } else {
        tracing::info!("Expiry sweeper disabled (EXPIRY_SWEEP_ENABLED=false)");
    }

    if !config.has_api_token() {
        tracing::warn!("API_TOKEN not set: internal decision routes are unauthenticated");
    }

    let state = AppState {
        db,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(log_format: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("polycopy=info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);
    if log_format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
