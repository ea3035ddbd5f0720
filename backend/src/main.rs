//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context as _, Result};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use lifelink::inbound::http::health::HealthState;
use lifelink::inbound::http::session_config::{BuildMode, session_settings_from_env};
use lifelink::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use lifelink::settings::AppSettings;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        AppSettings::load_from_iter(std::env::args_os()).wrap_err("failed to load settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        key_fingerprint = %session.key_fingerprint(),
        "session signing key loaded"
    );

    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    )
    .with_reservation_attempts(settings.reservation_attempts());

    if let Some(url) = settings.database_url() {
        run_pending_migrations(url).await?;
        let pool = DbPool::new(
            PoolConfig::new(url).with_max_size(settings.db_max_connections()),
        )
        .await?;
        config = config.with_db_pool(pool, settings.seed_demo_members);
    }

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(server::prometheus_metrics()?));

    info!(address = %config.bind_addr(), "starting LifeLink backend");
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config).await?;
    server.await?;
    health_state.mark_unhealthy();
    Ok(())
}
