//! Builders wiring the ledger stores into HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use lifelink::domain::demo_members;
use lifelink::domain::ports::{FixtureLoginService, MemberRepository};
use lifelink::inbound::http::state::{HttpState, LedgerStores};
use lifelink::outbound::memory::MemoryStore;
use lifelink::outbound::persistence::{
    DieselBloodRequestRepository, DieselInventoryRepository, DieselMemberRepository,
};

use super::config::{LedgerBackend, ServerConfig};

/// Upsert the demo accounts through `members`.
async fn seed_demo_members<M: MemberRepository>(
    members: &M,
    clock: &dyn Clock,
) -> std::io::Result<()> {
    let accounts = demo_members(clock.utc())
        .map_err(|err| std::io::Error::other(format!("invalid demo member: {err}")))?;
    for member in &accounts {
        members
            .upsert(member)
            .await
            .map_err(|err| std::io::Error::other(format!("demo member seeding failed: {err}")))?;
    }
    info!(count = accounts.len(), "demo members seeded");
    Ok(())
}

/// Build handler state over the configured ledger backend.
///
/// # Errors
/// Returns [`std::io::Error`] when the demo accounts cannot be built or
/// seeded.
pub(super) async fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let login = Arc::new(FixtureLoginService);

    let state = match &config.backend {
        LedgerBackend::Memory => {
            warn!("no database configured; ledgers are held in memory and lost on restart");
            let store = MemoryStore::with_demo_members(clock.utc())
                .map_err(|err| std::io::Error::other(format!("invalid demo member: {err}")))?;
            let store = Arc::new(store);
            HttpState::from_stores(
                login,
                LedgerStores::shared(&store),
                clock,
                config.reservation_attempts,
            )
        }
        LedgerBackend::Database {
            pool,
            seed_demo_members: seed,
        } => {
            let members = Arc::new(DieselMemberRepository::new(pool.clone()));
            if *seed {
                seed_demo_members(members.as_ref(), clock.as_ref()).await?;
            }
            let stores = LedgerStores {
                inventory: Arc::new(DieselInventoryRepository::new(pool.clone())),
                requests: Arc::new(DieselBloodRequestRepository::new(pool.clone())),
                members,
            };
            HttpState::from_stores(login, stores, clock, config.reservation_attempts)
        }
    };
    Ok(web::Data::new(state))
}
