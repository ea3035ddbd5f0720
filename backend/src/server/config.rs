//! HTTP server configuration object and helpers.

use actix_web::cookie::{Key, SameSite};
use lifelink::domain::DEFAULT_RESERVATION_ATTEMPTS;
use lifelink::outbound::persistence::DbPool;
use std::net::SocketAddr;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Where the ledgers are kept.
pub enum LedgerBackend {
    /// Process-local store seeded with the demo accounts.
    Memory,
    /// PostgreSQL through the Diesel adapters.
    Database {
        pool: DbPool,
        seed_demo_members: bool,
    },
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) backend: LedgerBackend,
    pub(crate) reservation_attempts: usize,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a configuration over the in-memory store.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            backend: LedgerBackend::Memory,
            reservation_attempts: DEFAULT_RESERVATION_ATTEMPTS,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Keep the ledgers in PostgreSQL, optionally upserting the demo accounts.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool, seed_demo_members: bool) -> Self {
        self.backend = LedgerBackend::Database {
            pool,
            seed_demo_members,
        };
        self
    }

    /// Bound the allocation retry loop.
    #[must_use]
    pub fn with_reservation_attempts(mut self, attempts: usize) -> Self {
        self.reservation_attempts = attempts.max(1);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
