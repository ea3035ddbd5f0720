//! PostgreSQL adapters for the LifeLink ledgers.
//!
//! Each adapter implements one driven port on top of a shared [`DbPool`]
//! using `diesel-async`. Row structs and table definitions stay private to
//! this module; callers only see domain types and port errors.
//!
//! ```no_run
//! use lifelink::outbound::persistence::{
//!     DbPool, DieselInventoryRepository, PoolConfig, run_pending_migrations,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "postgres://lifelink@localhost/lifelink";
//! run_pending_migrations(url).await?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let inventory = DieselInventoryRepository::new(pool);
//! # let _ = inventory;
//! # Ok(())
//! # }
//! ```

mod diesel_blood_request_repository;
mod diesel_error_mapping;
mod diesel_inventory_repository;
mod diesel_member_repository;
mod migrations;
mod models;
mod pool;
mod schema;
mod unit_reservation;

pub use diesel_blood_request_repository::DieselBloodRequestRepository;
pub use diesel_inventory_repository::DieselInventoryRepository;
pub use diesel_member_repository::DieselMemberRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
