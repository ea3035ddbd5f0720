//! LifeLink blood bank allocation backend.
//!
//! The [`domain`] module owns the inventory and request ledgers and the
//! allocation rules; [`inbound`] adapts them to HTTP and [`outbound`] to
//! PostgreSQL or an in-process store.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
