//! Actix middleware shared by every ledger route.

pub mod trace;

pub use trace::Trace;
