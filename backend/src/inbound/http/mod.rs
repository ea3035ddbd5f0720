//! HTTP inbound adapter exposing the ledger REST endpoints.
//!
//! Handlers translate JSON payloads into validated domain values, call the
//! driving ports held in [`state::HttpState`] and map domain errors onto
//! status codes in [`error`].

pub mod auth;
pub mod error;
pub mod health;
pub mod inventory;
pub mod requests;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
mod validation;

pub use error::ApiResult;
