//! Outbound adapters implementing the domain's driven ports.
//!
//! - **memory**: mutex-guarded in-process store, used without a database
//! - **persistence**: PostgreSQL repositories using Diesel
//!
//! Adapters translate between domain types and storage representations and
//! hold no allocation logic of their own.

pub mod memory;
pub mod persistence;
