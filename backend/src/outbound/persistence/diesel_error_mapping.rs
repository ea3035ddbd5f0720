//! Diesel and pool error translation shared by the ledger adapters.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure through the port's connection constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    connection(error.into_message())
}

/// Map a Diesel failure through the port's query and connection constructors.
///
/// Only a closed connection counts as a connection failure; everything else,
/// constraint violations included, is a query failure.
pub(crate) fn map_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(%error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        _ => query("database error"),
    }
}

/// Details of a unique constraint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniqueViolation {
    pub constraint: Option<String>,
    pub value: Option<String>,
}

/// Recognise a unique constraint violation.
pub(crate) fn unique_violation(error: &DieselError) -> Option<UniqueViolation> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
                value: info.details().and_then(conflicting_value),
            })
        }
        _ => None,
    }
}

/// Pull the offending value out of PostgreSQL's
/// `Key (column)=(value) already exists.` detail line.
fn conflicting_value(detail: &str) -> Option<String> {
    let (_, rest) = detail.split_once(")=(")?;
    let (value, _) = rest.rsplit_once(") already exists")?;
    Some(value.to_owned())
}
