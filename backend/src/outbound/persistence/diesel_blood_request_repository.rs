//! PostgreSQL-backed Request Ledger adapter.
//!
//! A commit locks the stored request row, checks the write precondition,
//! reserves the listed units and writes the request inside one transaction.
//! Any failure rolls the whole write back.

use std::num::NonZeroU32;
use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    BloodRequestRepository, BloodRequestRepositoryError, RequestWrite, WritePrecondition,
};
use crate::domain::{
    BloodGroup, BloodRequest, Fulfiller, RequestId, RequestStatus, SmartId, UnitId, Urgency,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{BloodRequestRow, BloodRequestUpdate, NewBloodRequestRow};
use super::pool::{DbPool, PoolError};
use super::schema::blood_requests;
use super::unit_reservation::reserve_available;

/// Diesel implementation of [`BloodRequestRepository`].
#[derive(Clone)]
pub struct DieselBloodRequestRepository {
    pool: DbPool,
}

impl DieselBloodRequestRepository {
    /// Create an adapter over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(
        &self,
        filter: RequestFilter<'_>,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let mut query = blood_requests::table
            .select(BloodRequestRow::as_select())
            .into_boxed();
        query = match filter {
            RequestFilter::All => {
                query.order((blood_requests::created_at.desc(), blood_requests::seq.desc()))
            }
            RequestFilter::Requester(requester) => query
                .filter(blood_requests::requester.eq(requester.as_ref()))
                .order((blood_requests::created_at.desc(), blood_requests::seq.desc())),
            RequestFilter::BroadcastTo(donor) => query
                .filter(blood_requests::status.eq(RequestStatus::Pending.as_str()))
                .filter(blood_requests::broadcast_to.contains(vec![donor.to_string()]))
                .order((blood_requests::created_at.desc(), blood_requests::seq.desc())),
            RequestFilter::PendingFifo(group) => query
                .filter(blood_requests::status.eq(RequestStatus::Pending.as_str()))
                .filter(blood_requests::blood_group.eq(group.as_str()))
                .order((blood_requests::created_at.asc(), blood_requests::seq.asc())),
        };

        let rows: Vec<BloodRequestRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        rows.into_iter().map(row_to_request).collect()
    }
}

/// Listing shapes served by [`DieselBloodRequestRepository::load`].
enum RequestFilter<'a> {
    All,
    Requester(&'a SmartId),
    BroadcastTo(&'a SmartId),
    PendingFifo(&'a BloodGroup),
}

/// Reasons a commit transaction is rolled back.
#[derive(Debug)]
enum CommitAbort {
    Database(diesel::result::Error),
    AlreadyExists,
    NotFound,
    Stale {
        expected: RequestStatus,
        actual: RequestStatus,
    },
    Corrupt(String),
    ReservationLost(UnitId),
}

impl From<diesel::result::Error> for CommitAbort {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

fn pool_error(error: PoolError) -> BloodRequestRepositoryError {
    map_pool_error(error, BloodRequestRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> BloodRequestRepositoryError {
    map_diesel_error(
        error,
        BloodRequestRepositoryError::query,
        BloodRequestRepositoryError::connection,
    )
}

fn abort_to_error(request_id: RequestId, abort: CommitAbort) -> BloodRequestRepositoryError {
    match abort {
        CommitAbort::Database(error) => diesel_error(error),
        CommitAbort::AlreadyExists => BloodRequestRepositoryError::already_exists(request_id),
        CommitAbort::NotFound => BloodRequestRepositoryError::not_found(request_id),
        CommitAbort::Stale { expected, actual } => {
            BloodRequestRepositoryError::stale_status(request_id, expected, actual)
        }
        CommitAbort::Corrupt(message) => BloodRequestRepositoryError::query(message),
        CommitAbort::ReservationLost(unit_id) => {
            BloodRequestRepositoryError::reservation_conflict(unit_id)
        }
    }
}

fn corrupt(field: &str, detail: impl std::fmt::Display) -> BloodRequestRepositoryError {
    BloodRequestRepositoryError::query(format!("invalid {field} in database: {detail}"))
}

fn row_to_request(row: BloodRequestRow) -> Result<BloodRequest, BloodRequestRepositoryError> {
    let units_needed = u32::try_from(row.units_needed)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| corrupt("units_needed", row.units_needed))?;
    let broadcast_to = row
        .broadcast_to
        .iter()
        .map(SmartId::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| corrupt("broadcast recipient", err))?;

    Ok(BloodRequest {
        id: RequestId::from_uuid(row.id),
        requester: SmartId::new(&row.requester).map_err(|err| corrupt("requester", err))?,
        blood_group: BloodGroup::new(&row.blood_group)
            .map_err(|err| corrupt("blood group", err))?,
        units_needed,
        hospital_name: row.hospital_name,
        urgency: Urgency::from_str(&row.urgency).map_err(|err| corrupt("urgency", err))?,
        status: RequestStatus::from_str(&row.status).map_err(|err| corrupt("status", err))?,
        fulfilled_by: row.fulfilled_by.as_deref().map(Fulfiller::from_label),
        broadcast_to,
        created_at: row.created_at,
    })
}

fn broadcast_labels(request: &BloodRequest) -> Vec<String> {
    request.broadcast_to.iter().map(ToString::to_string).collect()
}

fn request_to_row(request: &BloodRequest) -> Result<NewBloodRequestRow<'_>, CommitAbort> {
    let units_needed = i32::try_from(request.units_needed.get())
        .map_err(|_| CommitAbort::Corrupt("units_needed exceeds column range".to_owned()))?;
    Ok(NewBloodRequestRow {
        id: *request.id.as_uuid(),
        requester: request.requester.as_ref(),
        blood_group: request.blood_group.as_str(),
        units_needed,
        hospital_name: request.hospital_name.as_deref(),
        urgency: request.urgency.as_str(),
        status: request.status.as_str(),
        fulfilled_by: request.fulfilled_by.as_ref().map(ToString::to_string),
        broadcast_to: broadcast_labels(request),
        created_at: request.created_at,
    })
}

fn request_to_update(request: &BloodRequest) -> BloodRequestUpdate<'_> {
    BloodRequestUpdate {
        status: request.status.as_str(),
        fulfilled_by: request.fulfilled_by.as_ref().map(ToString::to_string),
        broadcast_to: broadcast_labels(request),
    }
}

#[async_trait]
impl BloodRequestRepository for DieselBloodRequestRepository {
    async fn find_by_id(
        &self,
        request_id: RequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<BloodRequestRow> = blood_requests::table
            .filter(blood_requests::id.eq(request_id.as_uuid()))
            .select(BloodRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_request).transpose()
    }

    async fn list_by_requester(
        &self,
        requester: &SmartId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        self.load(RequestFilter::Requester(requester)).await
    }

    async fn list_all(&self) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        self.load(RequestFilter::All).await
    }

    async fn list_broadcasts_for(
        &self,
        donor: &SmartId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        self.load(RequestFilter::BroadcastTo(donor)).await
    }

    async fn list_pending_fifo(
        &self,
        group: &BloodGroup,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        self.load(RequestFilter::PendingFifo(group)).await
    }

    async fn commit(&self, write: RequestWrite) -> Result<(), BloodRequestRepositoryError> {
        let RequestWrite {
            request,
            precondition,
            reserve,
        } = write;
        let request_id = request.id;
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let outcome: Result<(), CommitAbort> = conn
            .transaction(|conn| {
                async move {
                    let stored: Option<String> = blood_requests::table
                        .filter(blood_requests::id.eq(request_id.as_uuid()))
                        .select(blood_requests::status)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;

                    match (precondition, stored) {
                        (WritePrecondition::Absent, Some(_)) => {
                            return Err(CommitAbort::AlreadyExists);
                        }
                        (WritePrecondition::Status(_), None) => return Err(CommitAbort::NotFound),
                        (WritePrecondition::Status(expected), Some(label)) => {
                            let actual = RequestStatus::from_str(&label)
                                .map_err(|err| CommitAbort::Corrupt(err.to_string()))?;
                            if actual != expected {
                                return Err(CommitAbort::Stale { expected, actual });
                            }
                        }
                        (WritePrecondition::Absent, None) => {}
                    }

                    if let Err(unit_id) = reserve_available(conn, &reserve, request_id).await? {
                        return Err(CommitAbort::ReservationLost(unit_id));
                    }

                    match precondition {
                        WritePrecondition::Absent => {
                            diesel::insert_into(blood_requests::table)
                                .values(&request_to_row(&request)?)
                                .execute(conn)
                                .await?;
                        }
                        WritePrecondition::Status(_) => {
                            diesel::update(
                                blood_requests::table
                                    .filter(blood_requests::id.eq(request_id.as_uuid())),
                            )
                            .set(&request_to_update(&request))
                            .execute(conn)
                            .await?;
                        }
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        outcome.map_err(|abort| {
            debug!(%request_id, ?abort, "request commit rolled back");
            abort_to_error(request_id, abort)
        })
    }
}
