//! PostgreSQL-backed Inventory Ledger adapter.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{InventoryRepository, InventoryRepositoryError};
use crate::domain::{
    BloodGroup, BloodUnit, ComponentType, RequestId, TrackingCode, UnitId, UnitStatus,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{BloodUnitRow, NewBloodUnitRow};
use super::pool::DbPool;
use super::schema::blood_units;
use super::unit_reservation::reserve_available;

const TRACKING_CODE_CONSTRAINT: &str = "blood_units_tracking_code_key";

/// Diesel implementation of [`InventoryRepository`].
#[derive(Clone)]
pub struct DieselInventoryRepository {
    pool: DbPool,
}

impl DieselInventoryRepository {
    /// Create an adapter over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: super::pool::PoolError) -> InventoryRepositoryError {
    map_pool_error(error, InventoryRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> InventoryRepositoryError {
    if let Some(violation) = unique_violation(&error)
        && violation.constraint.as_deref() == Some(TRACKING_CODE_CONSTRAINT)
    {
        return InventoryRepositoryError::duplicate_tracking_code(
            violation.value.unwrap_or_default(),
        );
    }
    map_diesel_error(
        error,
        InventoryRepositoryError::query,
        InventoryRepositoryError::connection,
    )
}

/// Failures that abort the reservation transaction.
enum ReserveAbort {
    Database(diesel::result::Error),
    Missing(UnitId),
    Taken(UnitId),
}

impl From<diesel::result::Error> for ReserveAbort {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

fn row_to_unit(row: BloodUnitRow) -> Result<BloodUnit, InventoryRepositoryError> {
    let blood_group = BloodGroup::new(&row.blood_group).map_err(|err| {
        InventoryRepositoryError::query(format!("invalid blood group in database: {err}"))
    })?;
    let status = UnitStatus::from_str(&row.status).map_err(|err| {
        InventoryRepositoryError::query(format!("invalid unit status in database: {err}"))
    })?;
    Ok(BloodUnit {
        id: UnitId::from_uuid(row.id),
        tracking_code: TrackingCode::from_stored(row.tracking_code),
        component_type: ComponentType::new_or_default(Some(&row.component_type)),
        blood_group,
        collection_date: row.collection_date,
        expiry_date: row.expiry_date,
        status,
        institution: row.institution,
        reserved_for: row.reserved_for.map(RequestId::from_uuid),
        created_at: row.created_at,
    })
}

fn unit_to_row(unit: &BloodUnit) -> NewBloodUnitRow<'_> {
    NewBloodUnitRow {
        id: *unit.id.as_uuid(),
        tracking_code: unit.tracking_code.as_str(),
        component_type: unit.component_type.as_str(),
        blood_group: unit.blood_group.as_str(),
        collection_date: unit.collection_date,
        expiry_date: unit.expiry_date,
        status: unit.status.as_str(),
        institution: unit.institution.as_str(),
        reserved_for: unit.reserved_for.map(|request_id| *request_id.as_uuid()),
        created_at: unit.created_at,
    }
}

#[async_trait]
impl InventoryRepository for DieselInventoryRepository {
    async fn add_units(&self, units: &[BloodUnit]) -> Result<(), InventoryRepositoryError> {
        if units.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewBloodUnitRow<'_>> = units.iter().map(unit_to_row).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::insert_into(blood_units::table)
            .values(&rows)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn list_units(&self) -> Result<Vec<BloodUnit>, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<BloodUnitRow> = blood_units::table
            .order((blood_units::created_at.asc(), blood_units::id.asc()))
            .select(BloodUnitRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(row_to_unit).collect()
    }

    async fn count_available(&self, group: &BloodGroup) -> Result<usize, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let count: i64 = blood_units::table
            .filter(blood_units::blood_group.eq(group.as_str()))
            .filter(blood_units::status.eq(UnitStatus::Available.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        usize::try_from(count)
            .map_err(|_| InventoryRepositoryError::query("negative unit count"))
    }

    async fn take_available(
        &self,
        group: &BloodGroup,
        limit: usize,
    ) -> Result<Vec<BloodUnit>, InventoryRepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<BloodUnitRow> = blood_units::table
            .filter(blood_units::blood_group.eq(group.as_str()))
            .filter(blood_units::status.eq(UnitStatus::Available.as_str()))
            .order((blood_units::collection_date.asc(), blood_units::id.asc()))
            .limit(limit)
            .select(BloodUnitRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(row_to_unit).collect()
    }

    async fn reserve(
        &self,
        unit_ids: &[UnitId],
        request_id: RequestId,
    ) -> Result<(), InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let outcome: Result<(), ReserveAbort> = conn
            .transaction(|conn| {
                async move {
                    let Err(lost) = reserve_available(conn, unit_ids, request_id).await? else {
                        return Ok(());
                    };
                    let exists: bool = diesel::select(diesel::dsl::exists(
                        blood_units::table.filter(blood_units::id.eq(lost.as_uuid())),
                    ))
                    .get_result(conn)
                    .await?;
                    Err(if exists {
                        ReserveAbort::Taken(lost)
                    } else {
                        ReserveAbort::Missing(lost)
                    })
                }
                .scope_boxed()
            })
            .await;

        match outcome {
            Ok(()) => Ok(()),
            Err(ReserveAbort::Taken(unit_id)) => {
                debug!(%unit_id, %request_id, "reservation lost to a concurrent writer");
                Err(InventoryRepositoryError::reservation_conflict(unit_id))
            }
            Err(ReserveAbort::Missing(unit_id)) => Err(InventoryRepositoryError::not_found(unit_id)),
            Err(ReserveAbort::Database(error)) => Err(diesel_error(error)),
        }
    }

    async fn remove(&self, unit_id: UnitId) -> Result<(), InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let deleted = diesel::delete(blood_units::table.filter(blood_units::id.eq(unit_id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if deleted == 0 {
            return Err(InventoryRepositoryError::not_found(unit_id));
        }
        Ok(())
    }
}
