//! Compare-and-set reservation of blood units inside a caller's transaction.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::{RequestId, UnitId, UnitStatus};

use super::schema::blood_units;

/// Flip every listed unit from `Available` to `Reserved` for `request_id`.
///
/// Units that were no longer `Available` are left alone; the first of them is
/// returned in the inner `Err` so the caller can roll its transaction back.
pub(crate) async fn reserve_available(
    conn: &mut AsyncPgConnection,
    unit_ids: &[UnitId],
    request_id: RequestId,
) -> QueryResult<Result<(), UnitId>> {
    if unit_ids.is_empty() {
        return Ok(Ok(()));
    }
    let ids: Vec<Uuid> = unit_ids.iter().map(|unit_id| *unit_id.as_uuid()).collect();

    let mut reserved: Vec<Uuid> = diesel::update(
        blood_units::table
            .filter(blood_units::id.eq_any(&ids))
            .filter(blood_units::status.eq(UnitStatus::Available.as_str())),
    )
    .set((
        blood_units::status.eq(UnitStatus::Reserved.as_str()),
        blood_units::reserved_for.eq(Some(*request_id.as_uuid())),
    ))
    .returning(blood_units::id)
    .get_results(conn)
    .await?;

    // Each requested id must consume one reserved row; repeats count as lost.
    for unit_id in unit_ids {
        match reserved.iter().position(|id| id == unit_id.as_uuid()) {
            Some(position) => {
                reserved.swap_remove(position);
            }
            None => return Ok(Err(*unit_id)),
        }
    }
    Ok(Ok(()))
}
