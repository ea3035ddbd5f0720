//! PostgreSQL-backed member directory adapter.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MemberRepository, MemberRepositoryError};
use crate::domain::{BloodGroup, DisplayName, Member, Role, SmartId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{MemberRow, NewMemberRow};
use super::pool::{DbPool, PoolError};
use super::schema::members;

/// Diesel implementation of [`MemberRepository`].
#[derive(Clone)]
pub struct DieselMemberRepository {
    pool: DbPool,
}

impl DieselMemberRepository {
    /// Create an adapter over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> MemberRepositoryError {
    map_pool_error(error, MemberRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> MemberRepositoryError {
    map_diesel_error(
        error,
        MemberRepositoryError::query,
        MemberRepositoryError::connection,
    )
}

fn invalid(err: impl std::fmt::Display) -> MemberRepositoryError {
    MemberRepositoryError::query(format!("invalid member row: {err}"))
}

fn row_to_member(row: MemberRow) -> Result<Member, MemberRepositoryError> {
    Ok(Member {
        smart_id: SmartId::new(&row.smart_id).map_err(invalid)?,
        display_name: DisplayName::new(row.display_name).map_err(invalid)?,
        role: Role::from_str(&row.role).map_err(invalid)?,
        blood_group: row
            .blood_group
            .map(BloodGroup::new)
            .transpose()
            .map_err(invalid)?,
        deferral_until: row.deferral_until,
        created_at: row.created_at,
    })
}

#[async_trait]
impl MemberRepository for DieselMemberRepository {
    async fn find_by_smart_id(
        &self,
        smart_id: &SmartId,
    ) -> Result<Option<Member>, MemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<MemberRow> = members::table
            .filter(members::smart_id.eq(smart_id.as_ref()))
            .select(MemberRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_member).transpose()
    }

    async fn list_donors_in_groups(
        &self,
        groups: &[BloodGroup],
    ) -> Result<Vec<Member>, MemberRepositoryError> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        let labels: Vec<&str> = groups.iter().map(BloodGroup::as_str).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<MemberRow> = members::table
            .filter(members::role.eq(Role::Donor.as_str()))
            .filter(members::blood_group.eq_any(labels))
            .order(members::smart_id.asc())
            .select(MemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(row_to_member).collect()
    }

    async fn upsert(&self, member: &Member) -> Result<(), MemberRepositoryError> {
        let row = NewMemberRow {
            smart_id: member.smart_id.as_ref(),
            display_name: member.display_name.as_ref(),
            role: member.role.as_str(),
            blood_group: member.blood_group.as_ref().map(BloodGroup::as_str),
            deferral_until: member.deferral_until,
            created_at: member.created_at,
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::insert_into(members::table)
            .values(&row)
            .on_conflict(members::smart_id)
            .do_update()
            .set((
                members::display_name.eq(excluded(members::display_name)),
                members::role.eq(excluded(members::role)),
                members::blood_group.eq(excluded(members::blood_group)),
                members::deferral_until.eq(excluded(members::deferral_until)),
            ))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }
}
