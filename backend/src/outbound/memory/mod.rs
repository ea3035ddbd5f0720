//! In-process store implementing every driven port.
//!
//! All state sits behind one mutex, so each port call, including a
//! [`BloodRequestRepository::commit`] that reserves units and writes a request,
//! is applied atomically. Used when no database is configured and by tests
//! that need realistic store semantics without PostgreSQL.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    BloodRequestRepository, BloodRequestRepositoryError, InventoryRepository,
    InventoryRepositoryError, MemberRepository, MemberRepositoryError, RequestWrite,
    WritePrecondition,
};
use crate::domain::{
    BloodGroup, BloodRequest, BloodUnit, Member, MemberValidationError, RequestId, RequestStatus,
    SmartId, UnitId, UnitStatus, demo_members,
};

#[derive(Debug, Default)]
struct MemoryState {
    units: Vec<BloodUnit>,
    requests: Vec<BloodRequest>,
    members: BTreeMap<SmartId, Member>,
}

/// Why a reservation could not be applied.
enum ReserveFailure {
    Missing(UnitId),
    Taken(UnitId),
}

impl MemoryState {
    /// Reserve every unit or none. The caller holds the lock.
    fn reserve(&mut self, unit_ids: &[UnitId], request_id: RequestId) -> Result<(), ReserveFailure> {
        let mut positions = Vec::with_capacity(unit_ids.len());
        for unit_id in unit_ids {
            let position = self
                .units
                .iter()
                .position(|unit| unit.id == *unit_id)
                .ok_or(ReserveFailure::Missing(*unit_id))?;
            let unit = &self.units[position];
            if !unit.status.can_transition_to(UnitStatus::Reserved) || positions.contains(&position)
            {
                return Err(ReserveFailure::Taken(*unit_id));
            }
            positions.push(position);
        }
        for position in positions {
            let unit = &mut self.units[position];
            unit.status = UnitStatus::Reserved;
            unit.reserved_for = Some(request_id);
        }
        Ok(())
    }

    fn newest_first(&self, keep: impl Fn(&BloodRequest) -> bool) -> Vec<BloodRequest> {
        let mut found: Vec<BloodRequest> = self
            .requests
            .iter()
            .rev()
            .filter(|request| keep(request))
            .cloned()
            .collect();
        // Stable sort keeps later insertions first among equal timestamps.
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

/// Mutex-guarded in-memory implementation of the inventory, request and
/// member stores.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with the demo members.
    pub fn with_demo_members(created_at: DateTime<Utc>) -> Result<Self, MemberValidationError> {
        let mut state = MemoryState::default();
        for member in demo_members(created_at)? {
            state.members.insert(member.smart_id.clone(), member);
        }
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, String> {
        self.state
            .lock()
            .map_err(|_| "memory store mutex poisoned".to_owned())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn add_units(&self, units: &[BloodUnit]) -> Result<(), InventoryRepositoryError> {
        let mut state = self.lock().map_err(InventoryRepositoryError::query)?;
        for (index, unit) in units.iter().enumerate() {
            let reissued = state
                .units
                .iter()
                .chain(&units[..index])
                .any(|existing| existing.tracking_code == unit.tracking_code);
            if reissued {
                return Err(InventoryRepositoryError::duplicate_tracking_code(
                    unit.tracking_code.as_str(),
                ));
            }
        }
        state.units.extend_from_slice(units);
        Ok(())
    }

    async fn list_units(&self) -> Result<Vec<BloodUnit>, InventoryRepositoryError> {
        let state = self.lock().map_err(InventoryRepositoryError::query)?;
        let mut units = state.units.clone();
        units.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(units)
    }

    async fn count_available(&self, group: &BloodGroup) -> Result<usize, InventoryRepositoryError> {
        let state = self.lock().map_err(InventoryRepositoryError::query)?;
        Ok(state
            .units
            .iter()
            .filter(|unit| unit.status == UnitStatus::Available && &unit.blood_group == group)
            .count())
    }

    async fn take_available(
        &self,
        group: &BloodGroup,
        limit: usize,
    ) -> Result<Vec<BloodUnit>, InventoryRepositoryError> {
        let state = self.lock().map_err(InventoryRepositoryError::query)?;
        let mut available: Vec<BloodUnit> = state
            .units
            .iter()
            .filter(|unit| unit.status == UnitStatus::Available && &unit.blood_group == group)
            .cloned()
            .collect();
        available.sort_by(|a, b| a.collection_date.cmp(&b.collection_date));
        available.truncate(limit);
        Ok(available)
    }

    async fn reserve(
        &self,
        unit_ids: &[UnitId],
        request_id: RequestId,
    ) -> Result<(), InventoryRepositoryError> {
        let mut state = self.lock().map_err(InventoryRepositoryError::query)?;
        state
            .reserve(unit_ids, request_id)
            .map_err(|failure| match failure {
                ReserveFailure::Missing(unit_id) => InventoryRepositoryError::not_found(unit_id),
                ReserveFailure::Taken(unit_id) => {
                    InventoryRepositoryError::reservation_conflict(unit_id)
                }
            })
    }

    async fn remove(&self, unit_id: UnitId) -> Result<(), InventoryRepositoryError> {
        let mut state = self.lock().map_err(InventoryRepositoryError::query)?;
        let position = state
            .units
            .iter()
            .position(|unit| unit.id == unit_id)
            .ok_or_else(|| InventoryRepositoryError::not_found(unit_id))?;
        state.units.remove(position);
        Ok(())
    }
}

#[async_trait]
impl BloodRequestRepository for MemoryStore {
    async fn find_by_id(
        &self,
        request_id: RequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError> {
        let state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        Ok(state
            .requests
            .iter()
            .find(|request| request.id == request_id)
            .cloned())
    }

    async fn list_by_requester(
        &self,
        requester: &SmartId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        Ok(state.newest_first(|request| &request.requester == requester))
    }

    async fn list_all(&self) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        Ok(state.newest_first(|_| true))
    }

    async fn list_broadcasts_for(
        &self,
        donor: &SmartId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        Ok(state.newest_first(|request| {
            request.status == RequestStatus::Pending && request.broadcast_to.contains(donor)
        }))
    }

    async fn list_pending_fifo(
        &self,
        group: &BloodGroup,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        let mut pending: Vec<BloodRequest> = state
            .requests
            .iter()
            .filter(|request| {
                request.status == RequestStatus::Pending && &request.blood_group == group
            })
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }

    async fn commit(&self, write: RequestWrite) -> Result<(), BloodRequestRepositoryError> {
        let mut state = self.lock().map_err(BloodRequestRepositoryError::query)?;
        let request_id = write.request.id;
        let stored = state
            .requests
            .iter()
            .position(|request| request.id == request_id);

        match (write.precondition, stored) {
            (WritePrecondition::Absent, Some(_)) => {
                return Err(BloodRequestRepositoryError::already_exists(request_id));
            }
            (WritePrecondition::Status(_), None) => {
                return Err(BloodRequestRepositoryError::not_found(request_id));
            }
            (WritePrecondition::Status(expected), Some(position)) => {
                let actual = state.requests[position].status;
                if actual != expected {
                    return Err(BloodRequestRepositoryError::stale_status(
                        request_id, expected, actual,
                    ));
                }
            }
            (WritePrecondition::Absent, None) => {}
        }

        state
            .reserve(&write.reserve, request_id)
            .map_err(|failure| match failure {
                ReserveFailure::Missing(unit_id) | ReserveFailure::Taken(unit_id) => {
                    BloodRequestRepositoryError::reservation_conflict(unit_id)
                }
            })?;

        match stored {
            Some(position) => state.requests[position] = write.request,
            None => state.requests.push(write.request),
        }
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn find_by_smart_id(
        &self,
        smart_id: &SmartId,
    ) -> Result<Option<Member>, MemberRepositoryError> {
        let state = self.lock().map_err(MemberRepositoryError::query)?;
        Ok(state.members.get(smart_id).cloned())
    }

    async fn list_donors_in_groups(
        &self,
        groups: &[BloodGroup],
    ) -> Result<Vec<Member>, MemberRepositoryError> {
        let state = self.lock().map_err(MemberRepositoryError::query)?;
        Ok(state
            .members
            .values()
            .filter(|member| member.donates_to_any(groups))
            .cloned()
            .collect())
    }

    async fn upsert(&self, member: &Member) -> Result<(), MemberRepositoryError> {
        let mut state = self.lock().map_err(MemberRepositoryError::query)?;
        state.members.insert(member.smart_id.clone(), member.clone());
        Ok(())
    }
}
