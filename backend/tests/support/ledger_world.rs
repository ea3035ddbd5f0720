//! Shared world for the ledger behaviour suites.
//!
//! Scenarios drive the services through the same driving ports the HTTP
//! handlers use, over the in-memory store seeded with the demo accounts.

use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use lifelink::domain::ports::{
    AddUnitsRequest, BloodRequestCommand, BloodRequestRepository, FixtureLoginService,
    InventoryCommand, InventoryRepository, InventoryRepositoryError,
};
use lifelink::domain::{
    BloodGroup, BloodRequest, BloodUnit, ComponentType, Error, NewBloodRequest, RequestId,
    SmartId, StockAddition, UnitId, UnitStatus, Urgency,
};
use lifelink::inbound::http::state::{HttpState, LedgerStores};
use lifelink::outbound::memory::MemoryStore;
use mockable::{Clock, MockClock};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::Barrier;

pub(crate) const BLOODBANK: &str = "bloodbank@lifelink.com";
pub(crate) const PATIENT: &str = "patient@lifelink.com";
pub(crate) const HOSPITAL: &str = "hospital@lifelink.com";
pub(crate) const O_NEGATIVE_DONOR: &str = "donor.onegative@lifelink.com";

const RESERVATION_ATTEMPTS: usize = 3;
const INSTITUTION: &str = "Central Blood Bank";

/// Inventory wrapper that holds the first two stock reads at a barrier, so
/// both allocations see the same units before either commits.
pub(crate) struct InterleavedInventory {
    inner: Arc<MemoryStore>,
    barrier: Barrier,
    gated_reads: AtomicUsize,
}

impl InterleavedInventory {
    fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            barrier: Barrier::new(2),
            gated_reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl InventoryRepository for InterleavedInventory {
    async fn add_units(&self, units: &[BloodUnit]) -> Result<(), InventoryRepositoryError> {
        self.inner.add_units(units).await
    }

    async fn list_units(&self) -> Result<Vec<BloodUnit>, InventoryRepositoryError> {
        self.inner.list_units().await
    }

    async fn count_available(&self, group: &BloodGroup) -> Result<usize, InventoryRepositoryError> {
        self.inner.count_available(group).await
    }

    async fn take_available(
        &self,
        group: &BloodGroup,
        limit: usize,
    ) -> Result<Vec<BloodUnit>, InventoryRepositoryError> {
        let units = self.inner.take_available(group, limit).await?;
        if self.gated_reads.fetch_add(1, Ordering::SeqCst) < 2 {
            self.barrier.wait().await;
        }
        Ok(units)
    }

    async fn reserve(
        &self,
        unit_ids: &[UnitId],
        request_id: RequestId,
    ) -> Result<(), InventoryRepositoryError> {
        self.inner.reserve(unit_ids, request_id).await
    }

    async fn remove(&self, unit_id: UnitId) -> Result<(), InventoryRepositoryError> {
        self.inner.remove(unit_id).await
    }
}

/// Clock advancing one second per reading so FIFO order is unambiguous.
fn stepping_clock() -> Arc<dyn Clock> {
    let start = Utc::now();
    let ticks = AtomicI64::new(0);
    let mut clock = MockClock::new();
    clock
        .expect_utc()
        .returning(move || start + Duration::seconds(ticks.fetch_add(1, Ordering::SeqCst)));
    Arc::new(clock)
}

pub(crate) fn group(raw: &str) -> BloodGroup {
    BloodGroup::new(raw).expect("valid blood group")
}

pub(crate) fn smart_id(raw: &str) -> SmartId {
    SmartId::new(raw).expect("valid smart id")
}

pub(crate) struct LedgerWorld {
    runtime: Runtime,
    store: Arc<MemoryStore>,
    state: RefCell<HttpState>,
    labels: RefCell<HashMap<String, RequestId>>,
    current: RefCell<Option<RequestId>>,
    last_error: RefCell<Option<Error>>,
}

impl LedgerWorld {
    pub(crate) fn new() -> Self {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("create runtime");
        let store =
            Arc::new(MemoryStore::with_demo_members(Utc::now()).expect("valid demo members"));
        let state = HttpState::from_stores(
            Arc::new(FixtureLoginService),
            LedgerStores::shared(&store),
            stepping_clock(),
            RESERVATION_ATTEMPTS,
        );
        Self {
            runtime,
            store,
            state: RefCell::new(state),
            labels: RefCell::new(HashMap::new()),
            current: RefCell::new(None),
            last_error: RefCell::new(None),
        }
    }

    /// Route stock reads through [`InterleavedInventory`].
    pub(crate) fn interleave_stock_reads(&self) {
        let stores = LedgerStores {
            inventory: Arc::new(InterleavedInventory::new(Arc::clone(&self.store))),
            requests: Arc::clone(&self.store),
            members: Arc::clone(&self.store),
        };
        *self.state.borrow_mut() = HttpState::from_stores(
            Arc::new(FixtureLoginService),
            stores,
            stepping_clock(),
            RESERVATION_ATTEMPTS,
        );
    }

    /// Record units straight into the store, bypassing reconciliation.
    pub(crate) fn hold_stock(&self, count: u32, blood_group: &str) {
        let units = StockAddition {
            blood_group: group(blood_group),
            component_type: ComponentType::new_or_default(None),
            quantity: count,
            collection_date: None,
            institution: INSTITUTION.to_owned(),
        }
        .into_units(Utc::now(), &mut rand::thread_rng());
        self.runtime
            .block_on(self.store.add_units(&units))
            .expect("store units");
    }

    /// Add stock through the inventory service, which reconciles afterwards.
    pub(crate) fn restock(&self, count: u32, blood_group: &str) {
        let inventory = Arc::clone(&self.state.borrow().inventory);
        let request = AddUnitsRequest {
            caller: smart_id(BLOODBANK),
            blood_group: group(blood_group),
            component_type: ComponentType::new_or_default(None),
            quantity: count,
            collection_date: None,
        };
        self.runtime
            .block_on(inventory.add_units(request))
            .expect("add units");
    }

    fn submission(requester: &str, count: u32, blood_group: &str) -> NewBloodRequest {
        NewBloodRequest {
            requester: smart_id(requester),
            blood_group: group(blood_group),
            units_needed: NonZeroU32::new(count).expect("positive unit count"),
            hospital_name: None,
            urgency: Urgency::Standard,
        }
    }

    /// Submit a request and remember it under `label`.
    pub(crate) fn submit(&self, label: &str, requester: &str, count: u32, blood_group: &str) {
        let requests = Arc::clone(&self.state.borrow().requests);
        let created = self
            .runtime
            .block_on(requests.create(Self::submission(requester, count, blood_group)))
            .expect("request accepted");
        self.labels.borrow_mut().insert(label.to_owned(), created.id);
        *self.current.borrow_mut() = Some(created.id);
    }

    /// Submit two requests at once and label them `first` and `second`.
    pub(crate) fn submit_concurrently(&self, count: u32, blood_group: &str) {
        let requests = Arc::clone(&self.state.borrow().requests);
        let (first, second) = self.runtime.block_on(async {
            let first = tokio::spawn({
                let requests = Arc::clone(&requests);
                let submission = Self::submission(PATIENT, count, blood_group);
                async move { requests.create(submission).await }
            });
            let second = tokio::spawn({
                let requests = Arc::clone(&requests);
                let submission = Self::submission(HOSPITAL, count, blood_group);
                async move { requests.create(submission).await }
            });
            (first.await, second.await)
        });
        let mut labels = self.labels.borrow_mut();
        for (label, outcome) in [("first", first), ("second", second)] {
            let created = outcome.expect("task joined").expect("request accepted");
            labels.insert(label.to_owned(), created.id);
        }
    }

    pub(crate) fn current_id(&self) -> RequestId {
        self.current.borrow().expect("a request was submitted")
    }

    pub(crate) fn labelled_id(&self, label: &str) -> RequestId {
        *self.labels.borrow().get(label).expect("labelled request")
    }

    fn record(&self, outcome: Result<BloodRequest, Error>) {
        *self.last_error.borrow_mut() = outcome.err();
    }

    pub(crate) fn approve_current(&self) {
        let requests = Arc::clone(&self.state.borrow().requests);
        let outcome = self.runtime.block_on(requests.approve(self.current_id()));
        self.record(outcome);
    }

    pub(crate) fn dispatch_current(&self) {
        let requests = Arc::clone(&self.state.borrow().requests);
        let outcome = self.runtime.block_on(requests.dispatch(self.current_id()));
        self.record(outcome);
    }

    pub(crate) fn donate_current(&self, donor: &str) {
        let requests = Arc::clone(&self.state.borrow().requests);
        let outcome = self
            .runtime
            .block_on(requests.donate(self.current_id(), &smart_id(donor)));
        self.record(outcome);
    }

    pub(crate) fn stored(&self, request_id: RequestId) -> BloodRequest {
        self.runtime
            .block_on(self.store.find_by_id(request_id))
            .expect("store readable")
            .expect("request stored")
    }

    pub(crate) fn units(&self) -> Vec<BloodUnit> {
        self.runtime
            .block_on(self.store.list_units())
            .expect("store readable")
    }

    pub(crate) fn available(&self, blood_group: &str) -> usize {
        let wanted = group(blood_group);
        self.units()
            .iter()
            .filter(|unit| unit.blood_group == wanted && unit.status == UnitStatus::Available)
            .count()
    }

    pub(crate) fn reserved_for(&self, request_id: RequestId) -> usize {
        self.units()
            .iter()
            .filter(|unit| {
                unit.status == UnitStatus::Reserved && unit.reserved_for == Some(request_id)
            })
            .count()
    }

    pub(crate) fn last_error(&self) -> Error {
        self.last_error
            .borrow()
            .clone()
            .expect("the last action failed")
    }

    pub(crate) fn assert_last_action_succeeded(&self) {
        if let Some(error) = self.last_error.borrow().as_ref() {
            panic!("expected success, got {error:?}");
        }
    }
}

/// Wire label of an error code, as carried in the JSON envelope.
pub(crate) fn code_label(error: &Error) -> String {
    serde_json::to_value(error.code())
        .ok()
        .and_then(|value| value.as_str().map(str::to_owned))
        .expect("error code serialises to a string")
}
