//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle through `actix_web::web::Data` and only see
//! driving ports, so they can be exercised without a database.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    BloodRequestCommand, BloodRequestQuery, BloodRequestRepository, InventoryCommand,
    InventoryQuery, InventoryRepository, LoginService, MemberProfileQuery, MemberRepository,
};
use crate::domain::{
    Allocator, BloodRequestService, InventoryService, MemberProfileService, Reconciler,
};

/// Parameter object bundling every port the HTTP handlers call.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub profile: Arc<dyn MemberProfileQuery>,
    pub inventory: Arc<dyn InventoryCommand>,
    pub inventory_query: Arc<dyn InventoryQuery>,
    pub requests: Arc<dyn BloodRequestCommand>,
    pub requests_query: Arc<dyn BloodRequestQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub profile: Arc<dyn MemberProfileQuery>,
    pub inventory: Arc<dyn InventoryCommand>,
    pub inventory_query: Arc<dyn InventoryQuery>,
    pub requests: Arc<dyn BloodRequestCommand>,
    pub requests_query: Arc<dyn BloodRequestQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    #[must_use]
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            profile,
            inventory,
            inventory_query,
            requests,
            requests_query,
        } = ports;
        Self {
            login,
            profile,
            inventory,
            inventory_query,
            requests,
            requests_query,
        }
    }

    /// Wire the ledger services over one set of stores.
    ///
    /// Creation, manual approval and reconciliation share a single
    /// [`Allocator`], so all three reserve stock through the same
    /// conditional write.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use lifelink::domain::ports::FixtureLoginService;
    /// use lifelink::inbound::http::state::{HttpState, LedgerStores};
    /// use lifelink::outbound::memory::MemoryStore;
    ///
    /// let store = Arc::new(MemoryStore::new());
    /// let state = HttpState::from_stores(
    ///     Arc::new(FixtureLoginService),
    ///     LedgerStores::shared(&store),
    ///     Arc::new(mockable::DefaultClock),
    ///     3,
    /// );
    /// let _requests = state.requests.clone();
    /// ```
    pub fn from_stores<I, Q, M>(
        login: Arc<dyn LoginService>,
        stores: LedgerStores<I, Q, M>,
        clock: Arc<dyn Clock>,
        reservation_attempts: usize,
    ) -> Self
    where
        I: InventoryRepository + 'static,
        Q: BloodRequestRepository + 'static,
        M: MemberRepository + 'static,
    {
        let LedgerStores {
            inventory,
            requests,
            members,
        } = stores;
        let allocator = Allocator::new(Arc::clone(&inventory), requests, reservation_attempts);

        let stock = Arc::new(InventoryService::new(
            inventory,
            Arc::clone(&members),
            Reconciler::new(allocator.clone()),
            Arc::clone(&clock),
        ));
        let ledger = Arc::new(BloodRequestService::new(
            allocator,
            Arc::clone(&members),
            clock,
        ));

        Self::new(HttpStatePorts {
            login,
            profile: Arc::new(MemberProfileService::new(members)),
            inventory: stock.clone(),
            inventory_query: stock,
            requests: ledger.clone(),
            requests_query: ledger,
        })
    }
}

/// Driven-port handles the ledger services are built over.
pub struct LedgerStores<I, Q, M> {
    pub inventory: Arc<I>,
    pub requests: Arc<Q>,
    pub members: Arc<M>,
}

impl<S> LedgerStores<S, S, S> {
    /// Use one store for every ledger, as the in-memory store does.
    #[must_use]
    pub fn shared(store: &Arc<S>) -> Self {
        Self {
            inventory: Arc::clone(store),
            requests: Arc::clone(store),
            members: Arc::clone(store),
        }
    }
}
