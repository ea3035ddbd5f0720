//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`) are implemented by outbound adapters; driving
//! ports (`*Command`, `*Query`, `LoginService`) are implemented by domain
//! services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod blood_request_command;
mod blood_request_query;
mod blood_request_repository;
mod inventory_command;
mod inventory_query;
mod inventory_repository;
mod login_service;
mod member_profile_query;
mod member_repository;

#[cfg(test)]
pub use blood_request_command::MockBloodRequestCommand;
pub use blood_request_command::BloodRequestCommand;
#[cfg(test)]
pub use blood_request_query::MockBloodRequestQuery;
pub use blood_request_query::BloodRequestQuery;
#[cfg(test)]
pub use blood_request_repository::MockBloodRequestRepository;
pub use blood_request_repository::{
    BloodRequestRepository, BloodRequestRepositoryError, RequestWrite, WritePrecondition,
};
#[cfg(test)]
pub use inventory_command::MockInventoryCommand;
pub use inventory_command::{AddUnitsRequest, AddUnitsResponse, InventoryCommand};
#[cfg(test)]
pub use inventory_query::MockInventoryQuery;
pub use inventory_query::InventoryQuery;
#[cfg(test)]
pub use inventory_repository::MockInventoryRepository;
pub use inventory_repository::{InventoryRepository, InventoryRepositoryError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{FixtureLoginService, LoginService};
#[cfg(test)]
pub use member_profile_query::MockMemberProfileQuery;
pub use member_profile_query::MemberProfileQuery;
#[cfg(test)]
pub use member_repository::MockMemberRepository;
pub use member_repository::{MemberRepository, MemberRepositoryError};
