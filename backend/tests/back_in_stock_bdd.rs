//! Behaviour tests for back-in-stock reconciliation.
//!
//! These scenarios add stock through the inventory service and check that
//! pending requests are approved strictly in submission order, skipping any
//! the remaining stock cannot cover in full.

#[expect(
    dead_code,
    reason = "Shared world exposes helpers used by other ledger suites."
)]
#[path = "support/ledger_world.rs"]
mod ledger_world;

use ledger_world::{LedgerWorld, PATIENT};
use lifelink::domain::{Fulfiller, RequestStatus};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[fixture]
fn world() -> LedgerWorld {
    LedgerWorld::new()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("an empty blood bank")]
fn an_empty_blood_bank(world: &LedgerWorld) {
    assert!(world.units().is_empty());
}

#[given("the blood bank already holds {count} units of {group}")]
fn the_blood_bank_already_holds(world: &LedgerWorld, count: u32, group: String) {
    world.hold_stock(count, &group);
}

#[given("the patient has a pending request {label} for {count} units of {group}")]
fn the_patient_has_a_pending_request(
    world: &LedgerWorld,
    label: String,
    count: u32,
    group: String,
) {
    world.submit(&label, PATIENT, count, &group);
    let stored = world.stored(world.labelled_id(&label));
    assert_eq!(stored.status, RequestStatus::Pending);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("the blood bank adds {count} units of {group}")]
fn the_blood_bank_adds(world: &LedgerWorld, count: u32, group: String) {
    world.restock(count, &group);
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("request {label} is approved by auto-allocation")]
fn request_is_approved_by_auto_allocation(world: &LedgerWorld, label: String) {
    let stored = world.stored(world.labelled_id(&label));
    assert_eq!(stored.status, RequestStatus::Approved);
    assert_eq!(stored.fulfilled_by, Some(Fulfiller::AutoAllocation));
}

#[then("request {label} is still pending")]
fn request_is_still_pending(world: &LedgerWorld, label: String) {
    let request_id = world.labelled_id(&label);
    let stored = world.stored(request_id);
    assert_eq!(stored.status, RequestStatus::Pending);
    assert!(stored.fulfilled_by.is_none());
    assert_eq!(world.reserved_for(request_id), 0);
}

#[then("{count} units of {group} are available")]
fn units_are_available(world: &LedgerWorld, count: usize, group: String) {
    assert_eq!(world.available(&group), count);
}

#[then("{count} units are reserved for request {label}")]
fn units_are_reserved_for_request(world: &LedgerWorld, count: usize, label: String) {
    assert_eq!(world.reserved_for(world.labelled_id(&label)), count);
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/back_in_stock.feature",
    name = "Restocking approves pending requests oldest first"
)]
fn restocking_approves_oldest_first(world: LedgerWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/back_in_stock.feature",
    name = "Restocking another group leaves pending requests alone"
)]
fn restocking_another_group_is_ignored(world: LedgerWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/back_in_stock.feature",
    name = "Pending requests are served from the whole available pool"
)]
fn pending_requests_use_the_whole_pool(world: LedgerWorld) {
    let _ = world;
}
