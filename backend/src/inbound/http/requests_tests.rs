//! Tests for Request Ledger HTTP handlers.

use super::*;
use crate::domain::ports::InventoryRepository;
use crate::domain::{BloodUnit, ComponentType, StockAddition, UnitStatus};
use crate::inbound::http::auth::login;
use crate::inbound::http::inventory::add_inventory;
use crate::inbound::http::test_utils::{login_as, memory_state, test_session_middleware};
use crate::outbound::memory::MemoryStore;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

const PATIENT: &str = "patient@lifelink.com";
const HOSPITAL: &str = "hospital@lifelink.com";
const BLOOD_BANK: &str = "bloodbank@lifelink.com";
const O_NEG_DONOR: &str = "donor.onegative@lifelink.com";
const A_POS_DONOR: &str = "donor.apositive@lifelink.com";

fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .service(
            web::scope("/api/v1")
                .service(login)
                .service(add_inventory)
                .service(create_request)
                .service(list_my_requests)
                .service(list_all_requests)
                .service(list_broadcasts)
                .service(fulfill_request)
                .service(dispatch_request)
                .service(donate_to_request)
                .service(cancel_request),
        )
}

/// Record stock straight into the store so no reconciliation runs.
async fn stock(store: &MemoryStore, group: &str, quantity: u32) {
    let units = StockAddition {
        blood_group: BloodGroup::new(group).expect("group"),
        component_type: ComponentType::default(),
        quantity,
        collection_date: None,
        institution: "Central Blood Bank".to_owned(),
    }
    .into_units(Utc::now(), &mut rand::thread_rng());
    store.add_units(&units).await.expect("stock recorded");
}

async fn units(store: &MemoryStore) -> Vec<BloodUnit> {
    store.list_units().await.expect("list units")
}

async fn post_json<S, B>(app: &S, uri: &str, cookie: &Cookie<'static>, body: Value) -> ServiceResponse<B>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri(uri)
            .cookie(cookie.clone())
            .set_json(body)
            .to_request(),
    )
    .await
}

async fn post_empty<S, B>(app: &S, uri: &str, cookie: &Cookie<'static>) -> ServiceResponse<B>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri(uri)
            .cookie(cookie.clone())
            .to_request(),
    )
    .await
}

async fn get_json<S>(app: &S, uri: &str, cookie: &Cookie<'static>) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::get()
            .uri(uri)
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    actix_test::read_body_json(response).await
}

fn fresh() -> (HttpState, Arc<MemoryStore>) {
    memory_state()
}

#[rstest]
#[actix_web::test]
async fn create_with_stock_is_approved_immediately() {
    let (state, store) = fresh();
    stock(&store, "O+", 3).await;
    let app = actix_test::init_service(test_app(state)).await;
    let patient = login_as(&app, PATIENT).await;

    let response = post_json(
        &app,
        "/api/v1/requests/create",
        &patient,
        json!({ "bloodGroup": "O+", "units": 2, "urgency": "critical", "hospital": " City General Hospital " }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["message"], "Blood request processed");
    assert_eq!(body["status"], "Approved");
    assert_eq!(body["broadcastCount"], 0);

    let mine = get_json(&app, "/api/v1/requests/my-requests", &patient).await;
    let request = &mine[0];
    assert_eq!(request["id"], body["requestId"]);
    assert_eq!(request["urgency"], "Critical");
    assert_eq!(request["hospitalName"], "City General Hospital");
    assert_eq!(request["fulfilledBy"], "LifeLink Network");
    assert_eq!(request["broadcastTo"], json!([]));

    let reserved = units(&store)
        .await
        .into_iter()
        .filter(|unit| unit.status == UnitStatus::Reserved)
        .count();
    assert_eq!(reserved, 2);
}

#[rstest]
#[actix_web::test]
async fn shortfall_broadcasts_to_compatible_donors() {
    let (state, _store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let hospital = login_as(&app, HOSPITAL).await;

    let response = post_json(
        &app,
        "/api/v1/requests/create",
        &hospital,
        json!({ "bloodGroup": "AB+", "units": 1 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["broadcastCount"], 1);

    let o_neg = login_as(&app, O_NEG_DONOR).await;
    let inbox = get_json(&app, "/api/v1/requests/broadcasts", &o_neg).await;
    assert_eq!(inbox.as_array().map(Vec::len), Some(1));
    assert_eq!(inbox[0]["urgency"], "Standard");
    assert_eq!(inbox[0]["broadcastTo"], json!([O_NEG_DONOR]));

    let a_pos = login_as(&app, A_POS_DONOR).await;
    let inbox = get_json(&app, "/api/v1/requests/broadcasts", &a_pos).await;
    assert_eq!(inbox, json!([]));
}

#[rstest]
#[case(json!({ "bloodGroup": "O+", "units": 0 }), "units", "out_of_range")]
#[case(json!({ "bloodGroup": "O+", "units": -2 }), "units", "out_of_range")]
#[case(json!({ "bloodGroup": "", "units": 1 }), "bloodGroup", "blank_field")]
#[case(json!({ "bloodGroup": "O+", "units": 1, "urgency": "whenever" }), "urgency", "invalid_value")]
#[actix_web::test]
async fn invalid_submissions_are_rejected(
    #[case] payload: Value,
    #[case] field: &str,
    #[case] code: &str,
) {
    let (state, _store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let patient = login_as(&app, PATIENT).await;

    let response = post_json(&app, "/api/v1/requests/create", &patient, payload).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);

    let all = get_json(&app, "/api/v1/requests/all", &patient).await;
    assert_eq!(all, json!([]));
}

#[rstest]
#[actix_web::test]
async fn manual_approval_reserves_stock_then_dispatch_is_not_repeatable() {
    let (state, store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let patient = login_as(&app, PATIENT).await;
    let bank = login_as(&app, BLOOD_BANK).await;

    let created = post_json(
        &app,
        "/api/v1/requests/create",
        &patient,
        json!({ "bloodGroup": "B+", "units": 2 }),
    )
    .await;
    let body: Value = actix_test::read_body_json(created).await;
    let id = body["requestId"].as_str().expect("request id").to_owned();

    stock(&store, "B+", 2).await;

    let approved = post_empty(&app, &format!("/api/v1/requests/{id}/fulfill"), &bank).await;
    assert_eq!(approved.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(approved).await;
    assert_eq!(body["message"], "Request Approved Manually");
    assert_eq!(body["request"]["status"], "Approved");
    assert_eq!(body["request"]["fulfilledBy"], "Blood Bank (Manual)");
    assert_eq!(body["request"]["broadcastTo"], json!([]));

    let again = post_empty(&app, &format!("/api/v1/requests/{id}/fulfill"), &bank).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(again).await;
    assert_eq!(body["code"], "invalid_state");
    assert_eq!(body["message"], "Request already processed");

    let dispatched = post_empty(&app, &format!("/api/v1/requests/{id}/dispatch"), &bank).await;
    assert_eq!(dispatched.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(dispatched).await;
    assert_eq!(body["message"], "Blood Units Dispatched");
    assert_eq!(body["request"]["status"], "Dispatched");

    let repeat = post_empty(&app, &format!("/api/v1/requests/{id}/dispatch"), &bank).await;
    assert_eq!(repeat.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(repeat).await;
    assert_eq!(body["code"], "invalid_state");
    assert_eq!(body["message"], "Request must be Approved first");

    let mine = get_json(&app, "/api/v1/requests/my-requests", &patient).await;
    assert_eq!(mine[0]["status"], "Dispatched");
}

#[rstest]
#[actix_web::test]
async fn manual_approval_with_short_stock_touches_nothing() {
    let (state, store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let patient = login_as(&app, PATIENT).await;
    let bank = login_as(&app, BLOOD_BANK).await;

    let created = post_json(
        &app,
        "/api/v1/requests/create",
        &patient,
        json!({ "bloodGroup": "A-", "units": 5 }),
    )
    .await;
    let body: Value = actix_test::read_body_json(created).await;
    let id = body["requestId"].as_str().expect("request id").to_owned();
    stock(&store, "A-", 3).await;

    let response = post_empty(&app, &format!("/api/v1/requests/{id}/fulfill"), &bank).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(body["message"], "Insufficient stock to approve");
    assert_eq!(body["details"]["required"], 5);
    assert_eq!(body["details"]["available"], 3);
    assert!(
        units(&store)
            .await
            .iter()
            .all(|unit| unit.status == UnitStatus::Available)
    );
    let mine = get_json(&app, "/api/v1/requests/my-requests", &patient).await;
    assert_eq!(mine[0]["status"], "Pending");
}

#[rstest]
#[actix_web::test]
async fn added_stock_auto_approves_pending_requests() {
    let (state, _store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let patient = login_as(&app, PATIENT).await;
    let bank = login_as(&app, BLOOD_BANK).await;

    let created = post_json(
        &app,
        "/api/v1/requests/create",
        &patient,
        json!({ "bloodGroup": "O+", "units": 2 }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let added = post_json(
        &app,
        "/api/v1/inventory/add",
        &bank,
        json!({ "bloodGroup": "O+", "quantity": 2 }),
    )
    .await;
    assert_eq!(added.status(), StatusCode::CREATED);

    let mine = get_json(&app, "/api/v1/requests/my-requests", &patient).await;
    assert_eq!(mine[0]["status"], "Approved");
    assert_eq!(mine[0]["fulfilledBy"], "LifeLink Auto-Allocation");
    assert_eq!(mine[0]["broadcastTo"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn donating_records_the_donor_without_touching_stock() {
    let (state, store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let patient = login_as(&app, PATIENT).await;

    let created = post_json(
        &app,
        "/api/v1/requests/create",
        &patient,
        json!({ "bloodGroup": "O-", "units": 4 }),
    )
    .await;
    let body: Value = actix_test::read_body_json(created).await;
    let id = body["requestId"].as_str().expect("request id").to_owned();
    stock(&store, "O-", 1).await;

    let donor = login_as(&app, O_NEG_DONOR).await;
    let response = post_empty(&app, &format!("/api/v1/requests/{id}/donate"), &donor).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["message"], "Thank you for donating!");
    assert_eq!(body["request"]["status"], "Fulfilled");
    assert_eq!(body["request"]["fulfilledBy"], "Donor: Arjun Mehta");
    // Donor acceptance records intent only; stock stays available.
    assert!(
        units(&store)
            .await
            .iter()
            .all(|unit| unit.status == UnitStatus::Available)
    );

    let late = post_empty(&app, &format!("/api/v1/requests/{id}/donate"), &donor).await;
    assert_eq!(late.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(late).await;
    assert_eq!(body["message"], "Request no longer pending");
}

#[rstest]
#[actix_web::test]
async fn only_the_requester_may_cancel() {
    let (state, _store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let patient = login_as(&app, PATIENT).await;
    let hospital = login_as(&app, HOSPITAL).await;

    let created = post_json(
        &app,
        "/api/v1/requests/create",
        &patient,
        json!({ "bloodGroup": "A+", "units": 1 }),
    )
    .await;
    let body: Value = actix_test::read_body_json(created).await;
    let id = body["requestId"].as_str().expect("request id").to_owned();

    let forbidden = post_empty(&app, &format!("/api/v1/requests/{id}/cancel"), &hospital).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let cancelled = post_empty(&app, &format!("/api/v1/requests/{id}/cancel"), &patient).await;
    assert_eq!(cancelled.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(cancelled).await;
    assert_eq!(body["message"], "Request Cancelled");
    assert_eq!(body["request"]["status"], "Cancelled");

    let donor = login_as(&app, A_POS_DONOR).await;
    let inbox = get_json(&app, "/api/v1/requests/broadcasts", &donor).await;
    assert_eq!(inbox, json!([]));
}

#[rstest]
#[case("fulfill")]
#[case("dispatch")]
#[case("donate")]
#[case("cancel")]
#[actix_web::test]
async fn unknown_requests_are_not_found(#[case] action: &str) {
    let (state, _store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let donor = login_as(&app, O_NEG_DONOR).await;

    let response = post_empty(
        &app,
        &format!("/api/v1/requests/{}/{action}", RequestId::random()),
        &donor,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["message"], "Request not found");
}

#[rstest]
#[actix_web::test]
async fn listings_are_newest_first() {
    let (state, _store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;
    let patient = login_as(&app, PATIENT).await;
    let hospital = login_as(&app, HOSPITAL).await;

    for (cookie, group) in [(&patient, "A+"), (&hospital, "B+"), (&patient, "AB-")] {
        let response = post_json(
            &app,
            "/api/v1/requests/create",
            cookie,
            json!({ "bloodGroup": group, "units": 1 }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let all = get_json(&app, "/api/v1/requests/all", &hospital).await;
    let groups: Vec<&str> = all
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|request| request["bloodGroup"].as_str())
        .collect();
    assert_eq!(groups, ["AB-", "B+", "A+"]);

    let mine = get_json(&app, "/api/v1/requests/my-requests", &patient).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(2));
    assert_eq!(mine[0]["bloodGroup"], "AB-");
}

#[rstest]
#[actix_web::test]
async fn listings_require_a_session() {
    let (state, _store) = fresh();
    let app = actix_test::init_service(test_app(state)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/requests/all")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
