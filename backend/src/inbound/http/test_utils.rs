//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test as actix_test;
use chrono::Utc;
use mockable::DefaultClock;

use crate::domain::DEMO_PASSWORD;
use crate::domain::ports::FixtureLoginService;
use crate::inbound::http::state::{HttpState, LedgerStores};
use crate::outbound::memory::MemoryStore;

/// Session middleware with a fresh key, cookie `session`, `Secure` off.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Ledger state over a fresh in-memory store seeded with the demo members.
pub fn memory_state() -> (HttpState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_demo_members(Utc::now()).expect("demo members"));
    let state = HttpState::from_stores(
        Arc::new(FixtureLoginService),
        LedgerStores::shared(&store),
        Arc::new(DefaultClock),
        3,
    );
    (state, store)
}

/// The `session` cookie set by `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Log in as a demo account and return its session cookie.
pub async fn login_as<S, B>(app: &S, smart_id: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(serde_json::json!({ "smartId": smart_id, "password": DEMO_PASSWORD }))
        .to_request();
    let response = actix_test::call_service(app, request).await;
    assert!(response.status().is_success(), "demo login failed");
    session_cookie(&response)
}
