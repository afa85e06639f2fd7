//! HTTP tests for the full router.
//!
//! Requests go through the real middleware stack and services, backed by an
//! in-memory database, a recording mailer and an in-process cache.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use otp_auth_service::api::{create_router, AppState};
use otp_auth_service::config::RATE_LIMIT_AUTH_REQUESTS;
use otp_auth_service::infra::Database;

use common::{TestContext, GOOD_TOKEN};

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "correct-horse-battery";

fn router(ctx: &TestContext) -> Router {
    let state = AppState::from_container(
        &ctx.services,
        ctx.cache.clone(),
        Arc::new(Database::from_connection(ctx.db.clone())),
    );
    create_router(state)
}

/// Login attempt arriving from `peer` with a forged forwarding header.
fn login_from(peer: [u8; 4], forwarded_for: &str) -> Request<Body> {
    let mut request = post_json(
        "/auth/login",
        json!({ "email": "nobody@example.com", "password": "whatever-123" }),
    );
    request
        .headers_mut()
        .insert("X-Forwarded-For", forwarded_for.parse().unwrap());
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 50_000))));
    request
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_and_health() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    let response = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_register_verify_login_logout() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    let response = send(
        &app,
        post_json("/auth/register", json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        json_body(response).await["message"],
        "Verification code sent to your email."
    );

    let code = ctx.mailer.last_code_for(EMAIL).unwrap();
    let response = send(
        &app,
        post_json("/auth/verify", json!({ "email": EMAIL, "code": code })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Email verified successfully!");
    assert_eq!(body["email"], EMAIL);

    let response = send(
        &app,
        post_json("/auth/login", json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Login successful.");
    let token = body["credential"]["access_token"].as_str().unwrap().to_string();

    let logout = || {
        Request::builder()
            .method(Method::POST)
            .uri("/auth/logout")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };

    let response = send(&app, logout()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["message"], "Logout successful.");

    let response = send(&app, logout()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_before_verification() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    send(
        &app,
        post_json("/auth/register", json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;

    let response = send(
        &app,
        post_json("/auth/login", json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"]["code"],
        "ACCOUNT_NOT_VERIFIED"
    );
}

#[tokio::test]
async fn test_wrong_code_and_unknown_email_answer_alike() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    send(
        &app,
        post_json("/auth/register", json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    let code = ctx.mailer.last_code_for(EMAIL).unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let wrong_code = send(
        &app,
        post_json("/auth/verify", json!({ "email": EMAIL, "code": wrong })),
    )
    .await;
    let unknown = send(
        &app,
        post_json(
            "/auth/verify",
            json!({ "email": "nobody@example.com", "code": wrong }),
        ),
    )
    .await;

    assert_eq!(wrong_code.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(wrong_code).await, json_body(unknown).await);
}

#[tokio::test]
async fn test_validation_errors_name_fields() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    let response = send(
        &app,
        post_json("/auth/register", json!({ "email": "nope", "password": "short" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["email"].is_array());
    assert!(body["error"]["fields"]["password"].is_array());

    let response = send(
        &app,
        post_json("/auth/verify", json!({ "email": EMAIL, "code": "12ab" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"]["fields"]["code"].is_array());
    assert!(ctx.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_duplicate_registration_is_field_error() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    send(
        &app,
        post_json("/auth/register", json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    let code = ctx.mailer.last_code_for(EMAIL).unwrap();
    send(
        &app,
        post_json("/auth/verify", json!({ "email": EMAIL, "code": code })),
    )
    .await;

    let response = send(
        &app,
        post_json("/auth/register", json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"]["fields"]["email"][0],
        "This email is already registered."
    );
}

#[tokio::test]
async fn test_social_login_endpoints() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    let response = send(
        &app,
        post_json("/auth/social/google", json!({ "access_token": GOOD_TOKEN })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["message"],
        "Google login successful"
    );

    let response = send(
        &app,
        post_json("/auth/social/facebook", json!({ "access_token": GOOD_TOKEN })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["message"],
        "Facebook login successful"
    );

    let response = send(
        &app,
        post_json("/auth/social/google", json!({ "access_token": "revoked" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_contact_form() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    let response = send(
        &app,
        post_json(
            "/contact",
            json!({
                "name": "Grace",
                "email": "grace@example.com",
                "subject": "Hello",
                "message": "Just saying hi."
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        json_body(response).await["message"],
        "Your Message Has Been Sent Successfully!"
    );

    let response = send(
        &app,
        post_json(
            "/contact",
            json!({ "name": "", "email": "grace@example.com", "subject": "Hi", "message": "" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["fields"]["name"].is_array());
    assert!(body["error"]["fields"]["message"].is_array());
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    let attempt = || {
        post_json(
            "/auth/login",
            json!({ "email": "nobody@example.com", "password": "whatever-123" }),
        )
    };

    for _ in 0..RATE_LIMIT_AUTH_REQUESTS {
        let response = send(&app, attempt()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = send(&app, attempt()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_reset_limit() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);
    let peer = [198, 51, 100, 4];

    for i in 0..RATE_LIMIT_AUTH_REQUESTS {
        let response = send(&app, login_from(peer, &format!("203.0.113.{}", i))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = send(&app, login_from(peer, "192.0.2.250")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_trusted_proxy_limits_each_forwarded_client() {
    let ctx = TestContext::new().await;
    let state = AppState::from_container(
        &ctx.services,
        ctx.cache.clone(),
        Arc::new(Database::from_connection(ctx.db.clone())),
    )
    .with_trusted_proxy(true);
    let app = create_router(state);
    let proxy = [10, 0, 0, 9];

    for _ in 0..RATE_LIMIT_AUTH_REQUESTS {
        let response = send(&app, login_from(proxy, "1.1.1.1, 203.0.113.7")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // A forged first hop is still the same client to the proxy
    let response = send(&app, login_from(proxy, "9.9.9.9, 203.0.113.7")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = send(&app, login_from(proxy, "203.0.113.8")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_form_rejects_blank_fields() {
    let ctx = TestContext::new().await;
    let app = router(&ctx);

    let response = send(
        &app,
        post_json(
            "/contact",
            json!({
                "name": "Grace",
                "email": "grace@example.com",
                "subject": "   ",
                "message": " \n\t "
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["fields"]["subject"].is_array());
    assert!(body["error"]["fields"]["message"].is_array());
    assert!(body["error"]["fields"]["name"].is_null());
}
