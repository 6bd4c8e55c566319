//! HTTP-level integration tests for the replacement command surface.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, build_test_app, TestApp};
use serde_json::json;
use shiftguard_core::types::DbId;
use shiftguard_db::models::notification::CreateNotification;
use shiftguard_engine::store::RosterStore;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Schedule a shift that started `started_mins_ago` minutes ago and return its id.
async fn create_shift(app: &TestApp, guard_id: DbId, started_mins_ago: i64) -> DbId {
    let start = Utc::now() - Duration::minutes(started_mins_ago);
    let response = app
        .post(
            "/api/v1/shifts",
            &app.admin_token(),
            json!({
                "guard_id": guard_id,
                "start_time": start,
                "end_time": start + Duration::hours(8),
                "client_site": "Harbour Gate 3",
                "site_latitude": 51.5074,
                "site_longitude": -0.1278,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Run detection as admin and return the raised request ids.
async fn detect(app: &TestApp) -> Vec<DbId> {
    let response = app
        .post_empty("/api/v1/no-shows/detect", &app.admin_token())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|offer| offer["id"].as_i64().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// General HTTP behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_reports_store_health() {
    let app = build_test_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = build_test_app();
    let response = app
        .send(Method::GET, "/api/v1/replacements", None, None)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn guards_cannot_use_admin_commands() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let token = app.guard_token(alice);

    let response = app.post_empty("/api/v1/no-shows/detect", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post("/api/v1/guards", &token, json!({ "full_name": "Mallory" }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn invalid_shift_is_a_validation_error() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let start = Utc::now();

    let response = app
        .post(
            "/api/v1/shifts",
            &app.admin_token(),
            json!({
                "guard_id": alice,
                "start_time": start,
                "end_time": start - Duration::hours(1),
                "client_site": "Harbour Gate 3",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_shift_is_not_found() {
    let app = build_test_app();
    let response = app.get("/api/v1/shifts/999", &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn guard_checks_in_once() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let shift_id = create_shift(&app, alice, 5).await;
    let token = app.guard_token(alice);

    let response = app
        .post(
            "/api/v1/attendance/check-in",
            &token,
            json!({ "shift_id": shift_id, "latitude": 51.5, "longitude": -0.12 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let record = body_json(response).await["data"].clone();
    assert_eq!(record["guard_id"], alice);
    assert!(record["minutes_late"].as_i64().unwrap() >= 4);

    let response = app
        .post(
            "/api/v1/attendance/check-in",
            &token,
            json!({ "shift_id": shift_id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_CHECK_IN");

    let shift = body_json(app.get(&format!("/api/v1/shifts/{shift_id}"), &token).await).await;
    assert_eq!(shift["data"]["status_id"], 2);
}

#[tokio::test]
async fn half_a_location_is_rejected() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let shift_id = create_shift(&app, alice, 0).await;

    let response = app
        .post(
            "/api/v1/attendance/check-in",
            &app.guard_token(alice),
            json!({ "shift_id": shift_id, "latitude": 51.5 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_owner_checks_out() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let bob = app.register_guard("Bob").await;
    let shift_id = create_shift(&app, alice, 0).await;

    let response = app
        .post(
            "/api/v1/attendance/check-in",
            &app.guard_token(alice),
            json!({ "shift_id": shift_id }),
        )
        .await;
    let attendance_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/attendance/{attendance_id}/check-out");

    let response = app.post_empty(&uri, &app.guard_token(bob)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.post_empty(&uri, &app.guard_token(alice)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["data"]["shift_completed"], false);

    let response = app.post_empty(&uri, &app.guard_token(alice)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "ALREADY_CHECKED_OUT");
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn availability_round_trip() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let token = app.guard_token(alice);
    let uri = format!("/api/v1/guards/{alice}/availability");

    let response = app.get(&format!("{uri}?date=2026-03-02"), &token).await;
    let status = body_json(response).await;
    assert_eq!(status["data"]["available"], true);
    assert_eq!(status["data"]["declared"], false);

    let response = app
        .put(
            &uri,
            &token,
            json!({ "date": "2026-03-02T10:30:00Z", "available": false, "reason": "exam" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&format!("{uri}?date=2026-03-02"), &token).await;
    let status = body_json(response).await;
    assert_eq!(status["data"]["available"], false);
    assert_eq!(status["data"]["reason"], "exam");
}

#[tokio::test]
async fn guards_cannot_set_each_others_availability() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let bob = app.register_guard("Bob").await;

    let response = app
        .put(
            &format!("/api/v1/guards/{alice}/availability"),
            &app.guard_token(bob),
            json!({ "date": "2026-03-02T00:00:00Z", "available": false }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .put(
            &format!("/api/v1/guards/{alice}/availability"),
            &app.admin_token(),
            json!({ "date": "2026-03-02T00:00:00Z", "available": false }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Replacement lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_show_offer_is_won_by_one_candidate() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let bob = app.register_guard("Bob").await;
    let carol = app.register_guard("Carol").await;
    let shift_id = create_shift(&app, alice, 30).await;

    let raised = detect(&app).await;
    assert_eq!(raised.len(), 1);
    let request_id = raised[0];
    assert!(detect(&app).await.is_empty());

    // Both candidates see the offer.
    for guard in [bob, carol] {
        let offers =
            body_json(app.get(&format!("/api/v1/guards/{guard}/offers"), &app.guard_token(guard)).await)
                .await;
        assert_eq!(offers["data"][0]["id"], request_id);
    }

    let accept = format!("/api/v1/replacements/{request_id}/accept");
    let response = app.post_empty(&accept, &app.guard_token(bob)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["accepted_guard_id"], bob);

    let response = app.post_empty(&accept, &app.guard_token(carol)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "ALREADY_RESOLVED");

    let shift = body_json(
        app.get(&format!("/api/v1/shifts/{shift_id}"), &app.guard_token(bob))
            .await,
    )
    .await;
    assert_eq!(shift["data"]["replacement_guard_id"], bob);
}

#[tokio::test]
async fn stranger_accept_is_forbidden() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    app.register_guard("Bob").await;
    create_shift(&app, alice, 30).await;
    let request_id = detect(&app).await[0];

    let response = app
        .post_empty(
            &format!("/api/v1/replacements/{request_id}/accept"),
            &app.guard_token(alice),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "NOT_A_CANDIDATE");
}

#[tokio::test]
async fn decline_then_list_by_status() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let bob = app.register_guard("Bob").await;
    let shift_id = create_shift(&app, alice, 30).await;

    let response = app
        .post_empty(
            &format!("/api/v1/shifts/{shift_id}/replacement"),
            &app.admin_token(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let request_id = body_json(response).await["data"]["offer"]["id"]
        .as_i64()
        .unwrap();

    let response = app
        .post_empty(
            &format!("/api/v1/replacements/{request_id}/decline"),
            &app.guard_token(bob),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["data"]["outcome"], "all_declined");
    assert!(outcome["data"]["follow_up"].is_null());

    let declined = body_json(
        app.get("/api/v1/replacements?status=declined", &app.admin_token())
            .await,
    )
    .await;
    assert_eq!(declined["data"].as_array().unwrap().len(), 1);

    let pending = body_json(
        app.get("/api/v1/replacements?status=pending", &app.admin_token())
            .await,
    )
    .await;
    assert!(pending["data"].as_array().unwrap().is_empty());

    let response = app
        .post_empty(
            &format!("/api/v1/shifts/{shift_id}/replacement"),
            &app.admin_token(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["outcome"], "existing");
}

#[tokio::test]
async fn replacement_detail_is_limited_to_parties() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let bob = app.register_guard("Bob").await;
    create_shift(&app, alice, 30).await;
    // Busy elsewhere, so not a candidate.
    let dave = app.register_guard("Dave").await;
    create_shift(&app, dave, 0).await;
    let request_id = detect(&app).await[0];
    let uri = format!("/api/v1/replacements/{request_id}");

    let response = app.get(&uri, &app.guard_token(bob)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let offer = body_json(response).await;
    assert_eq!(offer["data"]["candidates"][0]["guard_id"], bob);

    let response = app.get(&uri, &app.guard_token(dave)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notifications_are_private_to_the_caller() {
    let app = build_test_app();
    let alice = app.register_guard("Alice").await;
    let bob = app.register_guard("Bob").await;
    let note = app
        .store
        .create_notification(&CreateNotification {
            guard_id: alice,
            title: "Replacement shift available".into(),
            message: "Cover needed".into(),
            related_shift_id: None,
            related_request_id: None,
            expires_at: None,
        })
        .await
        .unwrap();

    let listed = body_json(app.get("/api/v1/notifications", &app.guard_token(alice)).await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    let listed = body_json(app.get("/api/v1/notifications", &app.guard_token(bob)).await).await;
    assert!(listed["data"].as_array().unwrap().is_empty());

    let uri = format!("/api/v1/notifications/{}/read", note.id);
    let response = app.post_empty(&uri, &app.guard_token(bob)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.post_empty(&uri, &app.guard_token(alice)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_read"], true);

    let unread = body_json(
        app.get("/api/v1/notifications?unread_only=true", &app.guard_token(alice))
            .await,
    )
    .await;
    assert!(unread["data"].as_array().unwrap().is_empty());
}
