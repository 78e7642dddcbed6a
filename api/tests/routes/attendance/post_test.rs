#[cfg(test)]
mod tests {
    use crate::helpers::app::{TestApp, get_json_body, json_request, make_test_app, monday};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use serial_test::serial;
    use services::Role;
    use tower::ServiceExt;

    async fn start(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/api/attendance/sessions", Some(token), Some(body)))
            .await
            .unwrap();
        let status = response.status();
        (status, get_json_body(response).await)
    }

    async fn scan(app: &TestApp, token: &str, code: &str) -> (StatusCode, Value) {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/attendance/scan",
                Some(token),
                Some(json!({ "token": code })),
            ))
            .await
            .unwrap();
        let status = response.status();
        (status, get_json_body(response).await)
    }

    // --- POST /api/attendance/sessions ---

    #[tokio::test]
    #[serial]
    async fn start_session_requires_authentication() {
        let app = make_test_app().await;
        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/api/attendance/sessions", None, Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn attendee_cannot_start_session() {
        let app = make_test_app().await;
        let (status, json) = start(&app, &app.attendee_token(), json!({})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Missing capability: manage_session");
    }

    #[tokio::test]
    #[serial]
    async fn facilitator_starts_session_once_per_day() {
        let app = make_test_app().await;
        let token = app.facilitator_token();

        let (status, json) = start(&app, &token, json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["rotation_interval_seconds"], 45);
        assert!(json["data"]["first_token"].as_str().unwrap().starts_with("v2."));
        assert!(json["data"]["session_id"].as_i64().unwrap() > 0);

        let (status, json) = start(&app, &token, json!({ "group_ids": [app.group.id] })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["message"], "A meeting session is already active today");
    }

    #[tokio::test]
    #[serial]
    async fn start_session_rejects_groups_the_caller_does_not_manage() {
        let app = make_test_app().await;
        let (status, json) = start(&app, &app.facilitator_token(), json!({ "group_ids": [9999] })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    #[serial]
    async fn start_session_outside_setup_window_is_unprocessable() {
        let app = make_test_app().await;
        app.clock.set(monday(12, 0, 0));

        let (status, json) = start(&app, &app.facilitator_token(), json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["message"], "Outside the meeting window");
    }

    #[tokio::test]
    #[serial]
    async fn start_session_on_a_non_meeting_day_is_unprocessable() {
        let app = make_test_app().await;
        app.clock.set(monday(13, 50, 0) + chrono::Duration::days(1));

        let (status, json) = start(&app, &app.facilitator_token(), json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["message"], "None of your groups meets today");
    }

    #[tokio::test]
    #[serial]
    async fn start_session_validates_group_list() {
        let app = make_test_app().await;
        let (status, json) = start(&app, &app.facilitator_token(), json!({ "group_ids": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "group_ids must list between 1 and 64 groups");
    }

    // --- POST /api/attendance/sessions/stop ---

    #[tokio::test]
    #[serial]
    async fn stop_session_is_idempotent() {
        let app = make_test_app().await;
        let token = app.facilitator_token();
        let (status, _) = start(&app, &token, json!({})).await;
        assert_eq!(status, StatusCode::CREATED);

        let stop = || json_request("POST", "/api/attendance/sessions/stop", Some(token.as_str()), None);

        let response = app.router.clone().oneshot(stop()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_json_body(response).await;
        assert_eq!(json["data"]["stopped"], true);
        assert_eq!(json["message"], "Session stopped");

        let response = app.router.clone().oneshot(stop()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_json_body(response).await;
        assert_eq!(json["data"]["stopped"], false);
        assert_eq!(json["message"], "No active session");

        // A new session can be started once the old one is stopped.
        let (status, _) = start(&app, &token, json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // --- POST /api/attendance/scan ---

    #[tokio::test]
    #[serial]
    async fn attendee_scan_is_recorded_once() {
        let app = make_test_app().await;
        let (_, started) = start(&app, &app.facilitator_token(), json!({})).await;
        let code = started["data"]["first_token"].as_str().unwrap().to_owned();

        let (status, json) = scan(&app, &app.attendee_token(), &code).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "Attendance recorded");
        assert_eq!(json["data"]["group_id"], app.group.id);
        assert_eq!(json["data"]["session_id"], started["data"]["session_id"]);
        assert_eq!(json["data"]["meeting_date"], "2025-09-08");

        let (status, json) = scan(&app, &app.attendee_token(), &code).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["message"], "Attendance already recorded for today");
    }

    #[tokio::test]
    #[serial]
    async fn scan_with_forged_token_is_rejected() {
        let app = make_test_app().await;
        start(&app, &app.facilitator_token(), json!({})).await;

        let (status, json) = scan(&app, &app.attendee_token(), "v2.00000000000000000000000000000000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid or expired code");
    }

    #[tokio::test]
    #[serial]
    async fn scan_without_session_is_not_found() {
        let app = make_test_app().await;
        let (status, json) = scan(&app, &app.attendee_token(), "v2.00000000000000000000000000000000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "No active meeting session");
    }

    #[tokio::test]
    #[serial]
    async fn scan_by_attendee_without_group_is_unprocessable() {
        let app = make_test_app().await;
        let (_, started) = start(&app, &app.facilitator_token(), json!({})).await;
        let code = started["data"]["first_token"].as_str().unwrap().to_owned();

        let stray = app.token_for(&app.stray, Role::Attendee);
        let (status, json) = scan(&app, &stray, &code).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["message"], "You are not assigned to a group");
    }

    #[tokio::test]
    #[serial]
    async fn facilitator_cannot_scan() {
        let app = make_test_app().await;
        let (status, json) = scan(&app, &app.facilitator_token(), "v2.ab").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "Missing capability: scan");
    }

    #[tokio::test]
    #[serial]
    async fn scan_validates_token_length() {
        let app = make_test_app().await;
        let (status, json) = scan(&app, &app.attendee_token(), "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "token must be between 1 and 256 characters");
    }
}
