#[cfg(test)]
mod tests {
    use crate::helpers::app::{TestApp, get_json_body, json_request, make_test_app};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use serial_test::serial;
    use services::Role;
    use tower::ServiceExt;

    async fn get(app: &TestApp, uri: &str, token: &str) -> (StatusCode, Value) {
        let response = app
            .router
            .clone()
            .oneshot(json_request("GET", uri, Some(token), None))
            .await
            .unwrap();
        let status = response.status();
        (status, get_json_body(response).await)
    }

    async fn start_session(app: &TestApp) -> Value {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/attendance/sessions",
                Some(app.facilitator_token().as_str()),
                Some(json!({})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        get_json_body(response).await["data"].clone()
    }

    // --- GET /api/attendance/groups/eligible ---

    #[tokio::test]
    #[serial]
    async fn facilitator_sees_groups_meeting_today() {
        let app = make_test_app().await;
        let (status, json) = get(&app, "/api/attendance/groups/eligible", &app.facilitator_token()).await;
        assert_eq!(status, StatusCode::OK);
        let groups = json["data"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["id"], app.group.id);
        assert_eq!(groups[0]["meeting_time"], "14:00");
    }

    #[tokio::test]
    #[serial]
    async fn no_groups_are_eligible_on_other_days() {
        let app = make_test_app().await;
        app.clock.advance(chrono::Duration::days(1));

        let (status, json) = get(&app, "/api/attendance/groups/eligible", &app.facilitator_token()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn admin_sees_every_group_meeting_today() {
        let app = make_test_app().await;
        let admin = app.token_for(&app.admin, Role::Admin);
        let (status, json) = get(&app, "/api/attendance/groups/eligible", &admin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn attendee_cannot_list_groups() {
        let app = make_test_app().await;
        let (status, _) = get(&app, "/api/attendance/groups/eligible", &app.attendee_token()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn invalid_jwt_is_unauthorized() {
        let app = make_test_app().await;
        let (status, json) = get(&app, "/api/attendance/groups/eligible", "not-a-jwt").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Authentication required");
    }

    // --- GET /api/attendance/sessions/{id}/token ---

    #[tokio::test]
    #[serial]
    async fn active_token_matches_first_token_and_counts_scans() {
        let app = make_test_app().await;
        let started = start_session(&app).await;
        let id = started["session_id"].as_i64().unwrap();
        let uri = format!("/api/attendance/sessions/{id}/token");

        let (status, json) = get(&app, &uri, &app.facilitator_token()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["token"], started["first_token"]);
        assert_eq!(json["data"]["rotation_sequence"], 1);
        assert_eq!(json["data"]["attendance_count"], 0);

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/attendance/scan",
                Some(app.attendee_token().as_str()),
                Some(json!({ "token": started["first_token"] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let (_, json) = get(&app, &uri, &app.facilitator_token()).await;
        assert_eq!(json["data"]["attendance_count"], 1);
    }

    #[tokio::test]
    #[serial]
    async fn token_moves_with_the_clock() {
        let app = make_test_app().await;
        let started = start_session(&app).await;
        let id = started["session_id"].as_i64().unwrap();
        let uri = format!("/api/attendance/sessions/{id}/token");

        app.clock.advance(chrono::Duration::seconds(45));
        let (status, json) = get(&app, &uri, &app.facilitator_token()).await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(json["data"]["token"], started["first_token"]);
        assert_eq!(json["data"]["rotation_sequence"], 2);
    }

    #[tokio::test]
    #[serial]
    async fn unknown_or_stopped_session_has_no_token() {
        let app = make_test_app().await;
        let (status, json) = get(&app, "/api/attendance/sessions/999/token", &app.facilitator_token()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Session is not active");

        let started = start_session(&app).await;
        let id = started["session_id"].as_i64().unwrap();
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/attendance/sessions/stop",
                Some(app.facilitator_token().as_str()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, _) = get(&app, &format!("/api/attendance/sessions/{id}/token"), &app.facilitator_token()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
