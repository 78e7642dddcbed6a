#[cfg(test)]
mod tests {
    use crate::helpers::app::{get_json_body, json_request, make_test_app};
    use axum::http::StatusCode;
    use serial_test::serial;
    use tower::ServiceExt;

    #[tokio::test]
    #[serial]
    async fn health_check_returns_ok_json() {
        let app = make_test_app().await;

        let response = app
            .router
            .oneshot(json_request("GET", "/api/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "OK");
        assert_eq!(json["message"], "Health check passed");
    }
}
