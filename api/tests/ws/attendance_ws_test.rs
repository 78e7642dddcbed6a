#[cfg(test)]
mod tests {
    use crate::helpers::app::{TestApp, make_test_app};
    use crate::helpers::ws::{connect_ws, next_json, spawn_server};
    use futures::SinkExt;
    use serial_test::serial;
    use services::{Actor, Role, StartedSession};
    use tokio_tungstenite::tungstenite::{Error, Message};

    async fn start_session(app: &TestApp) -> StartedSession {
        let facilitator = Actor::new(app.facilitator.id, Role::Facilitator);
        app.state
            .sessions()
            .start(&facilitator, None, app.state.now())
            .await
            .unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn display_receives_current_token_on_connect() {
        let app = make_test_app().await;
        let started = start_session(&app).await;
        let addr = spawn_server(app.router.clone()).await;

        let path = format!("attendance/sessions/{}", started.session_id);
        let (mut ws, _) = connect_ws(&addr.to_string(), &path, Some(app.facilitator_token().as_str()))
            .await
            .unwrap();

        let frame = next_json(&mut ws).await;
        assert_eq!(frame["type"], "event");
        assert_eq!(frame["event"], "attendance.token_rotated");
        assert_eq!(frame["topic"], format!("attendance:session:{}", started.session_id));
        assert_eq!(frame["payload"]["token"], started.first_token);
        assert_eq!(frame["payload"]["rotation_sequence"], 1);

        ws.send(Message::Text(r#"{"type":"ping"}"#.into())).await.unwrap();
        let pong = next_json(&mut ws).await;
        assert_eq!(pong["event"], "pong");

        ws.send(Message::Text(r#"{"type":"current"}"#.into())).await.unwrap();
        let again = next_json(&mut ws).await;
        assert_eq!(again["payload"]["token"], started.first_token);

        ws.close(None).await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn scans_and_stops_are_pushed_to_the_display() {
        let app = make_test_app().await;
        let started = start_session(&app).await;
        let addr = spawn_server(app.router.clone()).await;

        let path = format!("attendance/sessions/{}", started.session_id);
        let (mut ws, _) = connect_ws(&addr.to_string(), &path, Some(app.facilitator_token().as_str()))
            .await
            .unwrap();
        next_json(&mut ws).await;

        let attendee = Actor::new(app.attendee.id, Role::Attendee);
        app.state
            .recorder()
            .submit_scan(&attendee, &started.first_token, app.state.now())
            .await
            .unwrap();

        let marked = next_json(&mut ws).await;
        assert_eq!(marked["event"], "attendance.marked");
        assert_eq!(marked["payload"]["user_id"], app.attendee.id);
        assert_eq!(marked["payload"]["attendance_count"], 1);

        let facilitator = Actor::new(app.facilitator.id, Role::Facilitator);
        assert!(app.state.sessions().stop(&facilitator, app.state.now()).await.unwrap());

        let stopped = next_json(&mut ws).await;
        assert_eq!(stopped["event"], "attendance.session_stopped");
        assert_eq!(stopped["payload"]["reason"], "manual");
    }

    #[tokio::test]
    #[serial]
    async fn inactive_session_reports_inactive() {
        let app = make_test_app().await;
        let addr = spawn_server(app.router.clone()).await;

        let (mut ws, _) = connect_ws(
            &addr.to_string(),
            "attendance/sessions/404",
            Some(app.facilitator_token().as_str()),
        )
        .await
        .unwrap();

        let frame = next_json(&mut ws).await;
        assert_eq!(frame["event"], "attendance.session_inactive");
        assert_eq!(frame["payload"]["session_id"], 404);
    }

    #[tokio::test]
    #[serial]
    async fn attendee_and_anonymous_cannot_open_the_display() {
        let app = make_test_app().await;
        let started = start_session(&app).await;
        let addr = spawn_server(app.router.clone()).await;
        let path = format!("attendance/sessions/{}", started.session_id);

        match connect_ws(&addr.to_string(), &path, Some(app.attendee_token().as_str())).await {
            Err(Error::Http(resp)) => assert_eq!(resp.status(), 403),
            Err(e) => panic!("expected 403, got {e}"),
            Ok(_) => panic!("attendee opened the display"),
        }

        match connect_ws(&addr.to_string(), &path, None).await {
            Err(Error::Http(resp)) => assert_eq!(resp.status(), 401),
            Err(e) => panic!("expected 401, got {e}"),
            Ok(_) => panic!("anonymous client opened the display"),
        }
    }
}
