use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use services::events::TOKEN_ROTATED;
use util::ws::EventEnvelope;
use util::ws::handler_trait::WsHandler;
use util::ws::runtime::WsContext;

use crate::routes::attendance::common::ActiveTokenResponse;
use crate::state::AppState;

pub const SESSION_INACTIVE: &str = "attendance.session_inactive";

/// Messages a display surface may send besides `{"type":"ping"}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttendanceIncoming {
    /// Ask for the token to show right now.
    Current,
}

pub struct AttendanceWsHandler {
    state: AppState,
    session_id: i64,
}

impl AttendanceWsHandler {
    pub fn new(state: AppState, session_id: i64) -> Self {
        Self { state, session_id }
    }

    async fn send_current(&self, ctx: &WsContext) {
        let frame = match self
            .state
            .sessions()
            .active_token(self.session_id, self.state.now())
            .await
        {
            Ok(Some(token)) => envelope(
                ctx,
                TOKEN_ROTATED,
                ActiveTokenResponse::new(self.session_id, token),
            ),
            Ok(None) => envelope(ctx, SESSION_INACTIVE, json!({ "session_id": self.session_id })),
            Err(e) => {
                tracing::warn!(session_id = self.session_id, error = %e, "failed to load current token");
                return;
            }
        };

        if let Some(frame) = frame {
            let _ = ctx.reply_text(frame).await;
        }
    }
}

fn envelope<T: Serialize>(ctx: &WsContext, event: &str, payload: T) -> Option<String> {
    serde_json::to_string(&EventEnvelope {
        r#type: "event",
        event,
        topic: &ctx.topic,
        payload,
        ts: Utc::now().to_rfc3339(),
    })
    .ok()
}

impl WsHandler for AttendanceWsHandler {
    type In = AttendanceIncoming;

    async fn on_open(&self, ctx: &WsContext) {
        self.send_current(ctx).await;
    }

    async fn on_message(&self, ctx: &WsContext, msg: Self::In) {
        match msg {
            AttendanceIncoming::Current => self.send_current(ctx).await,
        }
    }
}
