//! `/api/combat/{id}/ws`: pushes combat-state updates as they happen
//! instead of making the client poll `GET /api/combat/{id}`. Plain
//! delivery infrastructure for the discrete turn events the simulator
//! already produces; it does not touch client-side animation pacing.

use crate::context::AppContext;
use crate::http::handlers::combat::CombatStateView;
use crate::http::middleware::AuthUser;
use crate::ids::CombatId;
use crate::models::combat::CombatState;
use crate::store::ephemeral::keys;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn combat_ws(
    ws: WebSocketUpgrade,
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(combat_id): Path<CombatId>,
) -> Response {
    ws.on_upgrade(move |socket| stream_combat(socket, ctx, user_id, combat_id))
}

async fn stream_combat(mut socket: WebSocket, ctx: AppContext, user_id: crate::ids::UserId, combat_id: CombatId) {
    let mut last_version = None;
    loop {
        let state: Option<CombatState> = match crate::store::ephemeral::traits::get_json(ctx.cache.as_ref(), &keys::combat(combat_id)).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(combat_id = %combat_id, error = ?e, "combat ws read failed");
                break;
            }
        };

        let Some(state) = state else {
            let _ = socket.send(Message::Close(None)).await;
            break;
        };
        if state.owner != user_id {
            let _ = socket.send(Message::Close(None)).await;
            break;
        }

        if last_version != Some(state.version) {
            let view = CombatStateView::from(&state);
            let Ok(payload) = serde_json::to_string(&view) else { break };
            if socket.send(Message::Text(payload)).await.is_err() {
                break;
            }
            last_version = Some(state.version);
        }

        if state.is_terminal() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}
