//! Live session channel
//!
//! Each WebSocket connection attaches as one client of the session router.
//! Inbound text frames are parsed as `InboundEvent`s and submitted in
//! arrival order; outbound events from the router are forwarded as JSON.

use super::error::ApiError;
use super::state::AppState;
use crate::router::{InboundEvent, RouterHandle};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

/// GET /interviews/:session_id/ws
pub async fn interview_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    // Unknown sessions are rejected before the upgrade
    let router = state.registry.get(&session_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, router)))
}

async fn handle_socket(socket: WebSocket, router: RouterHandle) {
    let attachment = match router.attach().await {
        Ok(attachment) => attachment,
        Err(e) => {
            warn!("Could not attach to session {}: {}", router.session_id(), e);
            return;
        }
    };
    let client_id = attachment.client_id;
    let mut events = attachment.events;
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket client {} connected to session {}", client_id, router.session_id());

    let mut forward = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to serialize outbound event: {}", e);
                    continue;
                }
            };
            if sender.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let inbound_router = router.clone();
    let mut inbound = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let text = match frame {
                Ok(WsMessage::Text(text)) => text,
                Ok(WsMessage::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("WebSocket receive error: {}", e);
                    break;
                }
            };

            // Rejections are reported to this client as `error` events by the router
            if let Err(e) = inbound_router
                .send(Some(client_id), InboundEvent::parse(&text))
                .await
            {
                debug!("Inbound event not applied: {}", e);
                if inbound_router.is_closed() {
                    break;
                }
            }
        }
    });

    // Whichever side finishes first tears down the other
    tokio::select! {
        _ = &mut forward => inbound.abort(),
        _ = &mut inbound => forward.abort(),
    }

    router.detach(client_id).await;
    info!(
        "WebSocket client {} disconnected from session {}",
        client_id,
        router.session_id()
    );
}
