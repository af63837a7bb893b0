//! WebSocket stream of navigation changes.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tracing::debug;

use super::handlers::AppState;
use super::types::{NavigationResponse, WsMessage};

/// WebSocket upgrade handler.
pub async fn navigation_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_message(sink: &mut SplitSink<WebSocket, Message>, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(_) => false,
    }
}

/// Push the current navigation, then every change until either side leaves.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut navigation = state.navigation.clone();

    let initial = WsMessage::Navigation(NavigationResponse::from_state(&navigation.latest()));
    if !send_message(&mut sink, &initial).await {
        return;
    }

    loop {
        tokio::select! {
            changed = navigation.changed() => match changed {
                Ok(gate_state) => {
                    let msg = WsMessage::Navigation(NavigationResponse::from_state(&gate_state));
                    if !send_message(&mut sink, &msg).await {
                        break;
                    }
                }
                Err(_) => {
                    let _ = send_message(&mut sink, &WsMessage::Stopped).await;
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {
                    let err = WsMessage::Error {
                        code: "READ_ONLY".to_string(),
                        message: "navigation stream does not accept messages".to_string(),
                    };
                    if !send_message(&mut sink, &err).await {
                        break;
                    }
                }
            },
        }
    }

    debug!("navigation websocket closed");
}
