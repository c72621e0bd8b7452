//! WebSocket event stream for job updates.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use tonegrab_core::{BatchSummary, JobId, JobKind, JobState, ProgressSnapshot};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Interval between heartbeats on an otherwise idle socket.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket message sent to clients for real-time updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A job was accepted and registered.
    JobStarted {
        job_id: JobId,
        kind: JobKind,
        url: String,
    },
    /// Aggregated download progress for the current item.
    Progress {
        job_id: JobId,
        percent: u8,
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        speed_bytes_per_sec: Option<f64>,
        eta_seconds: Option<u64>,
        status_text: String,
    },
    /// Human-readable status line.
    Status { job_id: JobId, message: String },
    /// Orchestrator state change (e.g., "downloading", "converting").
    State { job_id: JobId, state: JobState },
    /// A playlist item started.
    ItemStarted {
        job_id: JobId,
        index: usize,
        total: usize,
        title: String,
    },
    /// Terminal success. For batches, `path` is the playlist directory.
    Finished { job_id: JobId, path: String },
    /// Terminal failure or cancellation.
    Error { job_id: JobId, message: String },
    /// Counts for a finished playlist, sent before the terminal message.
    BatchComplete {
        job_id: JobId,
        total: usize,
        succeeded: usize,
        failed: usize,
        cancelled: usize,
    },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    /// Label used for the per-type message counter.
    pub fn type_name(&self) -> &'static str {
        match self {
            WsMessage::JobStarted { .. } => "job_started",
            WsMessage::Progress { .. } => "progress",
            WsMessage::Status { .. } => "status",
            WsMessage::State { .. } => "state",
            WsMessage::ItemStarted { .. } => "item_started",
            WsMessage::Finished { .. } => "finished",
            WsMessage::Error { .. } => "error",
            WsMessage::BatchComplete { .. } => "batch_complete",
            WsMessage::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // Send errors only mean no one is listening
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    pub fn job_started(&self, job_id: JobId, kind: JobKind, url: &str) {
        self.broadcast(WsMessage::JobStarted {
            job_id,
            kind,
            url: url.to_string(),
        });
    }

    pub fn progress(&self, job_id: JobId, snapshot: &ProgressSnapshot) {
        self.broadcast(WsMessage::Progress {
            job_id,
            percent: snapshot.percent,
            downloaded_bytes: snapshot.downloaded_bytes,
            total_bytes: snapshot.total_bytes,
            speed_bytes_per_sec: snapshot.speed_bytes_per_sec,
            eta_seconds: snapshot.eta_seconds,
            status_text: snapshot.status_text.clone(),
        });
    }

    pub fn status(&self, job_id: JobId, message: &str) {
        self.broadcast(WsMessage::Status {
            job_id,
            message: message.to_string(),
        });
    }

    pub fn state(&self, job_id: JobId, state: JobState) {
        self.broadcast(WsMessage::State { job_id, state });
    }

    pub fn item_started(&self, job_id: JobId, index: usize, total: usize, title: &str) {
        self.broadcast(WsMessage::ItemStarted {
            job_id,
            index,
            total,
            title: title.to_string(),
        });
    }

    pub fn finished(&self, job_id: JobId, path: &str) {
        self.broadcast(WsMessage::Finished {
            job_id,
            path: path.to_string(),
        });
    }

    pub fn error(&self, job_id: JobId, message: &str) {
        self.broadcast(WsMessage::Error {
            job_id,
            message: message.to_string(),
        });
    }

    pub fn batch_complete(&self, job_id: JobId, summary: BatchSummary) {
        self.broadcast(WsMessage::BatchComplete {
            job_id,
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            cancelled: summary.cancelled,
        });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // The first tick completes immediately
        heartbeat.tick().await;

        loop {
            let msg = tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(msg) => msg,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("WebSocket client lagged, skipped {} messages", n);
                            WS_LAG_EVENTS.inc();
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Broadcast channel closed");
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => WsMessage::Heartbeat {
                    timestamp: chrono::Utc::now().timestamp(),
                },
            };

            WS_MESSAGES_SENT.with_label_values(&[msg.type_name()]).inc();

            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize WsMessage: {}", e);
                }
            }
        }
    });

    // Incoming messages are only drained for close and errors
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Received text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_with_type_tag() {
        let msg = WsMessage::ItemStarted {
            job_id: JobId(3),
            index: 2,
            total: 5,
            title: "Song 2".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "item_started");
        assert_eq!(json["job_id"], 3);
        assert_eq!(json["index"], 2);
        assert_eq!(json["title"], "Song 2");
    }

    #[test]
    fn test_state_uses_snake_case() {
        let msg = WsMessage::State {
            job_id: JobId(1),
            state: JobState::FetchingInfo,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["state"], "fetching_info");
        assert_eq!(msg.type_name(), "state");
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let broadcaster = WsBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();

        broadcaster.status(JobId(9), "Starting download...");

        match rx.recv().await.unwrap() {
            WsMessage::Status { job_id, message } => {
                assert_eq!(job_id, JobId(9));
                assert_eq!(message, "Starting download...");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let broadcaster = WsBroadcaster::default();
        broadcaster.error(JobId(1), "nobody listening");
    }
}
