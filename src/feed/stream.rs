//! Client for the vendor's live pool stream.
//!
//! One connection subscribes to the "recent" channel for the configured partner
//! configs; every pushed batch of events is reconciled into the [`FeedStore`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::FeedConfig;
use crate::error::Result;
use crate::metrics;
use crate::models::FeedUpdate;
use super::store::FeedStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeFilters {
    pub partner_configs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscribeMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub filters: SubscribeFilters,
}

impl SubscribeMessage {
    pub fn recent(partner_configs: Vec<String>) -> Self {
        Self {
            msg_type: "subscribe:recent".to_string(),
            filters: SubscribeFilters { partner_configs },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[serde(default)]
    data: Option<Vec<Value>>,
}

/// Decodes one text frame into its events. Frames without `data` yield an
/// empty batch; events that do not decode are dropped individually.
pub fn parse_message(text: &str) -> Result<Vec<FeedUpdate>> {
    let envelope: StreamEnvelope = serde_json::from_str(text)?;
    let Some(raw) = envelope.data else {
        return Ok(Vec::new());
    };

    let mut updates = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<FeedUpdate>(value) {
            Ok(update) => updates.push(update),
            Err(e) => {
                metrics::FEED_MESSAGES_DROPPED.inc();
                debug!("Skipping undecodable stream event: {}", e);
            }
        }
    }
    Ok(updates)
}

pub struct FeedStream {
    config: FeedConfig,
    store: Arc<FeedStore>,
}

impl FeedStream {
    pub fn new(config: FeedConfig, store: Arc<FeedStore>) -> Self {
        Self { config, store }
    }

    /// Keeps a connection open until `shutdown` flips to true, reconnecting
    /// after `reconnect_delay_secs` whenever the stream drops.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let delay = Duration::from_secs(self.config.reconnect_delay_secs.max(1));

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                result = self.connect_once() => {
                    if let Err(e) = result {
                        error!("Feed stream error: {}", e);
                    }
                }
                _ = shutdown.changed() => break,
            }
            self.store.set_connected(false);

            warn!("Feed stream disconnected, reconnecting in {}s", delay.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.store.set_connected(false);
        info!("Feed stream stopped");
    }

    async fn connect_once(&self) -> Result<()> {
        info!("Connecting to feed stream {}", self.config.stream_url);
        let (ws_stream, _) = connect_async(self.config.stream_url.as_str()).await?;
        let (mut sender, mut receiver) = ws_stream.split();

        let subscribe = SubscribeMessage::recent(self.config.partner_configs.clone());
        sender
            .send(Message::Text(serde_json::to_string(&subscribe)?))
            .await?;
        self.store.set_connected(true);
        info!("Feed stream connected");

        while let Some(message) = receiver.next().await {
            match message? {
                Message::Text(text) => self.handle_text(&text).await,
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => self.handle_text(&text).await,
                    Err(_) => metrics::FEED_MESSAGES_DROPPED.inc(),
                },
                Message::Ping(payload) => sender.send(Message::Pong(payload)).await?,
                Message::Close(frame) => {
                    info!("Feed stream closed by server: {:?}", frame);
                    break;
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn handle_text(&self, text: &str) {
        match parse_message(text) {
            Ok(updates) if updates.is_empty() => {}
            Ok(updates) => {
                debug!("Applying {} stream events", updates.len());
                self.store.apply(&updates).await;
            }
            Err(e) => {
                metrics::FEED_MESSAGES_DROPPED.inc();
                error!("Failed to parse stream message: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateKind;
    use tokio::net::TcpListener;
    use tokio::time::{sleep, timeout};
    use tokio_tungstenite::{accept_async, WebSocketStream};

    const WAIT: Duration = Duration::from_secs(5);

    async fn accept_client(listener: &TcpListener) -> WebSocketStream<tokio::net::TcpStream> {
        let (tcp, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        accept_async(tcp).await.unwrap()
    }

    async fn next_message(ws: &mut WebSocketStream<tokio::net::TcpStream>) -> Message {
        timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap()
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        timeout(WAIT, async {
            while !condition() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_subscribe_message_shape() {
        let msg = SubscribeMessage::recent(vec!["cfg".to_string()]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "subscribe:recent", "filters": {"partnerConfigs": ["cfg"]}})
        );
    }

    #[test]
    fn test_parse_message_with_events() {
        let updates = parse_message(
            r#"{"data":[{"type":"new","pool":{"id":"a"}},{"type":"bogus","pool":{"id":"b"}},{"type":"update","pool":{"id":"c"}}]}"#,
        )
        .unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].kind, UpdateKind::New);
        assert_eq!(updates[1].pool.id, "c");
    }

    #[test]
    fn test_parse_message_without_data() {
        assert!(parse_message(r#"{"type":"ack"}"#).unwrap().is_empty());
        assert!(parse_message(r#"{"data":null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_message_invalid_json() {
        assert!(parse_message("not json").is_err());
    }

    #[tokio::test]
    async fn test_handle_text_applies_to_store() {
        let store = Arc::new(FeedStore::new(None));
        let stream = FeedStream::new(FeedConfig::default(), store.clone());
        stream
            .handle_text(r#"{"data":[{"type":"graduated","pool":{"id":"g"}}]}"#)
            .await;
        stream.handle_text("garbage").await;
        assert_eq!(store.snapshot().await.graduated.len(), 1);
    }

    #[tokio::test]
    async fn test_run_subscribes_reconnects_and_stops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = FeedConfig {
            stream_url: format!("ws://{}", listener.local_addr().unwrap()),
            partner_configs: vec!["cfg".to_string()],
            priority_token: None,
            reconnect_delay_secs: 1,
        };
        let store = Arc::new(FeedStore::new(None));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(FeedStream::new(config, store.clone()).run(shutdown_rx));

        let mut server = accept_client(&listener).await;
        let subscribe: Value = serde_json::from_str(next_message(&mut server).await.to_text().unwrap()).unwrap();
        assert_eq!(subscribe["type"], "subscribe:recent");
        assert_eq!(subscribe["filters"]["partnerConfigs"], serde_json::json!(["cfg"]));
        wait_for(|| store.is_connected()).await;

        server.send(Message::Ping(vec![1, 2, 3])).await.unwrap();
        assert_eq!(next_message(&mut server).await, Message::Pong(vec![1, 2, 3]));

        server
            .send(Message::Text(r#"{"data":[{"type":"new","pool":{"id":"a"}}]}"#.to_string()))
            .await
            .unwrap();
        timeout(WAIT, async {
            while store.snapshot().await.recent.is_empty() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(store.snapshot().await.recent[0].id, "a");

        // Dropping the socket without a close frame forces a reconnect.
        drop(server);
        let mut server = accept_client(&listener).await;
        let resubscribe = next_message(&mut server).await;
        assert!(resubscribe.to_text().unwrap().contains("subscribe:recent"));
        wait_for(|| store.is_connected()).await;

        shutdown_tx.send(true).unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap();
        assert!(!store.is_connected());
    }
}
