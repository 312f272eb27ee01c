//! Discord gateway client implementation

use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{debug, error, info, warn};

use super::types::{
    DiscordError, GatewayEvent, GatewayPayload, Hello, Interaction, Message, Ready, opcode,
    truncate_chars,
};

/// Close codes after which reconnecting cannot succeed
const FATAL_CLOSE_CODES: &[u16] = &[4004, 4010, 4011, 4012, 4013, 4014];

/// How a single gateway session ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionEnd {
    Reconnect,
    Shutdown,
    Fatal(String),
}

/// Discord gateway client
pub struct DiscordGateway {
    url: String,
    token: String,
    intents: u64,
    event_tx: mpsc::Sender<GatewayEvent>,
}

impl DiscordGateway {
    /// Create a new gateway client and the receiver its events are delivered on
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        intents: u64,
    ) -> (Self, mpsc::Receiver<GatewayEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);

        let gateway = Self {
            url: url.into(),
            token: token.into(),
            intents,
            event_tx,
        };

        (gateway, event_rx)
    }

    /// Keep a session open until shutdown, reconnecting with exponential backoff
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        };

        loop {
            let delay = match self.run_session(&mut shutdown_rx).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Fatal(reason)) => {
                    error!("Gateway session cannot be resumed: {}", reason);
                    break;
                }
                Ok(SessionEnd::Reconnect) => {
                    backoff.reset();
                    info!("Gateway asked for a reconnect");
                    Duration::from_secs(1)
                }
                Err(e) => {
                    let delay = backoff.next_backoff().unwrap_or(backoff.max_interval);
                    warn!("Gateway session failed: {}, retrying in {:?}", e, delay);
                    delay
                }
            };

            if self.event_tx.is_closed() {
                debug!("Gateway event receiver dropped, stopping");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.changed() => break,
            }
        }

        info!("Gateway client stopped");
    }

    async fn run_session(
        &self,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, DiscordError> {
        let url = format!("{}/?v=10&encoding=json", self.url.trim_end_matches('/'));
        let (ws_stream, _) = connect_async(&url)
            .await
            .map_err(|e| DiscordError::Gateway(format!("Failed to connect: {}", e)))?;
        info!("Connected to Discord gateway at {}", self.url);

        let (mut sink, mut stream) = ws_stream.split();

        let hello = Self::read_hello(&mut stream).await?;
        let interval = Duration::from_millis(hello.heartbeat_interval);
        debug!("Gateway heartbeat interval is {:?}", interval);

        let identify = self.identify_payload();
        sink.send(WsMessage::Text(identify.to_string()))
            .await
            .map_err(|e| DiscordError::Gateway(format!("Failed to identify: {}", e)))?;

        let mut sequence: Option<u64> = None;
        let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    let beat = json!({ "op": opcode::HEARTBEAT, "d": sequence });
                    sink.send(WsMessage::Text(beat.to_string()))
                        .await
                        .map_err(|e| DiscordError::Gateway(format!("Failed to send heartbeat: {}", e)))?;
                }

                message = stream.next() => {
                    match message {
                        Some(Ok(WsMessage::Text(text))) => {
                            let Some(payload) = decode_frame(&text) else {
                                continue;
                            };
                            if let Some(s) = payload.s {
                                sequence = Some(s);
                            }

                            match payload.op {
                                opcode::DISPATCH => {
                                    let event_name = payload.t.as_deref().unwrap_or_default();
                                    let data = payload.d.unwrap_or_default();
                                    match parse_dispatch(event_name, data) {
                                        Ok(Some(event)) => {
                                            if self.event_tx.send(event).await.is_err() {
                                                return Ok(SessionEnd::Shutdown);
                                            }
                                        }
                                        Ok(None) => debug!("Ignoring gateway dispatch {}", event_name),
                                        Err(e) => warn!("Failed to parse {} dispatch: {}", event_name, e),
                                    }
                                }
                                opcode::HEARTBEAT => {
                                    let beat = json!({ "op": opcode::HEARTBEAT, "d": sequence });
                                    sink.send(WsMessage::Text(beat.to_string()))
                                        .await
                                        .map_err(|e| DiscordError::Gateway(format!("Failed to send heartbeat: {}", e)))?;
                                }
                                opcode::HEARTBEAT_ACK => debug!("Heartbeat acknowledged"),
                                opcode::RECONNECT | opcode::INVALID_SESSION => {
                                    info!("Gateway requested a new session (op {})", payload.op);
                                    return Ok(SessionEnd::Reconnect);
                                }
                                other => debug!("Unhandled gateway opcode {}", other),
                            }
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            if let Some(frame) = frame {
                                let code = u16::from(frame.code);
                                if FATAL_CLOSE_CODES.contains(&code) {
                                    return Ok(SessionEnd::Fatal(format!("close code {}: {}", code, frame.reason)));
                                }
                                info!("Gateway closed the connection ({}): {}", code, frame.reason);
                            }
                            return Ok(SessionEnd::Reconnect);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(DiscordError::Gateway(format!("WebSocket message error: {}", e)));
                        }
                        None => {
                            info!("Gateway connection closed");
                            return Ok(SessionEnd::Reconnect);
                        }
                    }
                }

                _ = shutdown_rx.changed() => {
                    info!("Received shutdown signal, closing gateway connection");
                    if let Err(e) = sink.close().await {
                        warn!("Error closing gateway connection: {}", e);
                    }
                    return Ok(SessionEnd::Shutdown);
                }
            }
        }
    }

    /// Wait for HELLO, which Discord always sends first
    async fn read_hello<S>(stream: &mut S) -> Result<Hello, DiscordError>
    where
        S: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        while let Some(message) = stream.next().await {
            let message =
                message.map_err(|e| DiscordError::Gateway(format!("WebSocket message error: {}", e)))?;
            if let WsMessage::Text(text) = message {
                let payload: GatewayPayload = serde_json::from_str(&text)?;
                if payload.op == opcode::HELLO {
                    let hello: Hello = serde_json::from_value(payload.d.unwrap_or_default())?;
                    return Ok(hello);
                }
                debug!("Skipping opcode {} before HELLO", payload.op);
            }
        }
        Err(DiscordError::Gateway("Connection closed before HELLO".to_string()))
    }

    fn identify_payload(&self) -> serde_json::Value {
        json!({
            "op": opcode::IDENTIFY,
            "d": {
                "token": self.token,
                "intents": self.intents,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": env!("CARGO_PKG_NAME"),
                    "device": env!("CARGO_PKG_NAME"),
                }
            }
        })
    }
}

/// Decode one text frame. A frame that isn't a gateway payload is logged and
/// skipped so it cannot end the session.
fn decode_frame(text: &str) -> Option<GatewayPayload> {
    match serde_json::from_str(text) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(
                "Ignoring malformed gateway frame ({}): {}",
                e,
                truncate_chars(text, 120)
            );
            None
        }
    }
}

/// Classify a dispatch by event name; events the bot doesn't use yield `None`
pub fn parse_dispatch(
    event_name: &str,
    data: serde_json::Value,
) -> Result<Option<GatewayEvent>, DiscordError> {
    let event = match event_name {
        "READY" => GatewayEvent::Ready(serde_json::from_value::<Ready>(data)?),
        "MESSAGE_CREATE" => GatewayEvent::MessageCreate(serde_json::from_value::<Message>(data)?),
        "INTERACTION_CREATE" => {
            GatewayEvent::InteractionCreate(serde_json::from_value::<Interaction>(data)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}
