//! WebSocket implementation of the [`FeedTransport`] port.
//!
//! Moves frames only: binary and text payloads are handed to the shard
//! untouched, protocol-level pings are answered here.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace};

use super::dto::{PingMessage, PongMessage, SubscribeRequest};
use crate::domain::Market;
use crate::error::{Error, Result};
use crate::port::{FeedFrame, FeedTransport, OutboundMessage, TransportFactory};

/// One WebSocket connection to the exchange feed.
pub struct WebSocketTransport {
    url: String,
    market: Market,
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl WebSocketTransport {
    #[must_use]
    pub fn new(url: String, market: Market) -> Self {
        Self {
            url,
            market,
            ws: None,
        }
    }

    /// Factory creating a fresh transport per (re)connect, picking the URL
    /// by market.
    #[must_use]
    pub fn factory(spot_url: String, futures_url: String) -> TransportFactory {
        std::sync::Arc::new(move |market| {
            let url = match market {
                Market::Spot => spot_url.clone(),
                Market::Futures => futures_url.clone(),
            };
            Box::new(Self::new(url, market)) as Box<dyn FeedTransport>
        })
    }

    fn socket(&mut self) -> Result<&mut WebSocketStream<MaybeTlsStream<TcpStream>>> {
        self.ws
            .as_mut()
            .ok_or_else(|| Error::Connection("Not connected".into()))
    }
}

#[async_trait]
impl FeedTransport for WebSocketTransport {
    async fn connect(&mut self) -> Result<()> {
        info!(url = %self.url, market = %self.market, "Connecting to WebSocket");
        let (ws_stream, response) = connect_async(&self.url).await?;
        info!(status = %response.status(), market = %self.market, "WebSocket connected");
        self.ws = Some(ws_stream);
        Ok(())
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<()> {
        let texts = match message {
            OutboundMessage::Subscribe {
                market,
                pairs,
                request_id,
            } => {
                // Log a truncated view of pairs to avoid spam
                let preview: Vec<_> = pairs.iter().take(5).map(|p| p.as_str()).collect();
                info!(
                    market = %market,
                    pairs = ?preview,
                    total = pairs.len(),
                    "Subscribing to pairs"
                );
                pairs
                    .iter()
                    .enumerate()
                    .map(|(n, pair)| {
                        serde_json::to_string(&SubscribeRequest::new(
                            market,
                            pair,
                            format!("{request_id}-{n}"),
                        ))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
            OutboundMessage::Ping(ping) => vec![serde_json::to_string(&PingMessage { ping })?],
            OutboundMessage::Pong(pong) => vec![serde_json::to_string(&PongMessage { pong })?],
        };

        let ws = self.socket()?;
        for text in texts {
            ws.send(Message::Text(text)).await?;
        }
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<FeedFrame> {
        let ws = self.ws.as_mut()?;

        loop {
            match ws.next().await? {
                Ok(Message::Binary(bytes)) => {
                    trace!(bytes = bytes.len(), "Received WebSocket binary frame");
                    return Some(FeedFrame::Binary(bytes));
                }
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "Received WebSocket text frame");
                    return Some(FeedFrame::Text(text));
                }
                Ok(Message::Ping(data)) => {
                    trace!("Received WebSocket ping");
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        return Some(FeedFrame::Closed {
                            reason: format!("failed to send pong: {e}"),
                        });
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "WebSocket closed by server");
                    return Some(FeedFrame::Closed {
                        reason: frame.map(|f| f.reason.to_string()).unwrap_or_default(),
                    });
                }
                Ok(_) => continue,
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    return Some(FeedFrame::Closed {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            if let Err(e) = ws.close(None).await {
                debug!(error = %e, "WebSocket close handshake failed");
            }
        }
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_before_connect_is_connection_error() {
        let mut transport = WebSocketTransport::new("wss://example.invalid/ws".into(), Market::Spot);
        let result = transport.send(OutboundMessage::Ping(1)).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn next_frame_before_connect_is_none() {
        let mut transport = WebSocketTransport::new("wss://example.invalid/ws".into(), Market::Futures);
        assert!(transport.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn close_without_connection_is_noop() {
        let mut transport = WebSocketTransport::new("wss://example.invalid/ws".into(), Market::Spot);
        transport.close().await;
        assert_eq!(transport.name(), "websocket");
    }

    #[test]
    fn factory_builds_transport_per_market() {
        let factory = WebSocketTransport::factory("wss://spot".into(), "wss://futures".into());
        let spot = factory(Market::Spot);
        let futures = factory(Market::Futures);
        assert_eq!(spot.name(), "websocket");
        assert_eq!(futures.name(), "websocket");
    }
}
