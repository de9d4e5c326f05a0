//! WebSocket link from an avatar to the relay.

use super::protocol::RelayMessage;
use crate::error::{AvatarError, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound half of an [`AvatarLink`].
pub struct LinkSender {
    write: SplitSink<WsStream, Message>,
}

/// Inbound half of an [`AvatarLink`].
pub struct LinkReceiver {
    read: SplitStream<WsStream>,
}

/// A connected avatar.
pub struct AvatarLink {
    sender: LinkSender,
    receiver: LinkReceiver,
}

impl AvatarLink {
    /// Connect to the relay at `url` (e.g. `ws://127.0.0.1:3002`).
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| AvatarError::Relay(format!("connect {url}: {e}")))?;
        debug!(url, "avatar link connected");
        let (write, read) = ws.split();
        Ok(Self {
            sender: LinkSender { write },
            receiver: LinkReceiver { read },
        })
    }

    /// See [`LinkSender::send_user_message`].
    pub async fn send_user_message(&mut self, text: &str) -> Result<bool> {
        self.sender.send_user_message(text).await
    }

    /// See [`LinkReceiver::next_speech`].
    pub async fn next_speech(&mut self) -> Result<Option<String>> {
        self.receiver.next_speech().await
    }

    /// Separate the halves so reading and writing can run concurrently.
    pub fn split(self) -> (LinkSender, LinkReceiver) {
        (self.sender, self.receiver)
    }
}

impl LinkSender {
    /// Send `text` as a `user_message`. Surrounding whitespace is trimmed;
    /// returns `false` without sending when nothing is left.
    pub async fn send_user_message(&mut self, text: &str) -> Result<bool> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        let json = serde_json::to_string(&RelayMessage::UserMessage {
            text: text.to_owned(),
        })
        .map_err(|e| AvatarError::Protocol(format!("encode user_message: {e}")))?;
        self.write
            .send(Message::Text(json))
            .await
            .map_err(|e| AvatarError::Relay(format!("send: {e}")))?;
        Ok(true)
    }

    /// Send a close frame.
    pub async fn close(&mut self) -> Result<()> {
        self.write
            .close()
            .await
            .map_err(|e| AvatarError::Relay(format!("close: {e}")))
    }
}

impl LinkReceiver {
    /// Wait for the next `avatar_speech` text. Other frames are skipped.
    ///
    /// Returns `Ok(None)` once the relay closes the connection.
    pub async fn next_speech(&mut self) -> Result<Option<String>> {
        while let Some(msg) = self.read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<RelayMessage>(&text) {
                    Ok(RelayMessage::AvatarSpeech { text }) => return Ok(Some(text)),
                    Ok(other) => debug!(?other, "ignoring relay message"),
                    Err(e) => debug!("ignoring unparseable relay frame: {e}"),
                },
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => {}
                Err(e) => return Err(AvatarError::Relay(format!("read: {e}"))),
            }
        }
        Ok(None)
    }
}
