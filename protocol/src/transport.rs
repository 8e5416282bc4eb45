//! 传输层抽象
//!
//! 提供 Connector/Connection traits 使上层协议与具体传输实现解耦，
//! 当前实现为基于 `tokio-tungstenite` 的 WebSocket 文本帧。

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::constants::MAX_FRAME_SIZE;
use crate::error::{ProtocolError, Result};
use crate::message::ServerMessage;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 连接抽象 trait（核心抽象，用于业务层）
///
/// 读写两端分离后可在同一个 `select!` 中并发收发。
pub trait Connection: Send {
    /// 分离读写端
    fn split(self) -> (FrameReader, FrameWriter);

    /// 获取远端地址
    fn peer_addr(&self) -> Option<String>;
}

/// 连接器 trait（客户端使用）
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// 建立连接
    async fn connect(&self, url: &str) -> Result<Self::Conn>;
}

/// WebSocket 连接器
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    type Conn = WsConnection;

    async fn connect(&self, url: &str) -> Result<Self::Conn> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;

        let peer_addr = match stream.get_ref() {
            MaybeTlsStream::Plain(tcp) => tcp.peer_addr().ok().map(|a| a.to_string()),
            _ => None,
        };
        let (sink, stream) = stream.split();

        tracing::debug!(url, "WebSocket handshake complete");

        Ok(WsConnection {
            reader: FrameReader::new(stream),
            writer: FrameWriter::new(sink),
            peer_addr,
        })
    }
}

/// WebSocket 连接
pub struct WsConnection {
    reader: FrameReader,
    writer: FrameWriter,
    peer_addr: Option<String>,
}

impl Connection for WsConnection {
    fn split(self) -> (FrameReader, FrameWriter) {
        (self.reader, self.writer)
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

// ============================================================================
// 帧编解码
// ============================================================================

/// 将消息编码为 JSON 文本
pub fn encode_frame<M: Serialize>(msg: &M) -> Result<String> {
    let payload = serde_json::to_string(msg)?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(payload)
}

/// 解码服务端文本帧
///
/// 无法识别的 `type` 解码为 [`ServerMessage::Unknown`] 并记录日志；
/// 非法 JSON 或缺少 `type` 字段返回错误。
pub fn decode_server_frame(text: &str) -> Result<ServerMessage> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: text.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let msg: ServerMessage = serde_json::from_str(text)?;
    if msg == ServerMessage::Unknown {
        let kind = serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_owned))
            .unwrap_or_default();
        tracing::warn!(kind = %kind, "Unrecognized server frame type");
    }
    Ok(msg)
}

/// 帧读取器
pub struct FrameReader {
    stream: SplitStream<WsStream>,
}

impl FrameReader {
    fn new(stream: SplitStream<WsStream>) -> Self {
        Self { stream }
    }

    /// 读取下一帧文本，跳过 ping/pong；对端关闭时返回 `None`
    pub async fn read_text(&mut self) -> Result<Option<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Binary(data))) => {
                    let text = String::from_utf8(data.to_vec()).map_err(|e| {
                        ProtocolError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                    })?;
                    return Ok(Some(text));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// 读取并解码一帧服务端消息
    pub async fn read_frame(&mut self) -> Result<Option<ServerMessage>> {
        match self.read_text().await? {
            Some(text) => decode_server_frame(&text).map(Some),
            None => Ok(None),
        }
    }
}

/// 帧写入器
pub struct FrameWriter {
    sink: SplitSink<WsStream, Message>,
}

impl FrameWriter {
    fn new(sink: SplitSink<WsStream, Message>) -> Self {
        Self { sink }
    }

    /// 编码并写入一帧消息
    pub async fn write_frame<M: Serialize>(&mut self, msg: &M) -> Result<()> {
        let payload = encode_frame(msg)?;
        self.sink.send(Message::text(payload)).await?;
        Ok(())
    }

    /// 发送关闭帧
    pub async fn close(&mut self) -> Result<()> {
        match self.sink.close().await {
            Ok(()) => Ok(()),
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed)
            | Err(tokio_tungstenite::tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
