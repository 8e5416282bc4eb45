//! 错误类型定义

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket 错误
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 无效的格子记号
    #[error("Invalid square: {0:?}")]
    InvalidSquare(String),

    /// 无效的升变棋子
    #[error("Invalid promotion piece: {0:?}")]
    InvalidPromotion(String),

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 尚未连接
    #[error("Not connected")]
    NotConnected,
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
