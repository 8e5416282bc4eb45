//! 国际象棋联机共享协议库
//!
//! 包含:
//! - 格子、棋子、阵营等基础类型
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 传输层抽象 (Connector, Connection traits)
//! - WebSocket 文本帧编解码

mod constants;
mod error;
mod message;
mod piece;
mod transport;

pub use constants::*;
pub use error::{ProtocolError, Result};
pub use message::{
    ClientMessage, GameId, GameOver, GameOverReason, GameSnapshot, GameStatus, MoveIntent,
    PlayerId, ServerMessage,
};
pub use piece::{Piece, PieceKind, PromotionPiece, Side, Square};
pub use transport::{
    decode_server_frame, encode_frame, Connection, Connector, FrameReader, FrameWriter,
    WsConnection, WsConnector,
};
