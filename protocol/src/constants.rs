//! 协议常量定义

/// 棋盘边长（格数）
pub const BOARD_SIZE: u8 = 8;

/// 默认服务器地址
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8765";

/// 默认房间 ID
pub const DEFAULT_GAME_ID: &str = "mychessgame";

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;
