//! 消息类型定义
//!
//! 客户端与服务端之间的 JSON 帧，统一使用 `{"type": ..., ...}` 信封。

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::piece::{PromotionPiece, Side, Square};

/// 玩家 ID（客户端生成的 UUID 字符串）
pub type PlayerId = String;

/// 房间 ID
pub type GameId = String;

/// 对局状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// 等待玩家加入
    #[default]
    Waiting,
    /// 对局进行中
    Playing,
    /// 对局结束
    Finished,
    /// 连接断开
    Disconnected,
    /// 连接出错
    Error,
}

/// 走法意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub from: Square,
    pub to: Square,
    /// 仅在兵到达底线时非空
    pub promotion: Option<PromotionPiece>,
}

/// 服务端下发的完整对局快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub fen: String,
    pub status: GameStatus,
    #[serde(serialize_with = "serialize_turn", deserialize_with = "deserialize_turn")]
    pub turn: Side,
    #[serde(default)]
    pub white_player_id: Option<PlayerId>,
    #[serde(default)]
    pub black_player_id: Option<PlayerId>,
    #[serde(default)]
    pub move_history: Vec<String>,
}

/// 服务端使用 python-chess 的布尔值表示走子方（true 为白方），
/// 同时兼容 "w"/"b"/"white"/"black"。
#[derive(Deserialize)]
#[serde(untagged)]
enum TurnRepr {
    Flag(bool),
    Name(String),
}

fn deserialize_turn<'de, D>(deserializer: D) -> Result<Side, D::Error>
where
    D: Deserializer<'de>,
{
    match TurnRepr::deserialize(deserializer)? {
        TurnRepr::Flag(true) => Ok(Side::White),
        TurnRepr::Flag(false) => Ok(Side::Black),
        TurnRepr::Name(name) => Side::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid turn: {name:?}"))),
    }
}

fn serialize_turn<S>(turn: &Side, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_bool(*turn == Side::White)
}

/// 对局结束原因
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameOverReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    Draw,
    OpponentDisconnected,
    /// 未知原因，保留原始字符串
    Other(String),
}

impl From<String> for GameOverReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "checkmate" => GameOverReason::Checkmate,
            "stalemate" => GameOverReason::Stalemate,
            "insufficient_material" => GameOverReason::InsufficientMaterial,
            "draw" => GameOverReason::Draw,
            "opponent_disconnected" => GameOverReason::OpponentDisconnected,
            _ => GameOverReason::Other(value),
        }
    }
}

impl From<GameOverReason> for String {
    fn from(reason: GameOverReason) -> Self {
        match reason {
            GameOverReason::Checkmate => "checkmate".to_string(),
            GameOverReason::Stalemate => "stalemate".to_string(),
            GameOverReason::InsufficientMaterial => "insufficient_material".to_string(),
            GameOverReason::Draw => "draw".to_string(),
            GameOverReason::OpponentDisconnected => "opponent_disconnected".to_string(),
            GameOverReason::Other(other) => other,
        }
    }
}

/// 对局结束信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GameOverFrame", into = "GameOverFrame")]
pub struct GameOver {
    pub reason: GameOverReason,
    pub winner: Option<Side>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GameOverBody {
    reason: Option<GameOverReason>,
    #[serde(default)]
    winner: Option<Side>,
}

/// `game_over` 帧的两种形态：`data` 包裹，或字段直接位于顶层
/// （服务端在对手断线时使用后者）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GameOverFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<GameOverBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<GameOverReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    winner: Option<Side>,
}

impl TryFrom<GameOverFrame> for GameOver {
    type Error = String;

    fn try_from(frame: GameOverFrame) -> Result<Self, Self::Error> {
        let body = frame.data.unwrap_or_default();
        let reason = body
            .reason
            .or(frame.reason)
            .ok_or_else(|| "game_over frame without reason".to_string())?;
        Ok(GameOver {
            reason,
            winner: body.winner.or(frame.winner),
        })
    }
}

impl From<GameOver> for GameOverFrame {
    fn from(over: GameOver) -> Self {
        GameOverFrame {
            data: Some(GameOverBody {
                reason: Some(over.reason),
                winner: over.winner,
            }),
            reason: None,
            winner: None,
        }
    }
}

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 加入房间
    JoinGame { game_id: GameId, player_id: PlayerId },
    /// 走棋
    MakeMove {
        game_id: GameId,
        player_id: PlayerId,
        #[serde(rename = "move")]
        chess_move: MoveIntent,
    },
    /// 认输
    Resign {
        game_id: GameId,
        player_id: PlayerId,
        color: Option<Side>,
    },
    /// 提和
    ProposeDraw {
        game_id: GameId,
        player_id: PlayerId,
        color: Option<Side>,
    },
}

impl ClientMessage {
    /// 消息类型名（与线上 `type` 字段一致）
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::JoinGame { .. } => "join_game",
            ClientMessage::MakeMove { .. } => "make_move",
            ClientMessage::Resign { .. } => "resign",
            ClientMessage::ProposeDraw { .. } => "propose_draw",
        }
    }
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 分配执棋方
    PlayerColor { color: Side },
    /// 完整对局快照
    GameState { data: GameSnapshot },
    /// 对局结束
    GameOver(GameOver),
    /// 服务端拒绝了之前的请求
    Error { message: String },
    /// 无法识别的消息类型
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// 消息类型名（与线上 `type` 字段一致）
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::PlayerColor { .. } => "player_color",
            ServerMessage::GameState { .. } => "game_state",
            ServerMessage::GameOver(_) => "game_over",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_join_game_wire_shape() {
        let msg = ClientMessage::JoinGame {
            game_id: "mychessgame".to_string(),
            player_id: "p-1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "join_game", "data": {"game_id": "mychessgame", "player_id": "p-1"}})
        );
    }

    #[test]
    fn test_make_move_wire_shape() {
        let msg = ClientMessage::MakeMove {
            game_id: "g".to_string(),
            player_id: "p".to_string(),
            chess_move: MoveIntent {
                from: sq("e2"),
                to: sq("e4"),
                promotion: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "make_move",
                "data": {
                    "game_id": "g",
                    "player_id": "p",
                    "move": {"from": "e2", "to": "e4", "promotion": null}
                }
            })
        );

        let promo = MoveIntent {
            from: sq("a7"),
            to: sq("a8"),
            promotion: Some(PromotionPiece::Queen),
        };
        assert_eq!(
            serde_json::to_value(promo).unwrap(),
            json!({"from": "a7", "to": "a8", "promotion": "q"})
        );
    }

    #[test]
    fn test_resign_and_draw_carry_color() {
        let resign = ClientMessage::Resign {
            game_id: "g".to_string(),
            player_id: "p".to_string(),
            color: Some(Side::Black),
        };
        assert_eq!(
            serde_json::to_value(&resign).unwrap(),
            json!({"type": "resign", "data": {"game_id": "g", "player_id": "p", "color": "black"}})
        );

        let draw = ClientMessage::ProposeDraw {
            game_id: "g".to_string(),
            player_id: "p".to_string(),
            color: None,
        };
        assert_eq!(
            serde_json::to_value(&draw).unwrap(),
            json!({"type": "propose_draw", "data": {"game_id": "g", "player_id": "p", "color": null}})
        );
    }

    #[test]
    fn test_player_color_frame() {
        let msg: ServerMessage = serde_json::from_value(json!({"type": "player_color", "color": "black"})).unwrap();
        assert_eq!(msg, ServerMessage::PlayerColor { color: Side::Black });
    }

    #[test]
    fn test_game_state_frame_with_boolean_turn() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "type": "game_state",
            "data": {
                "fen": "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
                "turn": false,
                "status": "playing",
                "white_player_id": "w1",
                "black_player_id": "b1",
                "move_history": ["e4"]
            }
        }))
        .unwrap();

        let ServerMessage::GameState { data } = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(data.turn, Side::Black);
        assert_eq!(data.status, GameStatus::Playing);
        assert_eq!(data.white_player_id.as_deref(), Some("w1"));
        assert_eq!(data.move_history, vec!["e4".to_string()]);
    }

    #[test]
    fn test_game_state_frame_tolerates_missing_fields() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "type": "game_state",
            "data": {"fen": "8/8/8/8/8/8/8/8 w - - 0 1", "turn": "w", "status": "waiting"}
        }))
        .unwrap();

        let ServerMessage::GameState { data } = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(data.turn, Side::White);
        assert!(data.white_player_id.is_none());
        assert!(data.move_history.is_empty());
    }

    #[test]
    fn test_snapshot_turn_serializes_as_bool() {
        let snapshot = GameSnapshot {
            fen: "8/8/8/8/8/8/8/8 w - - 0 1".to_string(),
            status: GameStatus::Waiting,
            turn: Side::White,
            white_player_id: None,
            black_player_id: None,
            move_history: Vec::new(),
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["turn"], json!(true));
    }

    #[test]
    fn test_game_over_nested_and_flat() {
        let nested: ServerMessage = serde_json::from_value(json!({
            "type": "game_over",
            "data": {"reason": "checkmate", "winner": "white"}
        }))
        .unwrap();
        assert_eq!(
            nested,
            ServerMessage::GameOver(GameOver {
                reason: GameOverReason::Checkmate,
                winner: Some(Side::White),
            })
        );

        let flat: ServerMessage = serde_json::from_value(json!({
            "type": "game_over",
            "reason": "opponent_disconnected",
            "winner": "black"
        }))
        .unwrap();
        assert_eq!(
            flat,
            ServerMessage::GameOver(GameOver {
                reason: GameOverReason::OpponentDisconnected,
                winner: Some(Side::Black),
            })
        );

        let no_winner: ServerMessage = serde_json::from_value(json!({
            "type": "game_over",
            "data": {"reason": "stalemate"}
        }))
        .unwrap();
        assert_eq!(
            no_winner,
            ServerMessage::GameOver(GameOver {
                reason: GameOverReason::Stalemate,
                winner: None,
            })
        );
    }

    #[test]
    fn test_game_over_unknown_reason_is_other() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "type": "game_over",
            "data": {"reason": "resignation", "winner": null}
        }))
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::GameOver(GameOver {
                reason: GameOverReason::Other("resignation".to_string()),
                winner: None,
            })
        );
    }

    #[test]
    fn test_error_and_unknown_frames() {
        let err: ServerMessage = serde_json::from_value(json!({"type": "error", "message": "Movimento ilegal."})).unwrap();
        assert_eq!(
            err,
            ServerMessage::Error {
                message: "Movimento ilegal.".to_string()
            }
        );

        let unknown: ServerMessage = serde_json::from_value(json!({"type": "chat", "data": {"text": "oi"}})).unwrap();
        assert_eq!(unknown, ServerMessage::Unknown);
    }
}
