//! 客户端会话状态
//!
//! `ClientGame` 是整个客户端唯一的会话上下文：玩家 ID、房间 ID、阵营、
//! 最新快照、选子状态和待显示的提示都在这里。服务端消息经
//! [`ClientGame::apply_server_message`] 归并进来，重连时整体重建。

use std::collections::VecDeque;

use bevy::prelude::*;
use protocol::{
    ClientMessage, GameId, GameOver, GameOverReason, GameSnapshot, GameStatus, MoveIntent,
    PlayerId, ServerMessage, Side, Square, DEFAULT_GAME_ID,
};

use super::input::InputState;
use super::move_log::{move_log_rows, MoveLogRow};
use super::rules::{RulesAdapter, ShakmatyRules};
use crate::board::BoardView;

/// 提示类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// 本地操作反馈
    Info,
    /// 服务端拒绝
    ServerError,
    /// 对局结束
    GameOver,
}

/// 阻塞式提示，一次显示一条
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// 客户端会话
#[derive(Resource)]
pub struct ClientGame {
    /// 本进程生成的玩家 ID，重连时保留
    pub player_id: PlayerId,
    /// 房间 ID
    pub game_id: GameId,
    /// 服务端分配的阵营
    pub player_side: Option<Side>,
    /// 是否以黑方视角显示
    pub flipped: bool,
    /// 当前对局状态
    pub status: GameStatus,
    /// 最近一次快照
    pub snapshot: Option<GameSnapshot>,
    /// 对局结果
    pub game_over: Option<GameOver>,
    /// 选子状态
    pub input: InputState,
    /// 待显示的提示
    notices: VecDeque<Notice>,
    rules: Box<dyn RulesAdapter>,
}

impl Default for ClientGame {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), DEFAULT_GAME_ID.to_string())
    }
}

impl ClientGame {
    pub fn new(player_id: PlayerId, game_id: GameId) -> Self {
        Self::with_rules(player_id, game_id, Box::new(ShakmatyRules::new()))
    }

    /// 使用指定规则实现创建
    pub fn with_rules(player_id: PlayerId, game_id: GameId, rules: Box<dyn RulesAdapter>) -> Self {
        Self {
            player_id,
            game_id,
            player_side: None,
            flipped: false,
            status: GameStatus::Waiting,
            snapshot: None,
            game_over: None,
            input: InputState::Idle,
            notices: VecDeque::new(),
            rules,
        }
    }

    /// 重连前重建会话，只保留玩家 ID
    pub fn reset_for_reconnect(&mut self, game_id: GameId) {
        let player_id = std::mem::take(&mut self.player_id);
        *self = Self::new(player_id, game_id);
    }

    pub fn rules(&self) -> &dyn RulesAdapter {
        self.rules.as_ref()
    }

    // ========================================================================
    // 服务端消息归并
    // ========================================================================

    /// 归并一条服务端消息
    pub fn apply_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::PlayerColor { color } => self.assign_side(color),
            ServerMessage::GameState { data } => self.apply_snapshot(data),
            ServerMessage::GameOver(over) => self.apply_game_over(over),
            ServerMessage::Error { message } => {
                error!("Server error: {}", message);
                self.push_notice(NoticeKind::ServerError, format!("Erro do servidor: {message}"));
            }
            ServerMessage::Unknown => {
                warn!("Ignoring unrecognized server message");
            }
        }
    }

    fn assign_side(&mut self, side: Side) {
        if let Some(current) = self.player_side {
            warn!(
                "Ignoring repeated color assignment {:?}, already playing {:?}",
                side, current
            );
            return;
        }
        self.player_side = Some(side);
        self.flipped = side == Side::Black;
        info!(
            "Assigned color {}, board flipped: {}",
            side.as_str().to_uppercase(),
            self.flipped
        );
    }

    fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        if let Err(e) = self.rules.load_position(&snapshot.fen) {
            error!("Failed to load position from snapshot: {}", e);
        }
        debug!(
            "Snapshot: status={:?} turn={:?} moves={}",
            snapshot.status,
            snapshot.turn,
            snapshot.move_history.len()
        );

        self.status = snapshot.status;
        if matches!(snapshot.status, GameStatus::Waiting | GameStatus::Playing) {
            self.game_over = None;
        }
        self.snapshot = Some(snapshot);
        self.clear_selection();
    }

    fn apply_game_over(&mut self, over: GameOver) {
        info!("Game over: {:?}, winner {:?}", over.reason, over.winner);
        self.status = GameStatus::Finished;
        self.clear_selection();
        let text = outcome_text(&over);
        self.game_over = Some(over);
        self.push_notice(NoticeKind::GameOver, text);
    }

    /// 连接正常关闭
    pub fn connection_closed(&mut self) {
        self.status = GameStatus::Disconnected;
        self.clear_selection();
    }

    /// 连接出错
    pub fn connection_failed(&mut self) {
        self.status = GameStatus::Error;
        self.clear_selection();
    }

    // ========================================================================
    // 选子
    // ========================================================================

    pub fn selected_square(&self) -> Option<Square> {
        match &self.input {
            InputState::Selecting { from, .. } => Some(*from),
            InputState::AwaitingPromotion { from, .. } => Some(*from),
            InputState::Idle => None,
        }
    }

    pub fn candidates(&self) -> &[Square] {
        match &self.input {
            InputState::Selecting { candidates, .. } => candidates.as_slice(),
            _ => &[],
        }
    }

    pub fn clear_selection(&mut self) {
        self.input = InputState::Idle;
    }

    /// 是否轮到本方走棋
    pub fn is_my_turn(&self) -> bool {
        self.player_side == Some(self.rules.side_to_move())
    }

    /// 绘制视图
    pub fn board_view(&self) -> BoardView<'_> {
        BoardView {
            rules: self.rules.as_ref(),
            selected: self.selected_square(),
            candidates: self.candidates(),
        }
    }

    pub fn toggle_flip(&mut self) {
        self.flipped = !self.flipped;
    }

    // ========================================================================
    // 提示
    // ========================================================================

    pub fn push_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notices.push_back(Notice { kind, text: text.into() });
    }

    /// 当前显示的提示
    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    // ========================================================================
    // 显示文本
    // ========================================================================

    /// 对局状态文本
    pub fn status_text(&self) -> String {
        match self.status {
            GameStatus::Waiting => {
                let snapshot = self.snapshot.as_ref();
                let mut ready = Vec::new();
                if snapshot.is_some_and(|s| s.white_player_id.is_some()) {
                    ready.push("Brancas prontas");
                }
                if snapshot.is_some_and(|s| s.black_player_id.is_some()) {
                    ready.push("Pretas prontas");
                }
                format!("Aguardando jogadores... ({})", ready.join(" "))
            }
            GameStatus::Playing => {
                let turn = self
                    .snapshot
                    .as_ref()
                    .map(|s| s.turn)
                    .unwrap_or_else(|| self.rules.side_to_move());
                if self.player_side == Some(turn) {
                    format!("Turno: {} (Sua vez)", turn.display_name())
                } else {
                    format!("Turno: {}", turn.display_name())
                }
            }
            GameStatus::Finished => "Jogo Finalizado!".to_string(),
            GameStatus::Disconnected => "Desconectado do servidor.".to_string(),
            GameStatus::Error => "Erro de conexão.".to_string(),
        }
    }

    /// 对局结果文本（未结束时为 `None`）
    pub fn outcome_text(&self) -> Option<String> {
        self.game_over.as_ref().map(outcome_text)
    }

    /// 阵营显示
    pub fn side_text(&self) -> String {
        match self.player_side {
            Some(side) => format!("Você é: {}", side.as_str().to_uppercase()),
            None => "Você é: -".to_string(),
        }
    }

    /// 走子记录
    pub fn move_log(&self) -> Vec<MoveLogRow> {
        self.snapshot
            .as_ref()
            .map(|s| move_log_rows(&s.move_history))
            .unwrap_or_default()
    }

    // ========================================================================
    // 出站消息
    // ========================================================================

    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::JoinGame {
            game_id: self.game_id.clone(),
            player_id: self.player_id.clone(),
        }
    }

    pub fn move_message(&self, intent: MoveIntent) -> ClientMessage {
        ClientMessage::MakeMove {
            game_id: self.game_id.clone(),
            player_id: self.player_id.clone(),
            chess_move: intent,
        }
    }

    pub fn resign_message(&self) -> ClientMessage {
        ClientMessage::Resign {
            game_id: self.game_id.clone(),
            player_id: self.player_id.clone(),
            color: self.player_side,
        }
    }

    pub fn draw_message(&self) -> ClientMessage {
        ClientMessage::ProposeDraw {
            game_id: self.game_id.clone(),
            player_id: self.player_id.clone(),
            color: self.player_side,
        }
    }
}

/// 根据结束原因生成结果文本
pub fn outcome_text(over: &GameOver) -> String {
    let winner = over.winner.map(Side::display_name);
    match (&over.reason, winner) {
        (GameOverReason::Checkmate, Some(name)) => format!("XEQUE-MATE! {name} ganharam!"),
        (GameOverReason::Stalemate, _) => "EMPATE por afogamento!".to_string(),
        (GameOverReason::InsufficientMaterial, _) => "EMPATE por material insuficiente!".to_string(),
        (GameOverReason::Draw, _) => "EMPATE!".to_string(),
        (GameOverReason::OpponentDisconnected, Some(name)) => {
            format!("{name} ganharam por desconexão do oponente!")
        }
        _ => "Jogo Finalizado!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{handle_click, ClickOutcome};

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn game() -> ClientGame {
        ClientGame::new("player-1".to_string(), "room".to_string())
    }

    fn snapshot(fen: &str, status: GameStatus, turn: Side, history: &[&str]) -> GameSnapshot {
        GameSnapshot {
            fen: fen.to_string(),
            status,
            turn,
            white_player_id: Some("player-1".to_string()),
            black_player_id: Some("player-2".to_string()),
            move_history: history.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let game = ClientGame::default();
        assert_eq!(game.game_id, DEFAULT_GAME_ID);
        assert_eq!(game.status, GameStatus::Waiting);
        assert!(uuid::Uuid::parse_str(&game.player_id).is_ok());
        assert!(game.player_side.is_none());
        assert!(game.current_notice().is_none());
    }

    #[test]
    fn test_player_color_assigned_once() {
        let mut game = game();
        game.apply_server_message(ServerMessage::PlayerColor { color: Side::Black });
        assert_eq!(game.player_side, Some(Side::Black));
        assert!(game.flipped);

        game.apply_server_message(ServerMessage::PlayerColor { color: Side::White });
        assert_eq!(game.player_side, Some(Side::Black));
        assert!(game.flipped);
    }

    #[test]
    fn test_white_is_not_flipped() {
        let mut game = game();
        game.apply_server_message(ServerMessage::PlayerColor { color: Side::White });
        assert!(!game.flipped);
        assert_eq!(game.side_text(), "Você é: WHITE");
    }

    #[test]
    fn test_snapshot_replaces_state_and_clears_selection() {
        let mut game = game();
        game.player_side = Some(Side::White);
        game.input = InputState::Selecting { from: sq("e2"), candidates: vec![sq("e3")] };

        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(AFTER_E4_FEN, GameStatus::Playing, Side::Black, &["e4"]),
        });

        assert_eq!(game.status, GameStatus::Playing);
        assert_eq!(game.input, InputState::Idle);
        assert_eq!(game.rules().side_to_move(), Side::Black);
        assert!(game.rules().piece_at(sq("e4")).is_some());
        assert_eq!(game.status_text(), "Turno: Pretas");
        assert_eq!(game.move_log().len(), 1);
    }

    #[test]
    fn test_last_snapshot_wins() {
        let mut game = game();
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(AFTER_E4_FEN, GameStatus::Playing, Side::Black, &["e4"]),
        });
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(START_FEN, GameStatus::Waiting, Side::White, &[]),
        });
        assert_eq!(game.status, GameStatus::Waiting);
        assert!(game.rules().piece_at(sq("e4")).is_none());
        assert!(game.move_log().is_empty());
    }

    #[test]
    fn test_bad_fen_keeps_previous_position() {
        let mut game = game();
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(AFTER_E4_FEN, GameStatus::Playing, Side::Black, &["e4"]),
        });
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot("garbage", GameStatus::Playing, Side::White, &["e4"]),
        });
        assert!(game.rules().piece_at(sq("e4")).is_some());
        assert_eq!(game.snapshot.as_ref().unwrap().fen, "garbage");
    }

    #[test]
    fn test_waiting_status_text() {
        let mut game = game();
        assert_eq!(game.status_text(), "Aguardando jogadores... ()");

        let mut data = snapshot(START_FEN, GameStatus::Waiting, Side::White, &[]);
        data.black_player_id = None;
        game.apply_server_message(ServerMessage::GameState { data });
        assert_eq!(game.status_text(), "Aguardando jogadores... (Brancas prontas)");

        let data = snapshot(START_FEN, GameStatus::Waiting, Side::White, &[]);
        game.apply_server_message(ServerMessage::GameState { data });
        assert_eq!(
            game.status_text(),
            "Aguardando jogadores... (Brancas prontas Pretas prontas)"
        );
    }

    #[test]
    fn test_playing_status_text_marks_own_turn() {
        let mut game = game();
        game.apply_server_message(ServerMessage::PlayerColor { color: Side::White });
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(START_FEN, GameStatus::Playing, Side::White, &[]),
        });
        assert_eq!(game.status_text(), "Turno: Brancas (Sua vez)");
        assert!(game.is_my_turn());
    }

    #[test]
    fn test_checkmate_scenario() {
        let mut game = game();
        game.apply_server_message(ServerMessage::PlayerColor { color: Side::White });
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(START_FEN, GameStatus::Playing, Side::White, &[]),
        });
        game.input = InputState::Selecting { from: sq("e2"), candidates: vec![sq("e4")] };

        game.apply_server_message(ServerMessage::GameOver(GameOver {
            reason: GameOverReason::Checkmate,
            winner: Some(Side::White),
        }));

        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.input, InputState::Idle);
        assert_eq!(game.status_text(), "Jogo Finalizado!");
        assert_eq!(game.outcome_text().as_deref(), Some("XEQUE-MATE! Brancas ganharam!"));

        let notice = game.current_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::GameOver);
        assert_eq!(notice.text, "XEQUE-MATE! Brancas ganharam!");
    }

    #[test]
    fn test_finished_snapshot_after_checkmate() {
        let mut game = game();
        game.apply_server_message(ServerMessage::PlayerColor { color: Side::White });
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(START_FEN, GameStatus::Playing, Side::White, &[]),
        });
        game.apply_server_message(ServerMessage::GameOver(GameOver {
            reason: GameOverReason::Checkmate,
            winner: Some(Side::White),
        }));
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(START_FEN, GameStatus::Finished, Side::White, &["e4", "e5"]),
        });

        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.status_text(), "Jogo Finalizado!");
        assert_eq!(game.outcome_text().as_deref(), Some("XEQUE-MATE! Brancas ganharam!"));

        // 对局结束后点击本方棋子不再产生走法
        assert_eq!(handle_click(&mut game, sq("e2")), ClickOutcome::Ignored);
        assert_eq!(handle_click(&mut game, sq("e4")), ClickOutcome::Ignored);
        assert_eq!(game.input, InputState::Idle);
    }

    #[test]
    fn test_new_game_clears_previous_outcome() {
        let mut game = game();
        game.apply_server_message(ServerMessage::GameOver(GameOver {
            reason: GameOverReason::Draw,
            winner: None,
        }));
        assert!(game.outcome_text().is_some());

        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(START_FEN, GameStatus::Playing, Side::White, &[]),
        });
        assert!(game.outcome_text().is_none());
    }

    #[test]
    fn test_outcome_texts() {
        let text = |reason, winner| outcome_text(&GameOver { reason, winner });
        assert_eq!(text(GameOverReason::Checkmate, Some(Side::Black)), "XEQUE-MATE! Pretas ganharam!");
        assert_eq!(text(GameOverReason::Checkmate, None), "Jogo Finalizado!");
        assert_eq!(text(GameOverReason::Stalemate, None), "EMPATE por afogamento!");
        assert_eq!(
            text(GameOverReason::InsufficientMaterial, None),
            "EMPATE por material insuficiente!"
        );
        assert_eq!(text(GameOverReason::Draw, None), "EMPATE!");
        assert_eq!(
            text(GameOverReason::OpponentDisconnected, Some(Side::White)),
            "Brancas ganharam por desconexão do oponente!"
        );
        assert_eq!(
            text(GameOverReason::Other("resignation".to_string()), Some(Side::White)),
            "Jogo Finalizado!"
        );
    }

    #[test]
    fn test_server_error_becomes_notice_without_state_change() {
        let mut game = game();
        game.apply_server_message(ServerMessage::GameState {
            data: snapshot(START_FEN, GameStatus::Playing, Side::White, &[]),
        });
        game.apply_server_message(ServerMessage::Error { message: "Movimento inválido".to_string() });

        assert_eq!(game.status, GameStatus::Playing);
        assert_eq!(
            game.current_notice().map(|n| n.text.as_str()),
            Some("Erro do servidor: Movimento inválido")
        );
        assert!(game.dismiss_notice().is_some());
        assert!(game.current_notice().is_none());
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let mut game = game();
        game.apply_server_message(ServerMessage::Unknown);
        assert_eq!(game.status, GameStatus::Waiting);
        assert!(game.current_notice().is_none());
    }

    #[test]
    fn test_connection_loss_statuses() {
        let mut game = game();
        game.connection_closed();
        assert_eq!(game.status, GameStatus::Disconnected);
        assert_eq!(game.status_text(), "Desconectado do servidor.");

        game.connection_failed();
        assert_eq!(game.status, GameStatus::Error);
        assert_eq!(game.status_text(), "Erro de conexão.");
    }

    #[test]
    fn test_reset_keeps_player_id() {
        let mut game = game();
        game.apply_server_message(ServerMessage::PlayerColor { color: Side::Black });
        game.push_notice(NoticeKind::Info, "x");

        game.reset_for_reconnect("other-room".to_string());

        assert_eq!(game.player_id, "player-1");
        assert_eq!(game.game_id, "other-room");
        assert!(game.player_side.is_none());
        assert!(!game.flipped);
        assert!(game.current_notice().is_none());
    }

    #[test]
    fn test_outbound_messages_carry_identity() {
        let mut game = game();
        assert_eq!(
            game.resign_message(),
            ClientMessage::Resign {
                game_id: "room".to_string(),
                player_id: "player-1".to_string(),
                color: None,
            }
        );

        game.apply_server_message(ServerMessage::PlayerColor { color: Side::White });
        let json = serde_json::to_value(game.draw_message()).unwrap();
        assert_eq!(json["type"], "propose_draw");
        assert_eq!(json["data"]["color"], "white");

        let intent = MoveIntent { from: sq("e2"), to: sq("e4"), promotion: None };
        let json = serde_json::to_value(game.move_message(intent)).unwrap();
        assert_eq!(json["data"]["move"]["from"], "e2");
        assert_eq!(json["data"]["game_id"], "room");
    }
}
