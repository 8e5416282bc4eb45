//! 输入处理
//!
//! 点击 → 格子 → 选子状态机。状态机只产生走法意图，从不在本地落子，
//! 棋盘只随服务端快照变化。

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use protocol::{GameStatus, MoveIntent, PieceKind, PromotionPiece, Square};
use thiserror::Error;

use super::ClientGame;
use crate::board::BoardLayout;
use crate::network::NetworkEvent;

/// 选子状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputState {
    #[default]
    Idle,
    /// 已选中棋子，`candidates` 为规则库给出的落点
    Selecting { from: Square, candidates: Vec<Square> },
    /// 兵到达底线，等待选择升变棋子
    AwaitingPromotion { from: Square, to: Square },
}

/// 一次点击的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    Selected,
    Deselected,
    PromotionPending,
    Move(MoveIntent),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("No promotion is pending")]
    NoPendingPromotion,

    #[error("Game is not in progress")]
    NotPlaying,
}

/// 处理一次棋盘点击
pub fn handle_click(game: &mut ClientGame, square: Square) -> ClickOutcome {
    if game.status != GameStatus::Playing {
        debug!("Ignoring click on {} while {:?}", square, game.status);
        return ClickOutcome::Ignored;
    }

    match std::mem::take(&mut game.input) {
        InputState::Idle => {
            if select(game, square) {
                ClickOutcome::Selected
            } else {
                ClickOutcome::Ignored
            }
        }
        InputState::Selecting { from, candidates } => {
            if square == from {
                ClickOutcome::Deselected
            } else if candidates.contains(&square) {
                if needs_promotion(game, from, square) {
                    game.input = InputState::AwaitingPromotion { from, to: square };
                    ClickOutcome::PromotionPending
                } else {
                    ClickOutcome::Move(MoveIntent { from, to: square, promotion: None })
                }
            } else if select(game, square) {
                ClickOutcome::Selected
            } else {
                ClickOutcome::Deselected
            }
        }
        pending @ InputState::AwaitingPromotion { .. } => {
            game.input = pending;
            ClickOutcome::Ignored
        }
    }
}

/// 完成升变选择
pub fn choose_promotion(
    game: &mut ClientGame,
    piece: PromotionPiece,
) -> Result<MoveIntent, InputError> {
    let InputState::AwaitingPromotion { from, to } = game.input else {
        return Err(InputError::NoPendingPromotion);
    };
    game.input = InputState::Idle;

    if game.status != GameStatus::Playing {
        return Err(InputError::NotPlaying);
    }
    Ok(MoveIntent { from, to, promotion: Some(piece) })
}

/// 取消升变，不发送任何走法
pub fn cancel_promotion(game: &mut ClientGame) -> bool {
    if matches!(game.input, InputState::AwaitingPromotion { .. }) {
        game.input = InputState::Idle;
        true
    } else {
        false
    }
}

/// 选中本方棋子；非本方回合或非本方棋子返回 false
fn select(game: &mut ClientGame, square: Square) -> bool {
    let Some(side) = game.player_side else {
        return false;
    };
    let to_move = game.rules().side_to_move();
    let own_piece = game
        .rules()
        .piece_at(square)
        .is_some_and(|piece| piece.side == side && piece.side == to_move);
    if !own_piece {
        return false;
    }

    let candidates = game.rules().legal_destinations(square);
    game.input = InputState::Selecting { from: square, candidates };
    true
}

fn needs_promotion(game: &ClientGame, from: Square, to: Square) -> bool {
    game.rules().piece_at(from).is_some_and(|piece| {
        piece.kind == PieceKind::Pawn && to.rank_number() == piece.side.promotion_rank()
    })
}

/// 棋盘上的一次左键点击（已换算为格子）
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardClick(pub Square);

/// 鼠标左键 → 棋盘格子
pub fn handle_mouse_input(
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    layout: Res<BoardLayout>,
    mut clicks: MessageWriter<BoardClick>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_position) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok(world_position) = camera.viewport_to_world_2d(camera_transform, cursor_position) else {
        return;
    };

    let pixel = layout.world_to_board(world_position);
    if let Some(square) = layout.square_at(pixel.x, pixel.y) {
        clicks.write(BoardClick(square));
    }
}

/// 把棋盘点击交给选子状态机
///
/// 提示框打开或指针位于任何按钮上时丢弃点击：按钮交互在 `PreUpdate`
/// 中已经更新，与本系统和按钮处理系统的先后无关。
pub fn apply_board_clicks(
    mut clicks: MessageReader<BoardClick>,
    buttons: Query<&Interaction, With<Button>>,
    mut game: ResMut<ClientGame>,
    mut network_events: MessageWriter<NetworkEvent>,
) {
    let over_button = buttons.iter().any(|interaction| *interaction != Interaction::None);
    for BoardClick(square) in clicks.read().copied() {
        if over_button || game.current_notice().is_some() {
            debug!("Board click on {} swallowed by UI", square);
            continue;
        }

        match handle_click(&mut game, square) {
            ClickOutcome::Move(intent) => {
                network_events.write(NetworkEvent::SendMove(intent));
            }
            ClickOutcome::PromotionPending => {
                debug!("Awaiting promotion choice for move to {}", square);
            }
            _ => {}
        }
    }
}
