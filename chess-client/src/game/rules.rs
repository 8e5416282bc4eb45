//! 规则库适配层
//!
//! 客户端本身不实现任何国际象棋规则，合法走法、走子方等全部交给 `shakmaty`。

use protocol::{Piece, PieceKind, Side, Square};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, File, Move, Position, Rank, Role};
use thiserror::Error;

/// 规则库错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("Invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Illegal position {fen:?}: {reason}")]
    IllegalPosition { fen: String, reason: String },
}

/// 规则库接口
pub trait RulesAdapter: Send + Sync {
    /// 从 FEN 载入局面；失败时保留原局面
    fn load_position(&mut self, fen: &str) -> Result<(), RulesError>;

    /// 查询格子上的棋子
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// 当前走子方
    fn side_to_move(&self) -> Side;

    /// 从某格出发的全部合法目标格（升变只出现一次）
    fn legal_destinations(&self, from: Square) -> Vec<Square>;
}

/// 基于 shakmaty 的规则实现
#[derive(Debug, Clone, Default)]
pub struct ShakmatyRules {
    position: Chess,
}

impl ShakmatyRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接从 FEN 创建
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let mut rules = Self::new();
        rules.load_position(fen)?;
        Ok(rules)
    }
}

impl RulesAdapter for ShakmatyRules {
    fn load_position(&mut self, fen: &str) -> Result<(), RulesError> {
        let parsed: Fen = fen.trim().parse().map_err(|e: shakmaty::fen::ParseFenError| {
            RulesError::InvalidFen {
                fen: fen.to_string(),
                reason: e.to_string(),
            }
        })?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::IllegalPosition {
                fen: fen.to_string(),
                reason: e.to_string(),
            })?;
        self.position = position;
        Ok(())
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position
            .board()
            .piece_at(to_shakmaty(square))
            .map(|p| Piece::new(kind_of(p.role), side_of(p.color)))
    }

    fn side_to_move(&self) -> Side {
        side_of(self.position.turn())
    }

    fn legal_destinations(&self, from: Square) -> Vec<Square> {
        let origin = to_shakmaty(from);
        let mut targets: Vec<Square> = self
            .position
            .legal_moves()
            .iter()
            .filter(|m| move_origin(m) == Some(origin))
            .filter_map(|m| from_shakmaty(move_target(m)))
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }
}

fn move_origin(m: &Move) -> Option<shakmaty::Square> {
    match m {
        Move::Normal { from, .. } | Move::EnPassant { from, .. } => Some(*from),
        Move::Castle { king, .. } => Some(*king),
        Move::Put { .. } => None,
    }
}

/// 王车易位以王的落点表示（g 列或 c 列）
fn move_target(m: &Move) -> shakmaty::Square {
    match m {
        Move::Normal { to, .. } | Move::EnPassant { to, .. } | Move::Put { to, .. } => *to,
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            shakmaty::Square::from_coords(file, king.rank())
        }
    }
}

fn to_shakmaty(square: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(
        File::new(u32::from(square.file())),
        Rank::new(u32::from(square.rank())),
    )
}

fn from_shakmaty(square: shakmaty::Square) -> Option<Square> {
    Square::new(square.file() as u8, square.rank() as u8)
}

fn kind_of(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}
