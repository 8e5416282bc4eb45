//! 棋子、阵营与格子定义

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;
use crate::error::ProtocolError;

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// 获取 FEN 字符（小写）
    pub fn to_fen_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 白方（先手）
    White,
    /// 黑方
    Black,
}

impl Side {
    /// 该方兵的升变横排（1-8）
    pub fn promotion_rank(self) -> u8 {
        match self {
            Side::White => 8,
            Side::Black => 1,
        }
    }

    /// 界面显示名称
    pub fn display_name(self) -> &'static str {
        match self {
            Side::White => "Brancas",
            Side::Black => "Pretas",
        }
    }

    /// 协议中的名称
    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }

    /// 从 FEN 走子方字符或协议名称解析
    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "w" | "white" => Some(Side::White),
            "b" | "black" => Some(Side::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub fn new(kind: PieceKind, side: Side) -> Self {
        Self { kind, side }
    }

    /// FEN 符号：白方大写，黑方小写
    pub fn symbol(&self) -> char {
        let c = self.kind.to_fen_char();
        match self.side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }
}

/// 升变可选棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionPiece {
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "n")]
    Knight,
}

impl PromotionPiece {
    /// 所有可选项
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Queen,
        PromotionPiece::Rook,
        PromotionPiece::Bishop,
        PromotionPiece::Knight,
    ];

    /// 从用户输入字符解析，只接受 q/r/b/n
    pub fn from_char(c: char) -> Option<PromotionPiece> {
        match c.to_ascii_lowercase() {
            'q' => Some(PromotionPiece::Queen),
            'r' => Some(PromotionPiece::Rook),
            'b' => Some(PromotionPiece::Bishop),
            'n' => Some(PromotionPiece::Knight),
            _ => None,
        }
    }
}

impl FromStr for PromotionPiece {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                PromotionPiece::from_char(c).ok_or_else(|| ProtocolError::InvalidPromotion(s.to_string()))
            }
            _ => Err(ProtocolError::InvalidPromotion(s.to_string())),
        }
    }
}

/// 棋盘格子（始终为标准朝向：a1 在白方左下角）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    /// 列索引 0-7 (a-h)
    file: u8,
    /// 横排索引 0-7 (1-8)
    rank: u8,
}

impl Square {
    /// 以 0 起始的列/横排索引创建格子
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if file < BOARD_SIZE && rank < BOARD_SIZE {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    /// 列索引 0-7
    pub fn file(&self) -> u8 {
        self.file
    }

    /// 横排索引 0-7
    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// 横排编号 1-8
    pub fn rank_number(&self) -> u8 {
        self.rank + 1
    }

    /// 列字母 a-h
    pub fn file_char(&self) -> char {
        (b'a' + self.file) as char
    }

    /// 遍历全部 64 格（a1, b1, ..., h8）
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|rank| (0..BOARD_SIZE).map(move |file| Square { file, rank }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_number())
    }
}

impl FromStr for Square {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ProtocolError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| ProtocolError::InvalidSquare(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}
