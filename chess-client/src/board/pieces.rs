//! 棋子贴图
//!
//! 启动时一次性请求全部 12 张贴图，全部加载成功才进入对局界面。

use std::collections::HashMap;
use std::fmt;

use bevy::asset::LoadState;
use bevy::prelude::*;
use protocol::{Piece, PieceKind, Side};

use crate::AppState;

/// 贴图键：阵营 + 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSymbol {
    pub side: Side,
    pub kind: PieceKind,
}

impl PieceSymbol {
    /// 全部 12 种组合
    pub const ALL: [PieceSymbol; 12] = [
        PieceSymbol { side: Side::White, kind: PieceKind::Rook },
        PieceSymbol { side: Side::White, kind: PieceKind::Knight },
        PieceSymbol { side: Side::White, kind: PieceKind::Bishop },
        PieceSymbol { side: Side::White, kind: PieceKind::Queen },
        PieceSymbol { side: Side::White, kind: PieceKind::King },
        PieceSymbol { side: Side::White, kind: PieceKind::Pawn },
        PieceSymbol { side: Side::Black, kind: PieceKind::Rook },
        PieceSymbol { side: Side::Black, kind: PieceKind::Knight },
        PieceSymbol { side: Side::Black, kind: PieceKind::Bishop },
        PieceSymbol { side: Side::Black, kind: PieceKind::Queen },
        PieceSymbol { side: Side::Black, kind: PieceKind::King },
        PieceSymbol { side: Side::Black, kind: PieceKind::Pawn },
    ];

    /// 贴图路径（相对 assets 目录）
    pub fn image_path(self) -> &'static str {
        match (self.side, self.kind) {
            (Side::White, PieceKind::Rook) => "images/white_r.png",
            (Side::White, PieceKind::Knight) => "images/white_n.png",
            (Side::White, PieceKind::Bishop) => "images/white_b.png",
            (Side::White, PieceKind::Queen) => "images/white_q.png",
            (Side::White, PieceKind::King) => "images/white_k.png",
            (Side::White, PieceKind::Pawn) => "images/white_p.png",
            (Side::Black, PieceKind::Rook) => "images/black_r.png",
            (Side::Black, PieceKind::Knight) => "images/black_n.png",
            (Side::Black, PieceKind::Bishop) => "images/black_b.png",
            (Side::Black, PieceKind::Queen) => "images/black_q.png",
            (Side::Black, PieceKind::King) => "images/black_k.png",
            (Side::Black, PieceKind::Pawn) => "images/black_p.png",
        }
    }
}

impl From<Piece> for PieceSymbol {
    fn from(piece: Piece) -> Self {
        Self { side: piece.side, kind: piece.kind }
    }
}

impl fmt::Display for PieceSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Piece::new(self.kind, self.side).symbol())
    }
}

/// 已请求的贴图句柄
#[derive(Resource, Default)]
pub struct PieceSprites {
    handles: HashMap<PieceSymbol, Handle<Image>>,
}

impl PieceSprites {
    pub fn get(&self, symbol: PieceSymbol) -> Option<&Handle<Image>> {
        self.handles.get(&symbol)
    }
}

/// 单张贴图的加载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteLoad {
    Pending,
    Loaded,
    Failed,
}

/// 整体加载进度
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteLoadProgress {
    Pending { loaded: usize, total: usize },
    Ready,
    /// 失败的贴图路径
    Failed(Vec<&'static str>),
}

/// 汇总加载状态：任意一张失败即失败，全部加载才算就绪
pub fn summarize_loads<I>(states: I) -> SpriteLoadProgress
where
    I: IntoIterator<Item = (PieceSymbol, SpriteLoad)>,
{
    let mut total = 0;
    let mut loaded = 0;
    let mut failed = Vec::new();

    for (symbol, state) in states {
        total += 1;
        match state {
            SpriteLoad::Loaded => loaded += 1,
            SpriteLoad::Failed => failed.push(symbol.image_path()),
            SpriteLoad::Pending => {}
        }
    }

    if !failed.is_empty() {
        SpriteLoadProgress::Failed(failed)
    } else if total > 0 && loaded == total {
        SpriteLoadProgress::Ready
    } else {
        SpriteLoadProgress::Pending { loaded, total }
    }
}

/// 请求全部贴图
pub fn load_piece_sprites(asset_server: Res<AssetServer>, mut sprites: ResMut<PieceSprites>) {
    for symbol in PieceSymbol::ALL {
        let handle: Handle<Image> = asset_server.load(symbol.image_path());
        sprites.handles.insert(symbol, handle);
    }
    info!("Requested {} piece sprites", PieceSymbol::ALL.len());
}

/// 检查贴图加载结果并切换状态
pub fn check_sprite_loading(
    asset_server: Res<AssetServer>,
    sprites: Res<PieceSprites>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let states = PieceSymbol::ALL.into_iter().map(|symbol| {
        let load = match sprites.get(symbol).and_then(|h| asset_server.get_load_state(h.id())) {
            Some(LoadState::Loaded) => SpriteLoad::Loaded,
            Some(LoadState::Failed(_)) => SpriteLoad::Failed,
            _ => SpriteLoad::Pending,
        };
        (symbol, load)
    });

    match summarize_loads(states) {
        SpriteLoadProgress::Ready => {
            info!("All piece sprites loaded");
            next_state.set(AppState::Ready);
        }
        SpriteLoadProgress::Failed(paths) => {
            for path in &paths {
                error!("Failed to load piece sprite: {}", path);
            }
            next_state.set(AppState::AssetError);
        }
        SpriteLoadProgress::Pending { .. } => {}
    }
}
