//! 棋盘渲染
//!
//! `paint` 把当前会话转成有序的绘制指令，`Painter` 再把指令变成 Bevy 实体。

use bevy::prelude::*;
use protocol::{Piece, Square};

use super::pieces::{PieceSprites, PieceSymbol};
use super::{BoardLayout, BoardMarker};
use crate::game::RulesAdapter;
use crate::theme::ColorTheme;

/// 各图层的 z 值
const Z_TILE: f32 = 0.0;
const Z_HIGHLIGHT: f32 = 1.0;
const Z_MARKER: f32 = 2.0;
const Z_PIECE: f32 = 3.0;

/// 绘制所需的只读视图
pub struct BoardView<'a> {
    pub rules: &'a dyn RulesAdapter,
    pub selected: Option<Square>,
    pub candidates: &'a [Square],
}

/// 格子深浅
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileShade {
    Light,
    Dark,
}

impl TileShade {
    /// a1 为深色
    pub fn of(square: Square) -> TileShade {
        if (square.file() + square.rank()) % 2 == 1 {
            TileShade::Light
        } else {
            TileShade::Dark
        }
    }
}

/// 绘制指令（像素坐标）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Tile {
        square: Square,
        origin: Vec2,
        size: f32,
        shade: TileShade,
    },
    Highlight {
        square: Square,
        origin: Vec2,
        size: f32,
    },
    MoveMarker {
        square: Square,
        center: Vec2,
        radius: f32,
    },
    Piece {
        square: Square,
        origin: Vec2,
        size: f32,
        piece: Piece,
    },
}

/// 生成完整的绘制指令列表
///
/// 顺序：64 个格子、选中高亮、候选落点、棋子。
pub fn paint(view: &BoardView, layout: &BoardLayout) -> Vec<DrawCommand> {
    let size = layout.tile_size;
    let mut commands = Vec::with_capacity(64 + 1 + view.candidates.len() + 32);

    for square in Square::all() {
        commands.push(DrawCommand::Tile {
            square,
            origin: layout.square_origin(square),
            size,
            shade: TileShade::of(square),
        });
    }

    if let Some(square) = view.selected {
        commands.push(DrawCommand::Highlight {
            square,
            origin: layout.square_origin(square),
            size,
        });
    }

    for &square in view.candidates {
        commands.push(DrawCommand::MoveMarker {
            square,
            center: layout.square_center(square),
            radius: size / 6.0,
        });
    }

    for square in Square::all() {
        if let Some(piece) = view.rules.piece_at(square) {
            commands.push(DrawCommand::Piece {
                square,
                origin: layout.square_origin(square),
                size,
                piece,
            });
        }
    }

    commands
}

/// 把绘制指令落成实体
pub struct Painter<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
    pub layout: &'a BoardLayout,
    pub theme: &'a ColorTheme,
    pub sprites: &'a PieceSprites,
    pub images: &'a Assets<Image>,
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<ColorMaterial>,
}

impl Painter<'_, '_, '_> {
    pub fn draw(&mut self, command: &DrawCommand) {
        match *command {
            DrawCommand::Tile { origin, size, shade, .. } => {
                let color = match shade {
                    TileShade::Light => self.theme.light_square,
                    TileShade::Dark => self.theme.dark_square,
                };
                self.spawn_rect(origin, size, color, Z_TILE);
            }
            DrawCommand::Highlight { origin, size, .. } => {
                self.spawn_rect(origin, size, self.theme.selected_highlight, Z_HIGHLIGHT);
            }
            DrawCommand::MoveMarker { center, radius, .. } => {
                let world = self.layout.board_to_world(center);
                self.commands.spawn((
                    Mesh2d(self.meshes.add(Circle::new(radius))),
                    MeshMaterial2d(self.materials.add(ColorMaterial::from_color(self.theme.move_marker))),
                    Transform::from_xyz(world.x, world.y, Z_MARKER),
                    BoardMarker,
                ));
            }
            DrawCommand::Piece { square, origin, size, piece } => {
                let symbol = PieceSymbol::from(piece);
                let Some(handle) = self.sprites.get(symbol) else {
                    warn!("No sprite registered for {:?} on {}", symbol, square);
                    return;
                };
                if self.images.get(handle).is_none() {
                    warn!("Sprite {} not loaded, skipping piece on {}", symbol.image_path(), square);
                    return;
                }
                let world = self.layout.board_to_world(origin + Vec2::splat(size / 2.0));
                self.commands.spawn((
                    Sprite {
                        image: handle.clone(),
                        custom_size: Some(Vec2::splat(size)),
                        ..default()
                    },
                    Transform::from_xyz(world.x, world.y, Z_PIECE),
                    BoardMarker,
                ));
            }
        }
    }

    fn spawn_rect(&mut self, origin: Vec2, size: f32, color: Color, z: f32) {
        let world = self.layout.board_to_world(origin + Vec2::splat(size / 2.0));
        self.commands.spawn((
            Sprite {
                color,
                custom_size: Some(Vec2::splat(size)),
                ..default()
            },
            Transform::from_xyz(world.x, world.y, z),
            BoardMarker,
        ));
    }
}
