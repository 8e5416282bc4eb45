//! 棋盘渲染模块
//!
//! 负责坐标换算、棋盘与棋子的绘制

pub mod pieces;
pub mod render;

pub use pieces::*;
pub use render::*;

use bevy::prelude::*;
use protocol::{Square, BOARD_SIZE};

use crate::game::ClientGame;
use crate::theme::ColorTheme;
use crate::AppState;

/// 默认格子边长（像素）
pub const DEFAULT_TILE_SIZE: f32 = 80.0;

/// 棋盘右侧留给信息面板的宽度
const PANEL_ALLOWANCE: f32 = 240.0;

/// 棋盘插件
pub struct BoardPlugin;

impl Plugin for BoardPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BoardLayout>()
            .init_resource::<PieceSprites>()
            .add_systems(Startup, pieces::load_piece_sprites)
            .add_systems(
                Update,
                pieces::check_sprite_loading.run_if(in_state(AppState::Loading)),
            )
            .add_systems(OnExit(AppState::Ready), cleanup_board)
            .add_systems(
                Update,
                (sync_layout_orientation, redraw_board)
                    .chain()
                    .run_if(in_state(AppState::Ready)),
            );
    }
}

/// 棋盘布局
///
/// 像素坐标以棋盘左上角为原点，y 轴向下；`origin` 是该角在世界坐标中的位置。
/// 格子始终使用标准朝向，翻转只影响像素与格子之间的换算。
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct BoardLayout {
    /// 棋盘左上角（世界坐标）
    pub origin: Vec2,
    /// 格子边长
    pub tile_size: f32,
    /// 是否以黑方视角显示
    pub flipped: bool,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl BoardLayout {
    /// 按格子大小创建布局，棋盘居中偏左
    pub fn new(tile_size: f32) -> Self {
        let board_size = tile_size * BOARD_SIZE as f32;
        Self {
            origin: Vec2::new(-board_size / 2.0 - PANEL_ALLOWANCE, board_size / 2.0),
            tile_size,
            flipped: false,
        }
    }

    /// 棋盘边长
    pub fn board_size(&self) -> f32 {
        self.tile_size * BOARD_SIZE as f32
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        self.flipped = flipped;
    }

    pub fn toggle_flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// 像素坐标 → 格子；棋盘外返回 `None`
    pub fn square_at(&self, x: f32, y: f32) -> Option<Square> {
        let size = self.board_size();
        if !(x >= 0.0 && x < size && y >= 0.0 && y < size) {
            return None;
        }

        let last = BOARD_SIZE - 1;
        let mut col = ((x / self.tile_size).floor() as u8).min(last);
        let mut row = ((y / self.tile_size).floor() as u8).min(last);
        if self.flipped {
            col = last - col;
            row = last - row;
        }
        Square::new(col, last - row)
    }

    /// 格子左上角的像素坐标
    pub fn square_origin(&self, square: Square) -> Vec2 {
        let last = BOARD_SIZE - 1;
        let mut col = square.file();
        let mut row = last - square.rank();
        if self.flipped {
            col = last - col;
            row = last - row;
        }
        Vec2::new(col as f32 * self.tile_size, row as f32 * self.tile_size)
    }

    /// 格子中心的像素坐标
    pub fn square_center(&self, square: Square) -> Vec2 {
        self.square_origin(square) + Vec2::splat(self.tile_size / 2.0)
    }

    /// 像素坐标 → 世界坐标
    pub fn board_to_world(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(self.origin.x + pixel.x, self.origin.y - pixel.y)
    }

    /// 世界坐标 → 像素坐标
    pub fn world_to_board(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x - self.origin.x, self.origin.y - world.y)
    }
}

/// 棋盘实体标记
#[derive(Component)]
pub struct BoardMarker;

/// 棋盘朝向跟随会话
fn sync_layout_orientation(game: Res<ClientGame>, mut layout: ResMut<BoardLayout>) {
    if game.is_changed() && layout.flipped != game.flipped {
        layout.set_flipped(game.flipped);
    }
}

/// 会话或布局变化时整体重绘
#[allow(clippy::too_many_arguments)]
fn redraw_board(
    mut commands: Commands,
    game: Res<ClientGame>,
    layout: Res<BoardLayout>,
    theme: Res<ColorTheme>,
    sprites: Res<PieceSprites>,
    images: Res<Assets<Image>>,
    board_query: Query<Entity, With<BoardMarker>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    if !game.is_changed() && !layout.is_changed() {
        return;
    }

    for entity in board_query.iter() {
        commands.entity(entity).despawn();
    }

    let display_list = render::paint(&game.board_view(), &layout);
    let mut painter = render::Painter {
        commands: &mut commands,
        layout: &layout,
        theme: &theme,
        sprites: &sprites,
        images: &images,
        meshes: &mut meshes,
        materials: &mut materials,
    };
    for command in &display_list {
        painter.draw(command);
    }
}

/// 清理棋盘
fn cleanup_board(mut commands: Commands, query: Query<Entity, With<BoardMarker>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}
