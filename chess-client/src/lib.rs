//! 国际象棋联机客户端
//!
//! 使用 Bevy 引擎绘制棋盘并处理输入，通过 WebSocket 与对局服务器通信。
//! 规则判断交给 `shakmaty`，棋盘状态完全以服务端快照为准。

pub mod board;
pub mod game;
pub mod network;
pub mod settings;
pub mod theme;
pub mod ui;

use bevy::prelude::*;

use crate::board::BoardLayout;
use crate::game::ClientGame;
use crate::settings::ClientSettings;
use crate::ui::GameIdInput;

/// 应用状态
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    /// 等待棋子贴图加载
    #[default]
    Loading,
    /// 贴图就绪，显示棋盘
    Ready,
    /// 贴图加载失败
    AssetError,
}

/// 客户端插件
#[derive(Default)]
pub struct ChessClientPlugin {
    pub settings: ClientSettings,
}

impl ChessClientPlugin {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }
}

impl Plugin for ChessClientPlugin {
    fn build(&self, app: &mut App) {
        let settings = self.settings.clone();
        let game = ClientGame::new(
            uuid::Uuid::new_v4().to_string(),
            settings.game_id.clone(),
        );
        info!("Player id: {}", game.player_id);

        app.init_state::<AppState>()
            .insert_resource(BoardLayout::new(settings.tile_size))
            .insert_resource(GameIdInput {
                text: settings.game_id.clone(),
                focused: false,
            })
            .insert_resource(game)
            .insert_resource(settings)
            .add_systems(Startup, spawn_camera)
            .add_plugins((
                theme::ThemePlugin,
                board::BoardPlugin,
                game::GamePlugin,
                ui::UiPlugin,
                network::NetworkPlugin,
            ));
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
