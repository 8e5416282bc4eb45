//! 游戏逻辑模块
//!
//! 会话状态、选子状态机与规则库适配

mod input;
pub mod move_log;
pub mod rules;
mod state;

pub use input::*;
pub use move_log::{move_log_rows, MoveLogRow};
pub use rules::{RulesAdapter, RulesError, ShakmatyRules};
pub use state::*;

use bevy::prelude::*;

use crate::AppState;

/// 游戏插件
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<ClientGame>() {
            app.insert_resource(ClientGame::default());
        }
        app.add_message::<BoardClick>().add_systems(
            Update,
            (handle_mouse_input, apply_board_clicks)
                .chain()
                .run_if(in_state(AppState::Ready)),
        );
    }
}
