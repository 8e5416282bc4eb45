//! UI 模块
//!
//! 信息面板、提示框、升变选择与加载界面

mod dialog;
mod game_ui;
mod loading_ui;

pub use dialog::*;
pub use game_ui::*;
pub use loading_ui::*;

use bevy::prelude::*;
use protocol::PromotionPiece;

use crate::AppState;

/// UI 插件
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameIdInput>()
            // 加载界面
            .add_systems(OnEnter(AppState::Loading), setup_loading_ui)
            .add_systems(OnExit(AppState::Loading), cleanup_loading_ui)
            .add_systems(OnEnter(AppState::AssetError), setup_asset_error_ui)
            // 对局界面
            .add_systems(OnEnter(AppState::Ready), (setup_game_ui, setup_dialogs))
            .add_systems(
                Update,
                (
                    update_button_colors,
                    handle_panel_buttons,
                    handle_game_id_typing,
                    update_info_texts,
                    update_move_log,
                    handle_dialog_buttons,
                    update_dialogs,
                )
                    .run_if(in_state(AppState::Ready)),
            );
    }
}

/// UI 标记组件
#[derive(Component)]
pub struct UiMarker;

/// 按钮类型
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    // 面板
    JoinGame,
    LeaveGame,
    Resign,
    ProposeDraw,
    FlipBoard,
    FocusGameId,
    // 提示框
    DismissNotice,
    // 升变选择
    Promote(PromotionPiece),
    CancelPromotion,
}

/// 房间 ID 输入框内容
#[derive(Resource, Debug, Clone, Default)]
pub struct GameIdInput {
    pub text: String,
    pub focused: bool,
}

/// 通用按钮样式
pub fn button_style() -> Node {
    Node {
        width: Val::Px(150.0),
        height: Val::Px(40.0),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        margin: UiRect::all(Val::Px(4.0)),
        ..default()
    }
}

/// 按钮颜色
pub const NORMAL_BUTTON: Color = Color::srgb(0.25, 0.25, 0.25);
pub const HOVERED_BUTTON: Color = Color::srgb(0.35, 0.35, 0.35);
pub const PRESSED_BUTTON: Color = Color::srgb(0.45, 0.45, 0.45);

/// 按钮悬停与按下配色
fn update_button_colors(
    mut interaction_query: Query<
        (&Interaction, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>, With<ButtonAction>),
    >,
) {
    for (interaction, mut color) in &mut interaction_query {
        *color = match *interaction {
            Interaction::Pressed => PRESSED_BUTTON.into(),
            Interaction::Hovered => HOVERED_BUTTON.into(),
            Interaction::None => NORMAL_BUTTON.into(),
        };
    }
}

/// 生成带文字的按钮
pub fn spawn_button(parent: &mut ChildSpawnerCommands, label: &str, action: ButtonAction) {
    parent
        .spawn((Button, button_style(), BackgroundColor(NORMAL_BUTTON), action))
        .with_children(|button| {
            button.spawn((
                Text::new(label),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}
