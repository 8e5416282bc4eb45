//! 加载与贴图错误界面

use bevy::prelude::*;

use super::UiMarker;
use crate::theme::ColorTheme;

/// 贴图加载失败提示
pub const ASSET_ERROR_TEXT: &str = "Erro ao carregar imagens. Verifique o console.";

/// 加载界面标记
#[derive(Component)]
pub struct LoadingMarker;

fn centered_text(text: &str, size: f32, color: Color) -> impl Bundle {
    (
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        children![(
            Text::new(text),
            TextFont {
                font_size: size,
                ..default()
            },
            TextColor(color),
        )],
    )
}

pub fn setup_loading_ui(mut commands: Commands, theme: Res<ColorTheme>) {
    commands.spawn((
        centered_text("Carregando imagens...", 24.0, theme.panel_text),
        UiMarker,
        LoadingMarker,
    ));
}

pub fn cleanup_loading_ui(mut commands: Commands, query: Query<Entity, With<LoadingMarker>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

/// 贴图加载失败：不绘制棋盘，只显示错误
pub fn setup_asset_error_ui(mut commands: Commands, theme: Res<ColorTheme>) {
    error!("Piece sprites unavailable, board will not be drawn");
    commands.spawn((centered_text(ASSET_ERROR_TEXT, 24.0, theme.error_text), UiMarker));
}
