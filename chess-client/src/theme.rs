//! 主题和配色方案
//!
//! 定义棋盘格、高亮与界面的颜色配置

use bevy::prelude::*;

/// 主题插件
pub struct ThemePlugin;

impl Plugin for ThemePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ColorTheme::classic());
    }
}

/// 颜色主题配置
#[derive(Resource, Clone, Debug)]
pub struct ColorTheme {
    // 棋盘
    pub light_square: Color,
    pub dark_square: Color,

    // 交互高亮
    pub selected_highlight: Color,
    pub move_marker: Color,

    // 界面
    pub panel_background: Color,
    pub panel_text: Color,
    pub error_text: Color,
    pub overlay_background: Color,
}

impl ColorTheme {
    /// 经典木质配色
    pub fn classic() -> Self {
        Self {
            light_square: Color::srgb_u8(240, 217, 181), // #F0D9B5
            dark_square: Color::srgb_u8(181, 136, 99),   // #B58863

            selected_highlight: Color::srgba(246.0 / 255.0, 246.0 / 255.0, 105.0 / 255.0, 0.8),
            move_marker: Color::srgba(100.0 / 255.0, 0.0, 100.0 / 255.0, 0.5),

            panel_background: Color::srgb_u8(38, 36, 33),
            panel_text: Color::srgb_u8(235, 235, 235),
            error_text: Color::srgb_u8(229, 57, 53), // #E53935
            overlay_background: Color::srgba(0.0, 0.0, 0.0, 0.6),
        }
    }
}
