use bevy::log::LogPlugin;
use bevy::prelude::*;

use chess_client::settings::ClientSettings;
use chess_client::ChessClientPlugin;

/// 主窗口
fn primary_window() -> Window {
    Window {
        title: "Xadrez Online".into(),
        resolution: (1280, 720).into(),
        ..default()
    }
}

fn main() {
    let settings = ClientSettings::load();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(primary_window()),
                    ..default()
                })
                .set(LogPlugin {
                    level: settings.log_level.to_level(),
                    ..default()
                }),
        )
        .add_plugins(ChessClientPlugin::new(settings))
        .run();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_window_size() {
        let window = primary_window();
        assert_eq!(window.title, "Xadrez Online");
        assert_eq!(window.resolution.physical_width(), 1280);
        assert_eq!(window.resolution.physical_height(), 720);
    }
}
