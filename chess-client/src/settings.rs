//! 客户端设置模块
//!
//! 设置文件位于 `<config_dir>/chess-client/settings.json`，
//! 环境变量 `CHESS_SERVER_URL`、`CHESS_GAME_ID` 优先于文件。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bevy::log::Level;
use bevy::prelude::*;
use protocol::{DEFAULT_GAME_ID, DEFAULT_SERVER_URL};
use serde::{Deserialize, Serialize};

use crate::board::DEFAULT_TILE_SIZE;

/// 服务器地址环境变量
pub const ENV_SERVER_URL: &str = "CHESS_SERVER_URL";
/// 房间 ID 环境变量
pub const ENV_GAME_ID: &str = "CHESS_GAME_ID";

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 转换为 tracing 级别
    pub fn to_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// 客户端设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct ClientSettings {
    /// WebSocket 服务器地址
    pub server_url: String,
    /// 默认房间 ID
    pub game_id: String,
    /// 格子边长（像素）
    pub tile_size: f32,
    /// 贴图加载完成后自动连接
    pub auto_connect: bool,
    /// 日志级别
    pub log_level: LogLevel,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            game_id: DEFAULT_GAME_ID.to_string(),
            tile_size: DEFAULT_TILE_SIZE,
            auto_connect: true,
            log_level: LogLevel::default(),
        }
    }
}

impl ClientSettings {
    /// 获取设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("chess-client");
            path.push("settings.json");
            path
        })
    }

    /// 加载设置并应用环境变量；任何失败都回退到默认值
    pub fn load() -> Self {
        let mut settings = match Self::settings_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(settings) => {
                    tracing::info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("Invalid settings file, using defaults: {:#}", e);
                    Self::default()
                }
            },
            Some(_) => {
                tracing::info!("No settings file, using defaults");
                Self::default()
            }
            None => {
                tracing::warn!("Config directory unavailable, using defaults");
                Self::default()
            }
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.sanitize();
        settings
    }

    /// 从指定文件加载
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    /// 记住最近加入的房间，返回是否有变化
    pub fn remember_game_id(&mut self, game_id: &str) -> bool {
        if game_id.is_empty() || self.game_id == game_id {
            return false;
        }
        self.game_id = game_id.to_string();
        true
    }

    /// 保存到默认位置
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().context("Config directory unavailable")?;
        self.save_to(&path)
    }

    /// 保存到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// 应用环境变量覆盖，空值忽略
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.trim().is_empty()) {
            self.server_url = url.trim().to_string();
        }
        if let Some(game_id) = lookup(ENV_GAME_ID).filter(|v| !v.trim().is_empty()) {
            self.game_id = game_id.trim().to_string();
        }
    }

    /// 修正不合理的数值
    fn sanitize(&mut self) {
        if !(self.tile_size.is_finite() && self.tile_size >= 16.0) {
            tracing::warn!("Invalid tile size {}, using {}", self.tile_size, DEFAULT_TILE_SIZE);
            self.tile_size = DEFAULT_TILE_SIZE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.server_url, "ws://localhost:8765");
        assert_eq!(settings.game_id, "mychessgame");
        assert_eq!(settings.tile_size, 80.0);
        assert!(settings.auto_connect);
        assert_eq!(settings.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"game_id": "sala-2", "log_level": "debug"}"#).unwrap();
        assert_eq!(settings.game_id, "sala-2");
        assert_eq!(settings.log_level, LogLevel::Debug);
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert!(settings.auto_connect);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = ClientSettings::default();
        settings.apply_env_overrides(|key| match key {
            ENV_SERVER_URL => Some("ws://example.org:9000".to_string()),
            ENV_GAME_ID => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(settings.server_url, "ws://example.org:9000");
        assert_eq!(settings.game_id, "mychessgame");
    }

    #[test]
    fn test_sanitize_tile_size() {
        let mut settings = ClientSettings { tile_size: 0.0, ..Default::default() };
        settings.sanitize();
        assert_eq!(settings.tile_size, DEFAULT_TILE_SIZE);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("chess-client-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("settings.json");

        let settings = ClientSettings {
            game_id: "torneio".to_string(),
            auto_connect: false,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(ClientSettings::load_from(&path).unwrap(), settings);

        std::fs::write(&path, "{ broken").unwrap();
        assert!(ClientSettings::load_from(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_remember_game_id() {
        let mut settings = ClientSettings::default();
        assert!(!settings.remember_game_id("mychessgame"));
        assert!(!settings.remember_game_id(""));
        assert!(settings.remember_game_id("sala-3"));
        assert_eq!(settings.game_id, "sala-3");
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::Warn.to_level(), Level::WARN);
        assert_eq!(LogLevel::Trace.to_level(), Level::TRACE);
    }
}
