//! 网络通信模块
//!
//! 使用全局静态 tokio Runtime 处理异步网络操作，Bevy 系统负责
//! 连接状态机与消息归并。

mod connection;

pub use connection::*;

use std::sync::Arc;

use bevy::prelude::*;
use protocol::{ClientMessage, GameId, MoveIntent};

use crate::game::{ClientGame, NoticeKind};
use crate::settings::ClientSettings;
use crate::AppState;

/// 网络插件
pub struct NetworkPlugin;

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(NetworkState::default())
            .insert_resource(NetworkConnectionHandle::default())
            .add_message::<NetworkEvent>()
            .add_systems(OnEnter(AppState::Ready), auto_connect)
            .add_systems(
                Update,
                (handle_network_events, poll_network)
                    .chain()
                    .run_if(in_state(AppState::Ready)),
            );
    }
}

/// 网络连接句柄（Bevy 资源）
#[derive(Resource, Default, Clone)]
pub struct NetworkConnectionHandle {
    /// 共享的网络连接
    pub connection: Arc<NetworkConnection>,
}

/// 网络状态
#[derive(Resource, Default)]
pub struct NetworkState {
    /// 连接状态
    pub status: ConnectionStatus,
    /// 当前服务器地址
    pub server_url: String,
}

/// 连接状态
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// 连接事件驱动的状态迁移
    pub fn next(self, event: &ConnectionEvent) -> ConnectionStatus {
        match event {
            ConnectionEvent::Opened => ConnectionStatus::Connected,
            ConnectionEvent::Frame(_) => self,
            ConnectionEvent::Closed => ConnectionStatus::Disconnected,
            ConnectionEvent::Failed(_) => ConnectionStatus::Error,
        }
    }

    /// 界面显示文本
    pub fn display_text(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Status da Conexão: Desconectado",
            ConnectionStatus::Connecting => "Status da Conexão: Conectando...",
            ConnectionStatus::Connected => "Status da Conexão: Conectado!",
            ConnectionStatus::Error => "Status da Conexão: Erro!",
        }
    }
}

/// 网络事件（客户端发起）
#[derive(Message, Clone, Debug)]
pub enum NetworkEvent {
    /// 连接并加入房间（重连时重建会话）
    Connect { game_id: GameId },
    /// 断开连接
    Disconnect,
    /// 发送走棋
    SendMove(MoveIntent),
    /// 认输
    Resign,
    /// 提议和棋
    ProposeDraw,
}

/// 归并一个连接事件，返回需要立即发送的消息
pub fn apply_connection_event(
    game: &mut ClientGame,
    status: &mut ConnectionStatus,
    event: ConnectionEvent,
) -> Option<ClientMessage> {
    *status = status.next(&event);
    match event {
        ConnectionEvent::Opened => {
            info!("Joining game {} as {}", game.game_id, game.player_id);
            Some(game.join_message())
        }
        ConnectionEvent::Frame(msg) => {
            debug!("Received {}", msg.kind());
            game.apply_server_message(msg);
            None
        }
        ConnectionEvent::Closed => {
            info!("Disconnected from server");
            game.connection_closed();
            None
        }
        ConnectionEvent::Failed(reason) => {
            error!("Connection failed: {}", reason);
            game.connection_failed();
            None
        }
    }
}

/// 仅在已连接时发送，否则记录错误并丢弃
fn send(conn: &NetworkConnection, status: ConnectionStatus, msg: ClientMessage) -> bool {
    if status != ConnectionStatus::Connected {
        error!("WebSocket not connected, dropping {}", msg.kind());
        return false;
    }
    let kind = msg.kind();
    match conn.queue_send(msg) {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to queue {}: {}", kind, e);
            false
        }
    }
}

/// 贴图就绪后自动连接
fn auto_connect(settings: Res<ClientSettings>, mut events: MessageWriter<NetworkEvent>) {
    if settings.auto_connect {
        events.write(NetworkEvent::Connect { game_id: settings.game_id.clone() });
    }
}

/// 处理网络事件
fn handle_network_events(
    mut events: MessageReader<NetworkEvent>,
    mut network: ResMut<NetworkState>,
    mut game: ResMut<ClientGame>,
    mut settings: ResMut<ClientSettings>,
    conn_handle: Res<NetworkConnectionHandle>,
) {
    let conn = &conn_handle.connection;
    for event in events.read() {
        match event {
            NetworkEvent::Connect { game_id } => {
                let game_id = if game_id.trim().is_empty() {
                    settings.game_id.clone()
                } else {
                    game_id.trim().to_string()
                };
                if settings.remember_game_id(&game_id) {
                    if let Err(e) = settings.save() {
                        warn!("Failed to save settings: {:#}", e);
                    }
                }
                game.reset_for_reconnect(game_id);
                network.server_url = settings.server_url.clone();
                network.status = ConnectionStatus::Connecting;

                tracing::info!("Connecting to {} for game {}", network.server_url, game.game_id);
                conn.connect(network.server_url.clone());
            }
            NetworkEvent::Disconnect => {
                tracing::info!("Leaving game {}", game.game_id);
                conn.disconnect();
                network.status = ConnectionStatus::Disconnected;
                game.connection_closed();
            }
            NetworkEvent::SendMove(intent) => {
                tracing::info!("Move: {} -> {} ({:?})", intent.from, intent.to, intent.promotion);
                send(conn, network.status, game.move_message(*intent));
            }
            NetworkEvent::Resign => {
                if send(conn, network.status, game.resign_message()) {
                    game.push_notice(NoticeKind::Info, "Você desistiu do jogo.");
                }
            }
            NetworkEvent::ProposeDraw => {
                if send(conn, network.status, game.draw_message()) {
                    game.push_notice(NoticeKind::Info, "Você propôs um empate.");
                }
            }
        }
    }
}

/// 取出连接事件并归并到会话
fn poll_network(
    mut network: ResMut<NetworkState>,
    mut game: ResMut<ClientGame>,
    conn_handle: Res<NetworkConnectionHandle>,
) {
    let events = conn_handle.connection.drain_events();
    if events.is_empty() {
        return;
    }

    for event in events {
        let mut status = network.status;
        let reply = apply_connection_event(&mut game, &mut status, event);
        network.status = status;
        if let Some(msg) = reply {
            send(&conn_handle.connection, status, msg);
        }
    }
}
