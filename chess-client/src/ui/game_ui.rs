//! 对局信息面板
//!
//! 玩家 ID、阵营、连接状态、对局状态、结果、走子记录与操作按钮。

use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::input::ButtonState;
use bevy::prelude::*;

use super::{spawn_button, ButtonAction, GameIdInput, UiMarker};
use crate::game::ClientGame;
use crate::network::{NetworkEvent, NetworkState};
use crate::theme::ColorTheme;

/// 房间 ID 最大长度
const MAX_GAME_ID_LEN: usize = 64;

/// 面板上的文字字段
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfoText {
    PlayerId,
    PlayerSide,
    Connection,
    GameId,
    Status,
    Outcome,
}

/// 走子记录容器
#[derive(Component)]
pub struct MoveLogDisplay;

/// 设置对局信息面板
pub fn setup_game_ui(mut commands: Commands, theme: Res<ColorTheme>) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(20.0),
                top: Val::Px(20.0),
                bottom: Val::Px(20.0),
                width: Val::Px(360.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(15.0)),
                row_gap: Val::Px(6.0),
                ..default()
            },
            BackgroundColor(theme.panel_background),
            UiMarker,
        ))
        .with_children(|parent| {
            spawn_info_text(parent, &theme, InfoText::PlayerId, 14.0);
            spawn_info_text(parent, &theme, InfoText::PlayerSide, 18.0);
            spawn_info_text(parent, &theme, InfoText::Connection, 16.0);

            // 房间 ID 输入框
            parent
                .spawn((
                    Button,
                    Node {
                        width: Val::Percent(100.0),
                        height: Val::Px(36.0),
                        padding: UiRect::horizontal(Val::Px(8.0)),
                        align_items: AlignItems::Center,
                        ..default()
                    },
                    BackgroundColor(super::NORMAL_BUTTON),
                    ButtonAction::FocusGameId,
                ))
                .with_children(|field| {
                    field.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: 16.0,
                            ..default()
                        },
                        TextColor(theme.panel_text),
                        InfoText::GameId,
                    ));
                });

            parent
                .spawn(Node {
                    flex_direction: FlexDirection::Row,
                    flex_wrap: FlexWrap::Wrap,
                    ..default()
                })
                .with_children(|buttons| {
                    spawn_button(buttons, "Entrar no jogo", ButtonAction::JoinGame);
                    spawn_button(buttons, "Sair", ButtonAction::LeaveGame);
                    spawn_button(buttons, "Inverter tabuleiro", ButtonAction::FlipBoard);
                    spawn_button(buttons, "Desistir", ButtonAction::Resign);
                    spawn_button(buttons, "Propor empate", ButtonAction::ProposeDraw);
                });

            spawn_info_text(parent, &theme, InfoText::Status, 18.0);
            spawn_info_text(parent, &theme, InfoText::Outcome, 18.0);

            parent.spawn((
                Text::new("Lances"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(theme.panel_text),
            ));

            parent.spawn((
                Node {
                    flex_direction: FlexDirection::Column,
                    flex_grow: 1.0,
                    overflow: Overflow::clip_y(),
                    ..default()
                },
                MoveLogDisplay,
            ));
        });
}

fn spawn_info_text(parent: &mut ChildSpawnerCommands, theme: &ColorTheme, field: InfoText, size: f32) {
    parent.spawn((
        Text::new(""),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(theme.panel_text),
        field,
    ));
}

/// 刷新面板文字
pub fn update_info_texts(
    game: Res<ClientGame>,
    network: Res<NetworkState>,
    input: Res<GameIdInput>,
    mut query: Query<(&mut Text, &InfoText)>,
) {
    for (mut text, field) in &mut query {
        let value = match field {
            InfoText::PlayerId => format!("Seu ID: {}", game.player_id),
            InfoText::PlayerSide => game.side_text(),
            InfoText::Connection => network.status.display_text().to_string(),
            InfoText::GameId => {
                let cursor = if input.focused { "_" } else { "" };
                format!("Sala: {}{}", input.text, cursor)
            }
            InfoText::Status => game.status_text(),
            InfoText::Outcome => game.outcome_text().unwrap_or_default(),
        };
        if text.0 != value {
            text.0 = value;
        }
    }
}

/// 快照变化时重建走子记录
pub fn update_move_log(
    game: Res<ClientGame>,
    theme: Res<ColorTheme>,
    mut commands: Commands,
    query: Query<(Entity, Option<&Children>), With<MoveLogDisplay>>,
) {
    if !game.is_changed() {
        return;
    }

    for (entity, children) in query.iter() {
        if let Some(children) = children {
            for child in children.iter() {
                commands.entity(child).despawn();
            }
        }

        commands.entity(entity).with_children(|parent| {
            for row in game.move_log() {
                parent.spawn((
                    Text::new(row.to_string()),
                    TextFont {
                        font_size: 14.0,
                        ..default()
                    },
                    TextColor(theme.panel_text),
                ));
            }
        });
    }
}

/// 处理面板按钮
pub fn handle_panel_buttons(
    interaction_query: Query<(&Interaction, &ButtonAction), (Changed<Interaction>, With<Button>)>,
    mut game: ResMut<ClientGame>,
    mut input: ResMut<GameIdInput>,
    mut network_events: MessageWriter<NetworkEvent>,
) {
    for (interaction, action) in &interaction_query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match action {
            ButtonAction::JoinGame => {
                input.focused = false;
                network_events.write(NetworkEvent::Connect { game_id: input.text.clone() });
            }
            ButtonAction::LeaveGame => {
                network_events.write(NetworkEvent::Disconnect);
            }
            ButtonAction::Resign => {
                network_events.write(NetworkEvent::Resign);
            }
            ButtonAction::ProposeDraw => {
                network_events.write(NetworkEvent::ProposeDraw);
            }
            ButtonAction::FlipBoard => {
                game.toggle_flip();
            }
            ButtonAction::FocusGameId => {
                input.focused = true;
            }
            _ => {}
        }
    }
}

/// 编辑结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Unchanged,
    Changed,
    Submit,
    Cancel,
}

/// 对输入框应用一次按键
pub fn edit_game_id(buffer: &mut String, key: &Key) -> EditOutcome {
    match key {
        Key::Character(chars) => {
            let mut changed = false;
            for c in chars.chars().filter(|c| !c.is_control()) {
                if buffer.chars().count() >= MAX_GAME_ID_LEN {
                    break;
                }
                buffer.push(c);
                changed = true;
            }
            if changed {
                EditOutcome::Changed
            } else {
                EditOutcome::Unchanged
            }
        }
        Key::Space if buffer.chars().count() < MAX_GAME_ID_LEN => {
            buffer.push(' ');
            EditOutcome::Changed
        }
        Key::Backspace => {
            if buffer.pop().is_some() {
                EditOutcome::Changed
            } else {
                EditOutcome::Unchanged
            }
        }
        Key::Enter => EditOutcome::Submit,
        Key::Escape => EditOutcome::Cancel,
        _ => EditOutcome::Unchanged,
    }
}

/// 输入框获得焦点时接收键盘输入
pub fn handle_game_id_typing(
    mut keyboard_events: MessageReader<KeyboardInput>,
    mut input: ResMut<GameIdInput>,
    mut network_events: MessageWriter<NetworkEvent>,
) {
    if !input.focused {
        keyboard_events.clear();
        return;
    }

    for event in keyboard_events.read() {
        if event.state != ButtonState::Pressed {
            continue;
        }
        match edit_game_id(&mut input.text, &event.logical_key) {
            EditOutcome::Submit => {
                input.focused = false;
                network_events.write(NetworkEvent::Connect { game_id: input.text.clone() });
            }
            EditOutcome::Cancel => {
                input.focused = false;
            }
            EditOutcome::Changed | EditOutcome::Unchanged => {}
        }
    }
}
