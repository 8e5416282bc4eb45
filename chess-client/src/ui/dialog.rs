//! 模态提示框与升变选择

use bevy::prelude::*;
use protocol::PromotionPiece;

use super::{spawn_button, ButtonAction, UiMarker};
use crate::game::{cancel_promotion, choose_promotion, ClientGame, InputState};
use crate::network::NetworkEvent;
use crate::theme::ColorTheme;

/// 提示框根节点
#[derive(Component)]
pub struct NoticeOverlay;

/// 提示文字
#[derive(Component)]
pub struct NoticeText;

/// 升变选择根节点
#[derive(Component)]
pub struct PromotionOverlay;

/// 升变选项显示名称
pub fn promotion_label(piece: PromotionPiece) -> &'static str {
    match piece {
        PromotionPiece::Queen => "Dama",
        PromotionPiece::Rook => "Torre",
        PromotionPiece::Bishop => "Bispo",
        PromotionPiece::Knight => "Cavalo",
    }
}

fn overlay_node() -> Node {
    Node {
        position_type: PositionType::Absolute,
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        ..default()
    }
}

fn dialog_box_node() -> Node {
    Node {
        flex_direction: FlexDirection::Column,
        align_items: AlignItems::Center,
        padding: UiRect::all(Val::Px(20.0)),
        row_gap: Val::Px(12.0),
        ..default()
    }
}

/// 生成隐藏的提示框和升变选择
pub fn setup_dialogs(mut commands: Commands, theme: Res<ColorTheme>) {
    commands
        .spawn((
            overlay_node(),
            BackgroundColor(theme.overlay_background),
            GlobalZIndex(10),
            Visibility::Hidden,
            UiMarker,
            NoticeOverlay,
        ))
        .with_children(|overlay| {
            overlay
                .spawn((
                    dialog_box_node(),
                    BackgroundColor(theme.panel_background),
                    BorderRadius::all(Val::Px(8.0)),
                ))
                .with_children(|dialog| {
                    dialog.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: 22.0,
                            ..default()
                        },
                        TextColor(theme.panel_text),
                        NoticeText,
                    ));
                    spawn_button(dialog, "OK", ButtonAction::DismissNotice);
                });
        });

    commands
        .spawn((
            overlay_node(),
            BackgroundColor(theme.overlay_background),
            GlobalZIndex(5),
            Visibility::Hidden,
            UiMarker,
            PromotionOverlay,
        ))
        .with_children(|overlay| {
            overlay
                .spawn((
                    dialog_box_node(),
                    BackgroundColor(theme.panel_background),
                    BorderRadius::all(Val::Px(8.0)),
                ))
                .with_children(|dialog| {
                    dialog.spawn((
                        Text::new("Promover para:"),
                        TextFont {
                            font_size: 22.0,
                            ..default()
                        },
                        TextColor(theme.panel_text),
                    ));
                    dialog
                        .spawn(Node {
                            flex_direction: FlexDirection::Row,
                            ..default()
                        })
                        .with_children(|row| {
                            for piece in PromotionPiece::ALL {
                                spawn_button(row, promotion_label(piece), ButtonAction::Promote(piece));
                            }
                        });
                    spawn_button(dialog, "Cancelar", ButtonAction::CancelPromotion);
                });
        });
}

/// 根据会话切换提示框与升变选择的显示
pub fn update_dialogs(
    game: Res<ClientGame>,
    mut notice_query: Query<&mut Visibility, (With<NoticeOverlay>, Without<PromotionOverlay>)>,
    mut promotion_query: Query<&mut Visibility, (With<PromotionOverlay>, Without<NoticeOverlay>)>,
    mut text_query: Query<&mut Text, With<NoticeText>>,
) {
    if !game.is_changed() {
        return;
    }

    let notice = game.current_notice();
    for mut visibility in &mut notice_query {
        visibility.set_if_neq(if notice.is_some() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        });
    }
    if let Some(notice) = notice {
        for mut text in &mut text_query {
            text.0 = notice.text.clone();
        }
    }

    let pending = matches!(game.input, InputState::AwaitingPromotion { .. });
    for mut visibility in &mut promotion_query {
        visibility.set_if_neq(if pending {
            Visibility::Visible
        } else {
            Visibility::Hidden
        });
    }
}

/// 处理提示框与升变按钮
pub fn handle_dialog_buttons(
    interaction_query: Query<(&Interaction, &ButtonAction), (Changed<Interaction>, With<Button>)>,
    mut game: ResMut<ClientGame>,
    mut network_events: MessageWriter<NetworkEvent>,
) {
    for (interaction, action) in &interaction_query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match *action {
            ButtonAction::DismissNotice => {
                game.dismiss_notice();
            }
            ButtonAction::Promote(piece) => match choose_promotion(&mut game, piece) {
                Ok(intent) => {
                    network_events.write(NetworkEvent::SendMove(intent));
                }
                Err(e) => warn!("Promotion choice dropped: {}", e),
            },
            ButtonAction::CancelPromotion => {
                cancel_promotion(&mut game);
            }
            _ => {}
        }
    }
}
