use crate::player::{LocalPlayer, LocalPlayerId};
use crate::SessionState;
use bevy::prelude::*;
use holdout_common::character::{
    apply_sprint, Character, MoveSpeed, PlayerId, SpeedConfig, SprintChanged,
};
use holdout_common::protocol::ServerMessage;
use holdout_common::PROTOCOL_VERSION;

/// A decoded message from the server, queued by the connection poll.
#[derive(Debug, Clone, PartialEq, Event)]
pub struct FromServer(pub ServerMessage);

/// Apply replicated state changes.
///
/// This is the only place a non-authoritative app mutates the sprint flag:
/// the authoritative value arrives here, the matching speed is applied, and
/// the same [`SprintChanged`] notification fires that the authoritative side
/// raised when it made the change.
pub fn handle_server_messages(
    mut commands: Commands,
    mut messages: EventReader<FromServer>,
    mut speeds: ResMut<SpeedConfig>,
    local_id: Option<Res<LocalPlayerId>>,
    mut player: Query<(&PlayerId, &mut Character, &mut MoveSpeed), With<LocalPlayer>>,
    mut changed: EventWriter<SprintChanged>,
    mut next_state: ResMut<NextState<SessionState>>,
) {
    for FromServer(msg) in messages.read() {
        match msg {
            ServerMessage::Welcome {
                version,
                player,
                speeds: server_speeds,
            } => {
                if version != PROTOCOL_VERSION {
                    warn!(ours = PROTOCOL_VERSION, theirs = %version, "Version mismatch with the server");
                }
                info!(id = ?player, "Joined the session");
                *speeds = *server_speeds;
                commands.insert_resource(LocalPlayerId(*player));
                next_state.set(SessionState::Playing);
            }
            ServerMessage::Refused { reason } => {
                error!(%reason, "Server refused the connection");
                commands.remove_resource::<crate::net::ClientConnection>();
                next_state.set(SessionState::Offline);
            }
            ServerMessage::PlayerJoined { player } => {
                info!(id = ?player, "Player joined");
            }
            ServerMessage::PlayerLeft { player } => {
                info!(id = ?player, "Player left");
            }
            ServerMessage::SprintChanged {
                player: id,
                sprinting,
            } => {
                changed.write(SprintChanged {
                    player: *id,
                    sprinting: *sprinting,
                });
                if local_id.as_deref().is_some_and(|local| local.0 == *id) {
                    if let Ok((_, mut character, mut speed)) = player.single_mut() {
                        apply_sprint(&mut character, &mut speed, &speeds, *sprinting);
                    }
                }
            }
        }
    }
}
