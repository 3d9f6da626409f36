use crate::net::Connection;
use bevy::prelude::*;
use holdout_common::character::{
    apply_sprint, Character, MoveSpeed, PlayerId, SpeedConfig, SprintChanged,
};
use holdout_common::protocol::{ClientMessage, ServerMessage};
use holdout_common::PROTOCOL_VERSION;

/// Connection that hasn't completed the handshake yet.
#[derive(Debug, Default, Clone, Copy, Component)]
pub struct Pending;

/// Source of player ids. [`PlayerId::LOCAL`] is reserved for the combined
/// build's own player, so remote ids start past it.
#[derive(Debug, Resource)]
pub struct NextPlayerId(u64);
impl Default for NextPlayerId {
    fn default() -> Self {
        Self(PlayerId::LOCAL.0 + 1)
    }
}
impl NextPlayerId {
    pub fn allocate(&mut self) -> PlayerId {
        let id = PlayerId(self.0);
        self.0 += 1;
        id
    }
}

pub(crate) fn version_compatible(theirs: &str) -> bool {
    theirs == PROTOCOL_VERSION
}

/// Run the handshake for pending connections. A good hello gets a player
/// record (id, character, speed) and a welcome; a bad one gets refused.
pub fn admit_players(
    mut commands: Commands,
    mut pending: Query<(Entity, &mut Connection), With<Pending>>,
    mut admitted: Query<&mut Connection, Without<Pending>>,
    mut ids: ResMut<NextPlayerId>,
    speeds: Res<SpeedConfig>,
) {
    for (entity, mut conn) in &mut pending {
        while let Some(msg) = conn.try_read() {
            match msg {
                Some(ClientMessage::Hello { version }) => {
                    if !version_compatible(&version) {
                        warn!(addr = %conn.addr, %version, "Refusing client on a mismatched version");
                        conn.send(ServerMessage::Refused {
                            reason: format!("version mismatch: server is on {PROTOCOL_VERSION}"),
                        });
                        commands.entity(entity).despawn();
                        break;
                    }
                    let id = ids.allocate();
                    info!(addr = %conn.addr, ?id, "Player joined");
                    conn.send(ServerMessage::Welcome {
                        version: PROTOCOL_VERSION.to_string(),
                        player: id,
                        speeds: *speeds,
                    });
                    for mut other in &mut admitted {
                        other.send(ServerMessage::PlayerJoined { player: id });
                    }
                    commands.entity(entity).remove::<Pending>().insert((
                        id,
                        Character::default(),
                        MoveSpeed(speeds.walk_speed),
                    ));
                    break;
                }
                Some(other) => {
                    warn!(addr = %conn.addr, ?other, "Unexpected message before hello");
                }
                None => {
                    info!(addr = %conn.addr, "Connection closed before hello");
                    commands.entity(entity).despawn();
                    break;
                }
            }
        }
    }
}

/// Handle requests from admitted players. This is the single writer of the
/// replicated sprint flag: transitions are applied to the player's record
/// here, notified locally, and fanned out to every connection.
pub fn handle_requests(
    mut commands: Commands,
    mut players: Query<
        (
            Entity,
            &PlayerId,
            &mut Connection,
            &mut Character,
            &mut MoveSpeed,
        ),
        Without<Pending>,
    >,
    speeds: Res<SpeedConfig>,
    mut changed: EventWriter<SprintChanged>,
) {
    let mut broadcasts = Vec::new();
    let mut closed = Vec::new();
    for (entity, &id, mut conn, mut character, mut speed) in &mut players {
        while let Some(msg) = conn.try_read() {
            let sprinting = match msg {
                Some(ClientMessage::StartSprint) => true,
                Some(ClientMessage::StopSprint) => false,
                Some(ClientMessage::Hello { .. }) => {
                    warn!(addr = %conn.addr, "Duplicate hello ignored");
                    continue;
                }
                None => {
                    info!(addr = %conn.addr, ?id, "Player left");
                    broadcasts.push(ServerMessage::PlayerLeft { player: id });
                    closed.push(entity);
                    commands.entity(entity).despawn();
                    break;
                }
            };
            apply_sprint(&mut character, &mut speed, &speeds, sprinting);
            changed.write(SprintChanged {
                player: id,
                sprinting,
            });
            broadcasts.push(ServerMessage::SprintChanged {
                player: id,
                sprinting,
            });
        }
    }
    if !broadcasts.is_empty() {
        for (entity, _, mut conn, _, _) in &mut players {
            if closed.contains(&entity) {
                continue;
            }
            for msg in &broadcasts {
                conn.send(msg.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_past_local_and_never_repeat() {
        let mut ids = NextPlayerId::default();
        let first = ids.allocate();
        let second = ids.allocate();
        assert_ne!(first, PlayerId::LOCAL);
        assert_ne!(second, PlayerId::LOCAL);
        assert_ne!(first, second);
    }

    #[test]
    fn only_matching_versions_are_admitted() {
        assert!(version_compatible(PROTOCOL_VERSION));
        assert!(!version_compatible("0.0.0-something-else"));
    }
}
