use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Marker resource for an app that owns canonical game state.
///
/// The dedicated server inserts this, and so does a combined app running a
/// local session. A client connected to a remote server never has it: such a
/// client may only *request* state changes and wait for them to come back as
/// [`crate::protocol::ServerMessage`]s.
#[derive(Debug, Default, Clone, Copy, Resource)]
pub struct Authoritative;

/// Identifies a player within a session. Allocated by the server when a
/// connection is admitted and stable until the player leaves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Component,
)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// The player of a local session, where there's only ever one.
    pub const LOCAL: Self = Self(0);
}

/// Per-character sprint flag. This is the one piece of replicated state:
/// only the authoritative side assigns it directly, everyone else receives
/// it through [`crate::protocol::ServerMessage::SprintChanged`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Component)]
pub struct Character {
    pub sprinting: bool,
}

/// Current maximum ground speed in m/s. Movement reads this each frame, the
/// sprint transitions write it.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct MoveSpeed(pub f32);

/// The two speed scalars. The dedicated server can override these from its
/// config file and hands them to clients in the welcome message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
pub struct SpeedConfig {
    pub walk_speed: f32,
    pub sprint_speed: f32,
}
impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            walk_speed: 3.0,
            sprint_speed: 6.0,
        }
    }
}
impl SpeedConfig {
    /// Speed to apply for a given sprint flag.
    pub fn for_state(&self, sprinting: bool) -> f32 {
        if sprinting {
            self.sprint_speed
        } else {
            self.walk_speed
        }
    }
}

/// Fired whenever a character's sprint state is applied, on the authoritative
/// side immediately and on observers when the replicated flag arrives. UI and
/// animation can listen for this instead of polling [`Character`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Event)]
pub struct SprintChanged {
    pub player: PlayerId,
    pub sprinting: bool,
}

/// Write a sprint transition through to the character and its speed
/// parameter. Callers emit [`SprintChanged`] afterwards; re-applying the
/// current state is fine and just re-emits the notification.
pub fn apply_sprint(
    character: &mut Character,
    speed: &mut MoveSpeed,
    speeds: &SpeedConfig,
    sprinting: bool,
) {
    character.sprinting = sprinting;
    speed.0 = speeds.for_state(sprinting);
}

/// Registers the state shared between client and server apps. A combined
/// app gets this from both of its halves, so it isn't unique.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharacterPlugin;
impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpeedConfig>()
            .add_event::<SprintChanged>();
    }
    fn is_unique(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_tracks_sprint_state() {
        let speeds = SpeedConfig::default();
        let mut character = Character::default();
        let mut speed = MoveSpeed(speeds.walk_speed);

        apply_sprint(&mut character, &mut speed, &speeds, true);
        assert!(character.sprinting);
        assert_eq!(speed.0, speeds.sprint_speed);

        apply_sprint(&mut character, &mut speed, &speeds, false);
        assert!(!character.sprinting);
        assert_eq!(speed.0, speeds.walk_speed);
    }

    #[test]
    fn transitions_are_idempotent() {
        let speeds = SpeedConfig::default();
        let mut character = Character::default();
        let mut speed = MoveSpeed(speeds.walk_speed);

        apply_sprint(&mut character, &mut speed, &speeds, true);
        apply_sprint(&mut character, &mut speed, &speeds, true);
        assert!(character.sprinting);
        assert_eq!(speed.0, speeds.sprint_speed);
    }

    #[test]
    fn arbitrary_sequences_keep_speed_consistent() {
        let speeds = SpeedConfig {
            walk_speed: 2.5,
            sprint_speed: 7.25,
        };
        let mut character = Character::default();
        let mut speed = MoveSpeed(speeds.walk_speed);

        for &state in &[true, true, false, true, false, false, true] {
            apply_sprint(&mut character, &mut speed, &speeds, state);
            assert_eq!(character.sprinting, state);
            assert_eq!(speed.0, speeds.for_state(state));
        }
    }
}
