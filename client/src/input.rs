use crate::action::Action;
use crate::net::SendToServer;
use crate::player::{AttemptedMotion, LocalPlayer};
use bevy::prelude::*;
use holdout_common::character::{
    apply_sprint, Authoritative, Character, MoveSpeed, PlayerId, SpeedConfig, SprintChanged,
};
use holdout_common::protocol::ClientMessage;
use leafwing_input_manager::prelude::*;

/// A sprint start (`true`) or stop (`false`) raised by input. UI can raise
/// these too; the transition logic doesn't care where they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Event)]
pub struct SprintInput(pub bool);

/// Make the action state live once the bindings are in place. If the
/// bindings never loaded we log and skip: the player stays unresponsive
/// instead of crashing.
pub fn register_input(mut commands: Commands, input: Option<Res<InputMap<Action>>>) {
    if input.is_some() {
        commands.init_resource::<ActionState<Action>>();
    } else {
        error!("No input bindings were loaded; the player will not respond to input");
    }
}

/// Decompose the bound actions into [`AttemptedMotion`] and sprint edges.
/// Pure forwarding, no smoothing or dead zones.
pub fn read_input(
    actions: Option<Res<ActionState<Action>>>,
    mut motion: ResMut<AttemptedMotion>,
    mut sprint: EventWriter<SprintInput>,
) {
    let Some(actions) = actions else {
        *motion = AttemptedMotion::default();
        return;
    };
    *motion = AttemptedMotion {
        walk: actions.clamped_axis_pair(&Action::Move),
        jump: actions.pressed(&Action::Jump),
        look: actions.axis_pair(&Action::Look),
    };
    if actions.just_pressed(&Action::Sprint) {
        sprint.write(SprintInput(true));
    }
    if actions.just_released(&Action::Sprint) {
        sprint.write(SprintInput(false));
    }
}

/// Run sprint transitions for the local character.
///
/// With authority the transition is applied right here: flag, speed, and the
/// [`SprintChanged`] notification. Without it we only send the request to the
/// server and leave all local state untouched; the change comes back through
/// replication.
pub fn sprint_transitions(
    mut requests: EventReader<SprintInput>,
    authority: Option<Res<Authoritative>>,
    speeds: Res<SpeedConfig>,
    mut player: Query<(&PlayerId, &mut Character, &mut MoveSpeed), With<LocalPlayer>>,
    mut changed: EventWriter<SprintChanged>,
    mut outbox: EventWriter<SendToServer>,
) {
    for &SprintInput(sprinting) in requests.read() {
        if authority.is_some() {
            let Ok((&id, mut character, mut speed)) = player.single_mut() else {
                continue;
            };
            apply_sprint(&mut character, &mut speed, &speeds, sprinting);
            changed.write(SprintChanged {
                player: id,
                sprinting,
            });
        } else {
            outbox.write(SendToServer(if sprinting {
                ClientMessage::StartSprint
            } else {
                ClientMessage::StopSprint
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::base_components;

    fn test_app(authoritative: bool) -> (App, Entity) {
        let mut app = App::new();
        app.init_resource::<SpeedConfig>()
            .add_event::<SprintInput>()
            .add_event::<SprintChanged>()
            .add_event::<SendToServer>()
            .add_systems(Update, sprint_transitions);
        if authoritative {
            app.insert_resource(Authoritative);
        }
        let speeds = *app.world().resource::<SpeedConfig>();
        let entity = app
            .world_mut()
            .spawn(base_components(PlayerId::LOCAL, &speeds))
            .id();
        (app, entity)
    }

    fn sent_changes(app: &App) -> Vec<SprintChanged> {
        let events = app.world().resource::<Events<SprintChanged>>();
        events.get_cursor().read(events).copied().collect()
    }

    fn sent_requests(app: &App) -> Vec<ClientMessage> {
        let events = app.world().resource::<Events<SendToServer>>();
        events
            .get_cursor()
            .read(events)
            .map(|msg| msg.0.clone())
            .collect()
    }

    #[test]
    fn missing_bindings_skip_registration_without_crashing() {
        let mut app = App::new();
        app.add_systems(Update, register_input);
        app.update();
        assert!(app
            .world()
            .get_resource::<ActionState<Action>>()
            .is_none());
    }

    #[test]
    fn authoritative_transition_applies_and_notifies_once() {
        let (mut app, entity) = test_app(true);
        app.world_mut().send_event(SprintInput(true));
        app.update();

        let speeds = *app.world().resource::<SpeedConfig>();
        assert!(app.world().get::<Character>(entity).unwrap().sprinting);
        assert_eq!(
            app.world().get::<MoveSpeed>(entity).unwrap().0,
            speeds.sprint_speed
        );
        assert_eq!(
            sent_changes(&app),
            vec![SprintChanged {
                player: PlayerId::LOCAL,
                sprinting: true
            }]
        );
        assert!(sent_requests(&app).is_empty());
    }

    #[test]
    fn authoritative_double_start_is_idempotent() {
        let (mut app, entity) = test_app(true);
        app.world_mut().send_event(SprintInput(true));
        app.world_mut().send_event(SprintInput(true));
        app.update();

        let speeds = *app.world().resource::<SpeedConfig>();
        assert!(app.world().get::<Character>(entity).unwrap().sprinting);
        assert_eq!(
            app.world().get::<MoveSpeed>(entity).unwrap().0,
            speeds.sprint_speed
        );
        // duplicate notifications are tolerated
        assert_eq!(sent_changes(&app).len(), 2);
    }

    #[test]
    fn remote_request_leaves_local_state_alone() {
        let (mut app, entity) = test_app(false);
        app.world_mut().send_event(SprintInput(true));
        app.world_mut().send_event(SprintInput(false));
        app.update();

        let speeds = *app.world().resource::<SpeedConfig>();
        assert!(!app.world().get::<Character>(entity).unwrap().sprinting);
        assert_eq!(
            app.world().get::<MoveSpeed>(entity).unwrap().0,
            speeds.walk_speed
        );
        assert!(sent_changes(&app).is_empty());
        assert_eq!(
            sent_requests(&app),
            vec![ClientMessage::StartSprint, ClientMessage::StopSprint]
        );
    }

    #[test]
    fn full_sequence_keeps_speed_consistent() {
        let (mut app, entity) = test_app(true);
        for &state in &[true, false, false, true] {
            app.world_mut().send_event(SprintInput(state));
            app.update();
            let speeds = *app.world().resource::<SpeedConfig>();
            assert_eq!(
                app.world().get::<Character>(entity).unwrap().sprinting,
                state
            );
            assert_eq!(
                app.world().get::<MoveSpeed>(entity).unwrap().0,
                speeds.for_state(state)
            );
        }
    }
}
