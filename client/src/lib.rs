use action::Action;
use bevy::prelude::*;
use holdout_common::character::CharacterPlugin;
use leafwing_input_manager::plugin::InputManagerPlugin;

pub mod action;
pub mod camera;
pub mod input;
pub mod movement;
pub mod net;
pub mod player;
pub mod replication;
pub mod settings;

/// Where the client currently is, connection-wise.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, States)]
pub enum SessionState {
    /// Not in a session. This is where we start, and where we land if the
    /// connection drops.
    #[default]
    Offline,
    /// Socket and handshake in flight.
    Connecting,
    /// Possessing a character in a running session.
    Playing,
}

#[derive(Debug, Default, Clone, Resource)]
pub struct ClientPlugin {
    /// Server to join. `None` means somebody else (the combined build)
    /// provides a local session instead.
    pub server: Option<String>,
}
impl Plugin for ClientPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<Action>::default())
            .add_plugins(CharacterPlugin)
            .add_plugins(camera::CameraManagerPlugin)
            .init_state::<SessionState>()
            .insert_resource(self.clone())
            .init_resource::<player::AttemptedMotion>()
            .add_event::<input::SprintInput>()
            .add_event::<net::SendToServer>()
            .add_event::<replication::FromServer>()
            .add_systems(
                Startup,
                (
                    settings::load_config,
                    input::register_input,
                    choose_session,
                )
                    .chain(),
            )
            .add_systems(OnEnter(SessionState::Connecting), net::start_connecting)
            .add_systems(OnEnter(SessionState::Playing), player::spawn_player)
            .add_systems(
                Update,
                net::finish_connecting.run_if(in_state(SessionState::Connecting)),
            )
            .add_systems(
                Update,
                (
                    input::read_input,
                    input::sprint_transitions,
                    movement::move_player,
                )
                    .chain()
                    .run_if(in_state(SessionState::Playing)),
            )
            .add_systems(
                Update,
                (
                    net::poll_connection,
                    replication::handle_server_messages,
                    net::flush_outbox,
                )
                    .chain()
                    .run_if(not(in_state(SessionState::Offline))),
            );
    }
}

fn choose_session(cfg: Res<ClientPlugin>, mut next_state: ResMut<NextState<SessionState>>) {
    if cfg.server.is_some() {
        next_state.set(SessionState::Connecting);
    }
}
