use bevy::prelude::*;
use holdout_common::character::{Authoritative, CharacterPlugin};

pub mod config;
pub mod net;
pub mod player;

/// Current state of the server
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, States)]
pub enum ServerState {
    /// Not accepting anyone. When this state is entered, we tear down
    /// whatever sessions we had.
    #[default]
    Disabled,
    /// Listening and running the session.
    Running,
}

/// The authoritative half. Its app owns the canonical sprint flag for every
/// player, whether or not it also listens for remote clients.
#[derive(Debug, Default, Clone, Resource)]
pub struct ServerPlugin {
    /// Accept remote clients. Off for a purely local session.
    pub listen: bool,
}
impl Plugin for ServerPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(CharacterPlugin)
            .init_state::<ServerState>()
            .insert_resource(Authoritative)
            .insert_resource(self.clone())
            .init_resource::<player::NextPlayerId>()
            .add_systems(Startup, (config::load_config, start_listening).chain())
            .add_systems(
                Update,
                (
                    net::accept_connections,
                    player::admit_players,
                    player::handle_requests,
                )
                    .chain()
                    .run_if(in_state(ServerState::Running)),
            )
            .add_systems(OnEnter(ServerState::Disabled), cleanup_server);
    }
}

fn start_listening(
    mut commands: Commands,
    plugin: Res<ServerPlugin>,
    config: Res<config::ServerConfig>,
    mut next_state: ResMut<NextState<ServerState>>,
) {
    if !plugin.listen {
        return;
    }
    match net::Listener::spawn(&config.listen) {
        Ok(listener) => {
            commands.insert_resource(listener);
            next_state.set(ServerState::Running);
        }
        Err(err) => {
            error!(%err, addr = %config.listen, "Failed to bind the listen address");
        }
    }
}

fn cleanup_server(world: &mut World) {
    let to_despawn = world
        .query_filtered::<Entity, With<net::Connection>>()
        .iter(world)
        .collect::<Vec<_>>();
    for entity in to_despawn {
        world.despawn(entity);
    }
    world.remove_resource::<net::Listener>();
}
