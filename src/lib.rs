use bevy::prelude::*;
use holdout_client::player::LocalPlayerId;
use holdout_client::SessionState;
use holdout_common::character::PlayerId;
use tracing::info;

/// Glue for the combined build: no networking, just a local session where
/// our own character runs with authority.
#[derive(Debug, Default, Clone, Copy)]
pub struct CombinedPlugin;
impl Plugin for CombinedPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, start_local_session)
            .add_systems(OnEnter(SessionState::Playing), setup_arena);
    }
}

fn start_local_session(mut commands: Commands, mut next_state: ResMut<NextState<SessionState>>) {
    info!("Starting local session");
    commands.insert_resource(LocalPlayerId(PlayerId::LOCAL));
    next_state.set(SessionState::Playing);
}

/// A floor and some light, so the template has something to walk on.
fn setup_arena(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(200.0, 200.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.35, 0.45, 0.35),
            ..default()
        })),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -1.0, 0.3, 0.0)),
    ));
}
