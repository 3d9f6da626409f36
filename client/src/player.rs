use bevy::prelude::*;
use bevy::render::view::RenderLayers;
use holdout_common::character::{Character, MoveSpeed, PlayerId, SpeedConfig};

/// Marks the one character this app controls.
#[derive(Debug, Default, Clone, Copy, Component)]
pub struct LocalPlayer;

/// Id the server assigned to us. A local session uses [`PlayerId::LOCAL`].
#[derive(Debug, Clone, Copy, Resource)]
pub struct LocalPlayerId(pub PlayerId);

/// Raw input for the current frame, decomposed from the bound actions.
/// Movement and aim systems consume this; nothing here is smoothed or
/// buffered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Resource)]
pub struct AttemptedMotion {
    pub walk: Vec2,
    pub jump: bool,
    pub look: Vec2,
}

/// Vertical and carried velocity for the jump/fall kinematics.
#[derive(Debug, Clone, Copy, Component)]
pub struct Body {
    pub velocity: Vec3,
    pub grounded: bool,
}
impl Default for Body {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            grounded: true,
        }
    }
}

pub const CAPSULE_RADIUS: f32 = 0.34;
pub const CAPSULE_HALF_HEIGHT: f32 = 0.96;
/// Capsule-center height when standing on the ground plane.
pub const REST_HEIGHT: f32 = CAPSULE_HALF_HEIGHT;
/// Eye position relative to the capsule center.
pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 0.72, -0.06);
pub const FIRST_PERSON_FOV_DEGREES: f32 = 70.0;
/// First-person arms are drawn slightly shrunk, as is traditional.
pub const ARMS_SCALE: f32 = 0.6;
const ARMS_OFFSET: Vec3 = Vec3::new(0.0, 0.45, -0.25);

/// Render layer for meshes only the owning camera should draw (the arms).
pub const FIRST_PERSON_LAYER: usize = 1;
/// Render layer for the world-space body, which the owning first-person
/// camera must *not* draw.
pub const WORLD_BODY_LAYER: usize = 2;

pub(crate) fn base_components(id: PlayerId, speeds: &SpeedConfig) -> impl Bundle {
    (
        LocalPlayer,
        id,
        Character::default(),
        MoveSpeed(speeds.walk_speed),
        Body::default(),
        Transform::from_xyz(0.0, REST_HEIGHT, 0.0),
        Visibility::default(),
    )
}

/// Build the first-person rig: capsule-sized root with the camera and the
/// owner-only arms as children. Everything here is created once and never
/// reassigned.
pub fn spawn_player(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    speeds: Res<SpeedConfig>,
    id: Option<Res<LocalPlayerId>>,
) {
    let id = id.map_or(PlayerId::LOCAL, |id| id.0);
    info!(?id, "Spawning first person rig");
    let arms_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.8, 0.7, 0.6),
        ..default()
    });
    let body_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.3, 0.4, 0.8),
        ..default()
    });
    commands
        .spawn(base_components(id, &speeds))
        .with_children(|parent| {
            parent.spawn((
                Camera3d::default(),
                Projection::Perspective(PerspectiveProjection {
                    fov: FIRST_PERSON_FOV_DEGREES.to_radians(),
                    ..default()
                }),
                Transform::from_translation(CAMERA_OFFSET),
                RenderLayers::from_layers(&[0, FIRST_PERSON_LAYER]),
                crate::camera::FirstPersonCamera::default(),
            ));
            // Stand-in arms, seen only by our own camera
            parent.spawn((
                Mesh3d(meshes.add(Capsule3d::new(0.08, 0.5))),
                MeshMaterial3d(arms_material),
                Transform::from_translation(ARMS_OFFSET)
                    .with_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2))
                    .with_scale(Vec3::splat(ARMS_SCALE)),
                RenderLayers::layer(FIRST_PERSON_LAYER),
            ));
            // World-space representation, hidden from our own camera
            parent.spawn((
                Mesh3d(meshes.add(Capsule3d::new(
                    CAPSULE_RADIUS,
                    2.0 * (CAPSULE_HALF_HEIGHT - CAPSULE_RADIUS),
                ))),
                MeshMaterial3d(body_material),
                Transform::default(),
                RenderLayers::layer(WORLD_BODY_LAYER),
            ));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rig_starts_at_walk_speed() {
        let speeds = SpeedConfig::default();
        let mut world = World::new();
        let entity = world.spawn(base_components(PlayerId::LOCAL, &speeds)).id();

        assert_eq!(
            world.get::<MoveSpeed>(entity).unwrap().0,
            speeds.walk_speed
        );
        assert!(!world.get::<Character>(entity).unwrap().sprinting);
        assert!(world.get::<Body>(entity).unwrap().grounded);
    }
}
