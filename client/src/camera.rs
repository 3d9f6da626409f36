use crate::player::{AttemptedMotion, LocalPlayer};
use crate::settings::ClientSettings;
use crate::SessionState;
use bevy::prelude::*;

/// Pitch limit, just shy of straight up/down.
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// First-person camera state: accumulated pitch in radians. Yaw lives on the
/// player body so movement follows it.
#[derive(Debug, Default, Clone, Copy, Component)]
pub struct FirstPersonCamera {
    pub pitch: f32,
}

/// Camera handling for this project. Just the default first-person aim for
/// now; project-specific camera behavior (shake, zoom, spectating) belongs
/// here.
#[derive(Debug, Default, Clone, Copy)]
pub struct CameraManagerPlugin;
impl Plugin for CameraManagerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            aim.run_if(in_state(SessionState::Playing))
                .after(crate::input::read_input),
        );
    }
}

/// Apply the attempted look vector: yaw rotates the player body, pitch tilts
/// the camera, both scaled by the configured mouse sensitivity.
pub fn aim(
    settings: Res<ClientSettings>,
    motion: Res<AttemptedMotion>,
    mut player: Query<&mut Transform, With<LocalPlayer>>,
    mut camera: Query<(&mut Transform, &mut FirstPersonCamera), Without<LocalPlayer>>,
) {
    if motion.look == Vec2::ZERO {
        return;
    }
    let Ok(mut body) = player.single_mut() else {
        return;
    };
    body.rotate_y(-motion.look.x * settings.mouse_sensitivity);
    let Ok((mut eye, mut state)) = camera.single_mut() else {
        return;
    };
    state.pitch = (state.pitch - motion.look.y * settings.mouse_sensitivity)
        .clamp(-PITCH_LIMIT, PITCH_LIMIT);
    eye.rotation = Quat::from_rotation_x(state.pitch);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::base_components;
    use holdout_common::character::{PlayerId, SpeedConfig};

    fn test_app() -> (App, Entity, Entity) {
        let mut app = App::new();
        app.init_resource::<AttemptedMotion>()
            .insert_resource(ClientSettings::default())
            .add_systems(Update, aim);
        let speeds = SpeedConfig::default();
        let player = app
            .world_mut()
            .spawn(base_components(PlayerId::LOCAL, &speeds))
            .id();
        let camera = app
            .world_mut()
            .spawn((Transform::default(), FirstPersonCamera::default()))
            .id();
        (app, player, camera)
    }

    #[test]
    fn looking_right_turns_clockwise() {
        let (mut app, player, _) = test_app();
        app.world_mut().resource_mut::<AttemptedMotion>().look = Vec2::new(10.0, 0.0);
        app.update();

        let transform = app.world().get::<Transform>(player).unwrap();
        let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
        assert!(yaw < 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let (mut app, _, camera) = test_app();
        // an absurd upward flick can't look past vertical
        app.world_mut().resource_mut::<AttemptedMotion>().look = Vec2::new(0.0, -1e6);
        app.update();

        let state = app.world().get::<FirstPersonCamera>(camera).unwrap();
        assert_eq!(state.pitch, PITCH_LIMIT);
    }
}
