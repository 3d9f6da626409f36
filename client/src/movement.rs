use crate::player::{AttemptedMotion, Body, LocalPlayer, REST_HEIGHT};
use bevy::prelude::*;
use holdout_common::character::MoveSpeed;

/// Ground acceleration is instant; in the air only this fraction of it
/// steers toward the attempted direction.
pub const AIR_CONTROL: f32 = 0.5;
/// Deceleration while falling with no directional input, m/s^2.
pub const BRAKING_DECELERATION_FALLING: f32 = 15.0;
pub const ACCELERATION: f32 = 20.0;
pub const JUMP_SPEED: f32 = 4.2;
pub const GRAVITY: f32 = 9.81;

/// Step toward `target` by at most `max_delta`.
fn approach(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let dist = delta.length();
    if dist <= max_delta || dist <= f32::EPSILON {
        target
    } else {
        current + delta * (max_delta / dist)
    }
}

/// Advance the local character. The attempted walk vector decomposes into
/// the character's right/forward axes; the speed cap comes from the
/// [`MoveSpeed`] parameter the sprint transitions maintain. There's no
/// terrain: the world is an infinite plane at y = 0.
pub fn move_player(
    time: Res<Time>,
    motion: Res<AttemptedMotion>,
    mut player: Query<(&mut Transform, &MoveSpeed, &mut Body), With<LocalPlayer>>,
) {
    let dt = time.delta_secs();
    let Ok((mut transform, speed, mut body)) = player.single_mut() else {
        // nothing possessed yet
        return;
    };

    let forward = (*transform.forward()).with_y(0.0).normalize_or_zero();
    let right = (*transform.right()).with_y(0.0).normalize_or_zero();
    let wish = (right * motion.walk.x + forward * motion.walk.y).clamp_length_max(1.0) * speed.0;

    if body.grounded {
        body.velocity.x = wish.x;
        body.velocity.z = wish.z;
        if motion.jump {
            body.velocity.y = JUMP_SPEED;
        }
    } else {
        let horizontal = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
        let steered = if motion.walk == Vec2::ZERO {
            approach(horizontal, Vec3::ZERO, BRAKING_DECELERATION_FALLING * dt)
        } else {
            approach(horizontal, wish, ACCELERATION * AIR_CONTROL * dt)
        };
        body.velocity.x = steered.x;
        body.velocity.z = steered.z;
        body.velocity.y -= GRAVITY * dt;
    }

    transform.translation += body.velocity * dt;
    if transform.translation.y <= REST_HEIGHT {
        transform.translation.y = REST_HEIGHT;
        body.velocity.y = body.velocity.y.max(0.0);
        body.grounded = true;
    } else {
        body.grounded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::base_components;
    use holdout_common::character::{PlayerId, SpeedConfig};
    use std::time::Duration;

    fn test_app() -> (App, Entity) {
        let mut app = App::new();
        app.init_resource::<AttemptedMotion>()
            .insert_resource(Time::<()>::default())
            .add_systems(Update, move_player);
        let speeds = SpeedConfig::default();
        let entity = app
            .world_mut()
            .spawn(base_components(PlayerId::LOCAL, &speeds))
            .id();
        (app, entity)
    }

    fn step(app: &mut App, dt: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(dt));
        app.update();
    }

    #[test]
    fn walking_covers_move_speed_per_second() {
        let (mut app, entity) = test_app();
        app.world_mut().resource_mut::<AttemptedMotion>().walk = Vec2::new(0.0, 1.0);
        step(&mut app, 1.0);

        // default transform faces -Z
        let transform = app.world().get::<Transform>(entity).unwrap();
        let walk = SpeedConfig::default().walk_speed;
        assert!((transform.translation.z + walk).abs() < 1e-4);
        assert!((transform.translation.x).abs() < 1e-4);
        assert!(app.world().get::<Body>(entity).unwrap().grounded);
    }

    #[test]
    fn diagonal_input_does_not_exceed_move_speed() {
        let (mut app, entity) = test_app();
        app.world_mut().resource_mut::<AttemptedMotion>().walk = Vec2::new(1.0, 1.0);
        step(&mut app, 1.0);

        let transform = app.world().get::<Transform>(entity).unwrap();
        let dist = transform.translation.with_y(0.0).length();
        assert!(dist <= SpeedConfig::default().walk_speed + 1e-4);
    }

    #[test]
    fn jump_rises_then_lands() {
        let (mut app, entity) = test_app();
        app.world_mut().resource_mut::<AttemptedMotion>().jump = true;
        step(&mut app, 0.016);
        app.world_mut().resource_mut::<AttemptedMotion>().jump = false;

        {
            let body = app.world().get::<Body>(entity).unwrap();
            let transform = app.world().get::<Transform>(entity).unwrap();
            assert!(!body.grounded);
            assert!(transform.translation.y > REST_HEIGHT);
        }

        // a 4.2 m/s hop is easily over within two seconds
        for _ in 0..125 {
            step(&mut app, 0.016);
        }
        let body = app.world().get::<Body>(entity).unwrap();
        let transform = app.world().get::<Transform>(entity).unwrap();
        assert!(body.grounded);
        assert_eq!(transform.translation.y, REST_HEIGHT);
    }

    #[test]
    fn arbitrary_walk_vectors_never_exceed_move_speed() {
        use rand::Rng;
        let (mut app, entity) = test_app();
        let mut rng = rand::rng();
        for _ in 0..50 {
            {
                let world = app.world_mut();
                world.get_mut::<Transform>(entity).unwrap().translation =
                    Vec3::new(0.0, REST_HEIGHT, 0.0);
                world.resource_mut::<AttemptedMotion>().walk =
                    Vec2::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0));
            }
            step(&mut app, 1.0);
            let transform = app.world().get::<Transform>(entity).unwrap();
            let dist = transform.translation.with_y(0.0).length();
            assert!(dist <= SpeedConfig::default().walk_speed + 1e-3);
        }
    }

    #[test]
    fn approach_clamps_to_max_delta() {
        let stepped = approach(Vec3::ZERO, Vec3::X * 10.0, 1.0);
        assert!((stepped - Vec3::X).length() < 1e-5);
        // within range we land exactly on the target
        assert_eq!(approach(Vec3::X * 9.9, Vec3::X * 10.0, 1.0), Vec3::X * 10.0);
    }
}
