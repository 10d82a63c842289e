//! Small motion and color helpers shared by behavior variants.

use glam::Vec2;

use super::Color;
use crate::actor::Actor;

pub fn saturate(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Ease velocity toward `destination`, capping speed at `max_speed`.
///
/// Close to the destination the actor brakes instead of overshooting.
pub fn smooth_fly_near(actor: &mut Actor, destination: Vec2, max_speed: f32, acceleration: f32) {
    const ARRIVE_RADIUS: f32 = 24.0;

    let offset = destination - actor.position;
    let distance = offset.length();
    let desired = if distance <= ARRIVE_RADIUS {
        offset * (distance / ARRIVE_RADIUS) * 0.5
    } else {
        offset.normalize_or_zero() * max_speed
    };
    actor.velocity = actor.velocity.lerp(desired, saturate(acceleration));
}

/// Slow down uniformly.
pub fn decelerate(actor: &mut Actor, factor: f32) {
    actor.velocity *= saturate(factor);
}

/// Orient the actor along its velocity.
pub fn face_velocity(actor: &mut Actor) {
    if actor.velocity.length_squared() > f32::EPSILON {
        actor.rotation = actor.velocity.y.atan2(actor.velocity.x);
    }
}

/// Scale the alpha channel of `color`.
pub fn scale_alpha(color: Color, factor: f32) -> Color {
    let [r, g, b, a] = color;
    [r, g, b, (a as f32 * saturate(factor)).round() as u8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorId, ActorType};

    #[test]
    fn fly_near_heads_toward_destination() {
        let mut actor = Actor::new(ActorId(0), ActorType(1), Vec2::ZERO, 1);
        smooth_fly_near(&mut actor, Vec2::new(500.0, 0.0), 20.0, 1.0);
        assert_eq!(actor.velocity, Vec2::new(20.0, 0.0));

        face_velocity(&mut actor);
        assert_eq!(actor.rotation, 0.0);
    }

    #[test]
    fn alpha_scaling() {
        assert_eq!(scale_alpha([10, 20, 30, 200], 0.5), [10, 20, 30, 100]);
        assert_eq!(scale_alpha([10, 20, 30, 200], 3.0), [10, 20, 30, 200]);
    }
}
