//! Vector helpers and the basic steering behaviours.
//!
//! Every behaviour follows the same shape: work out a desired velocity, then
//! steer with `clamp(desired - velocity, max_force)`.

use glam::Vec3;
use murmur_data::MapBounds;

/// Squared length below which a vector is treated as zero.
pub const EPSILON_SQ: f32 = 1e-12;

#[inline]
#[must_use]
pub fn clamp_magnitude(v: Vec3, max: f32) -> Vec3 {
    v.clamp_length_max(max.max(0.0))
}

/// Unit vector, or zero for (near) zero input. Never NaN.
#[inline]
#[must_use]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    if v.length_squared() <= EPSILON_SQ || !v.is_finite() {
        Vec3::ZERO
    } else {
        v.normalize()
    }
}

/// Projects onto the ground plane.
#[inline]
#[must_use]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

#[inline]
#[must_use]
pub fn steer_towards(desired: Vec3, velocity: Vec3, max_force: f32) -> Vec3 {
    clamp_magnitude(desired - velocity, max_force)
}

/// Full-speed steering straight at `target`.
#[must_use]
pub fn seek(position: Vec3, velocity: Vec3, target: Vec3, max_speed: f32, max_force: f32) -> Vec3 {
    let desired = normalize_or_zero(target - position) * max_speed;
    steer_towards(desired, velocity, max_force)
}

/// Full-speed steering directly away from `threat`.
#[must_use]
pub fn flee(position: Vec3, velocity: Vec3, threat: Vec3, max_speed: f32, max_force: f32) -> Vec3 {
    let desired = -(normalize_or_zero(threat - position) * max_speed);
    steer_towards(desired, velocity, max_force)
}

/// Like [`seek`], but the desired speed ramps down linearly inside
/// `arrive_radius`.
#[must_use]
pub fn arrive(
    position: Vec3,
    velocity: Vec3,
    target: Vec3,
    arrive_radius: f32,
    max_speed: f32,
    max_force: f32,
) -> Vec3 {
    let offset = target - position;
    let distance = offset.length();
    let speed = if arrive_radius > 0.0 && distance < arrive_radius {
        max_speed * (distance / arrive_radius)
    } else {
        max_speed
    };
    steer_towards(normalize_or_zero(offset) * speed, velocity, max_force)
}

/// Torus wrap on the ground plane: a coordinate at or past `+bound` jumps to
/// `-bound`, one below `-bound` jumps to `+bound`. The vertical axis is left
/// alone.
#[must_use]
pub fn wrap_position(mut p: Vec3, bounds: &MapBounds) -> Vec3 {
    p.x = wrap_axis(p.x, bounds.x);
    p.z = wrap_axis(p.z, bounds.z);
    p
}

#[inline]
fn wrap_axis(v: f32, bound: f32) -> f32 {
    if v >= bound {
        -bound
    } else if v < -bound {
        bound
    } else {
        v
    }
}
