//! Vector helpers shared by the locomotion code.

use nalgebra::Vector3;

use super::constants::motor::EPSILON;

/// Removes the component of `vector` along `plane_normal`.
///
/// `plane_normal` need not be unit length. A zero normal leaves the vector untouched.
pub fn project_on_plane(vector: &Vector3<f32>, plane_normal: &Vector3<f32>) -> Vector3<f32> {
    let sqr = plane_normal.norm_squared();
    if sqr < EPSILON * EPSILON {
        return *vector;
    }
    vector - plane_normal * (vector.dot(plane_normal) / sqr)
}

/// Scales `vector` down so its length does not exceed `max_length`.
pub fn clamp_magnitude(vector: &Vector3<f32>, max_length: f32) -> Vector3<f32> {
    let sqr = vector.norm_squared();
    if sqr > max_length * max_length {
        vector * (max_length / sqr.sqrt())
    } else {
        *vector
    }
}

/// Unit vector in the direction of `vector`, or zero for a degenerate input.
pub fn normalize_or_zero(vector: &Vector3<f32>) -> Vector3<f32> {
    vector.try_normalize(EPSILON).unwrap_or_else(Vector3::zeros)
}

/// Blend factor of the exponential smoothing law for one step.
///
/// Always in `[0, 1)` for non-negative `response` and `dt`.
pub fn smoothing_factor(response: f32, dt: f32) -> f32 {
    1.0 - (-response * dt.max(0.0)).exp()
}

/// Moves `current` toward `target` with rate `response` over `dt`.
pub fn exp_smooth(current: &Vector3<f32>, target: &Vector3<f32>, response: f32, dt: f32) -> Vector3<f32> {
    current.lerp(target, smoothing_factor(response, dt))
}
