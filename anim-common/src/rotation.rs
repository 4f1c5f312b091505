//! Quaternion to Euler conversion for Euler-based export formats

use glam::{Quat, Vec4};
use std::f32::consts::FRAC_PI_2;

/// Euler angles in radians, decomposed for XYZ rotation order.
///
/// The rotation they describe is `Rz(z) * Ry(y) * Rx(x)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Decompose a quaternion into XYZ Euler angles.
///
/// When `|2(wy - zx)| >= 1` the pitch is clamped to `±π/2` instead of calling `asin`,
/// so the result never contains NaN for unit input.
pub fn quat_to_euler_xyz(q: Quat) -> EulerAngles {
    let sinr_cosp = 2.0 * (q.w * q.x + q.y * q.z);
    let cosr_cosp = 1.0 - 2.0 * (q.x * q.x + q.y * q.y);
    let x = sinr_cosp.atan2(cosr_cosp);

    let sinp = 2.0 * (q.w * q.y - q.z * q.x);
    let y = if sinp.abs() >= 1.0 {
        FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };

    let siny_cosp = 2.0 * (q.w * q.z + q.x * q.y);
    let cosy_cosp = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
    let z = siny_cosp.atan2(cosy_cosp);

    EulerAngles { x, y, z }
}

/// Values written to the Euler-X, Euler-Y and Euler-Z channels of an exported track.
///
/// The X and Z angles trade places: the Euler-X channel carries `z` and the Euler-Z
/// channel carries `x`. Existing consumers of the Euler exports compensate for this
/// layout, so it must stay as is.
pub fn euler_channel_values(q: Quat) -> [f32; 3] {
    let angles = quat_to_euler_xyz(q);
    [angles.z, angles.y, angles.x]
}

/// Normalize a quaternion by its Euclidean norm.
///
/// Returns `None` if the norm is zero or not finite.
pub fn normalize_rotation(q: Quat) -> Option<Quat> {
    let v = Vec4::from(q);
    let norm = v.length();
    if !norm.is_finite() || norm == 0.0 {
        return None;
    }
    Some(Quat::from_vec4(v / norm))
}
