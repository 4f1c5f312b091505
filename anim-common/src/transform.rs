//! Rigid transform sample (translation, rotation, scale)

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// One decoded bone transform, either a reference pose entry or an animation sample.
///
/// The rotation is stored exactly as decoded and is not guaranteed to be unit length.
/// Serialized form is `{ "translation": [x, y, z], "rotation": [x, y, z, w], "scale": [x, y, z] }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl FrameTransform {
    /// Identity transform (no rotation, no translation, unit scale)
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Translation-only transform
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_arrays() {
        let json = r#"{ "translation": [1.0, 2.0, 3.0], "rotation": [0.0, 0.0, 0.0, 1.0] }"#;
        let t: FrameTransform = serde_json::from_str(json).unwrap();
        assert_eq!(t.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE, "missing scale defaults to one");
    }

    #[test]
    fn test_rotation_is_not_normalized_on_load() {
        let json = r#"{ "translation": [0, 0, 0], "rotation": [0, 0, 0, 2], "scale": [1, 1, 1] }"#;
        let t: FrameTransform = serde_json::from_str(json).unwrap();
        assert_eq!(t.rotation.w, 2.0);
    }
}
