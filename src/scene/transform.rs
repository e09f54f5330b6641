use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local translation / rotation / scale of a scene node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
        }
    }

    pub fn from_translation(t: Vec3) -> Self {
        Self {
            translation: t,
            ..Self::IDENTITY
        }
    }

    /// Decomposes an affine matrix. Shear is lost.
    pub fn from_matrix(m: Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_places_nodes_at_parent_origin() {
        let p = Transform::default().matrix().transform_point3(Vec3::new(4.0, 5.0, 6.0));
        assert!(p.abs_diff_eq(Vec3::new(4.0, 5.0, 6.0), 1e-6));
    }

    #[test]
    fn scale_applies_before_translation() {
        let node = Transform::from_trs(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY, Vec3::splat(3.0));
        let p = node.matrix().transform_point3(Vec3::Y);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 3.0, 5.0), 1e-6));
    }

    #[test]
    fn matrix_round_trips_through_decomposition() {
        let tr = Transform::from_trs(
            Vec3::new(-4.0, 0.5, 9.0),
            Quat::from_rotation_z(0.3),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let back = Transform::from_matrix(tr.matrix());
        assert!(back.matrix().abs_diff_eq(tr.matrix(), 1e-5));
    }
}
