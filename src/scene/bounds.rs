use glam::{Mat4, Vec3};

use crate::asset::MeshBounds;

/// World-space bounds of a render object, consumed by GPU culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderBounds {
    pub origin: Vec3,
    pub radius: f32,
    pub extents: Vec3,
    pub valid: bool,
}

impl Default for RenderBounds {
    fn default() -> Self {
        Self::INVALID
    }
}

impl RenderBounds {
    pub const INVALID: Self = Self {
        origin: Vec3::ZERO,
        radius: 0.0,
        extents: Vec3::ZERO,
        valid: false,
    };

    /// Transforms the eight corners of the local box and refits an
    /// axis-aligned box and sphere around them.
    pub fn from_mesh(local: &MeshBounds, transform: Mat4) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);

        for i in 0..8u32 {
            let sign = Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { -1.0 } else { 1.0 },
            );
            let corner = transform.transform_point3(local.origin + local.extents * sign);
            min = min.min(corner);
            max = max.max(corner);
        }

        let extents = (max - min) * 0.5;
        Self {
            origin: (max + min) * 0.5,
            radius: extents.length(),
            extents,
            valid: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn translated_unit_box() {
        let local = MeshBounds::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0));
        let bounds = RenderBounds::from_mesh(&local, Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));

        assert!(bounds.valid);
        assert!(bounds.origin.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
        assert!(bounds.extents.abs_diff_eq(Vec3::ONE, 1e-5));
    }

    #[test]
    fn rotation_grows_axis_aligned_extents() {
        let local = MeshBounds::from_min_max(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let rot = Mat4::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let bounds = RenderBounds::from_mesh(&local, rot);

        let expected = 2f32.sqrt();
        assert!((bounds.extents.x - expected).abs() < 1e-5);
        assert!((bounds.extents.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn default_is_invalid() {
        assert!(!RenderBounds::default().valid);
    }
}
