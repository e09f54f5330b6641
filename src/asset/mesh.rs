use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::AssetId;

/// Local-space bounds of a mesh as produced by the asset baker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshBounds {
    pub origin: Vec3,
    pub extents: Vec3,
    pub radius: f32,
}

impl MeshBounds {
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let origin = (min + max) * 0.5;
        let extents = (max - min) * 0.5;
        Self {
            origin,
            extents,
            radius: extents.length(),
        }
    }
}

impl Default for MeshBounds {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            extents: Vec3::ZERO,
            radius: 0.0,
        }
    }
}

/// What the mesh loader hands over for each loaded primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshAsset {
    pub id: AssetId,
    pub vertex_count: u32,
    pub index_count: u32,
    #[serde(default)]
    pub bounds: MeshBounds,
}

impl MeshAsset {
    pub fn new(id: AssetId, vertex_count: u32, index_count: u32) -> Self {
        Self {
            id,
            vertex_count,
            index_count,
            bounds: MeshBounds::default(),
        }
    }

    pub fn with_bounds(mut self, bounds: MeshBounds) -> Self {
        self.bounds = bounds;
        self
    }
}
