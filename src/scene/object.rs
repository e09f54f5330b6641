use glam::Mat4;

use super::bounds::RenderBounds;
use crate::asset::{AssetId, Handle};
use crate::renderer::batch::PassObject;
use crate::renderer::{DrawMesh, Material, PassTypeFlags, PerPassData};

/// Registration descriptor: what the scene layer knows about a mesh instance
/// before it has been resolved to handles.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshObject {
    pub mesh: AssetId,
    pub material: AssetId,
    pub transform: Mat4,
    pub bounds: RenderBounds,
    pub custom_sort_key: u32,
    pub passes: PassTypeFlags,
}

impl MeshObject {
    pub fn new(mesh: AssetId, material: AssetId) -> Self {
        Self {
            mesh,
            material,
            transform: Mat4::IDENTITY,
            bounds: RenderBounds::INVALID,
            custom_sort_key: 0,
            passes: PassTypeFlags::default(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_bounds(mut self, bounds: RenderBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_sort_key(mut self, key: u32) -> Self {
        self.custom_sort_key = key;
        self
    }

    pub fn with_passes(mut self, passes: PassTypeFlags) -> Self {
        self.passes = passes;
        self
    }
}

/// A registered renderable instance. The scene's object table is the source
/// of truth; mesh passes only hold snapshots of it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    pub mesh: Handle<DrawMesh>,
    pub material: Handle<Material>,
    pub transform: Mat4,
    pub bounds: RenderBounds,
    pub custom_sort_key: u32,
    pub passes: PassTypeFlags,
    /// Slot held in each pass, `None` while absent or awaiting insertion.
    pub pass_indices: PerPassData<Option<Handle<PassObject>>>,
    /// Position in the scene's dirty list.
    pub update_index: Option<u32>,
}

impl RenderObject {
    pub fn new(mesh: Handle<DrawMesh>, material: Handle<Material>, transform: Mat4) -> Self {
        Self {
            mesh,
            material,
            transform,
            bounds: RenderBounds::INVALID,
            custom_sort_key: 0,
            passes: PassTypeFlags::default(),
            pass_indices: PerPassData::default(),
            update_index: None,
        }
    }
}
