use crate::asset::{AssetId, HandleRegistry, MeshAsset, MeshBounds};

/// Draw ranges for one registered mesh.
///
/// `first_index` and `first_vertex` locate the mesh inside the global merged
/// vertex/index buffers and only mean something once `is_merged` is set;
/// before that the mesh is drawn from its own buffers starting at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawMesh {
    pub first_index: u32,
    pub first_vertex: u32,
    pub index_count: u32,
    pub vertex_count: u32,
    pub is_merged: bool,
    pub bounds: MeshBounds,
    pub original: AssetId,
}

impl DrawMesh {
    pub fn from_asset(asset: &MeshAsset) -> Self {
        Self {
            first_index: 0,
            first_vertex: 0,
            index_count: asset.index_count,
            vertex_count: asset.vertex_count,
            is_merged: false,
            bounds: asset.bounds,
            original: asset.id,
        }
    }

    /// Index offset to put in an indirect command.
    pub fn draw_first_index(&self) -> u32 {
        if self.is_merged {
            self.first_index
        } else {
            0
        }
    }

    /// Vertex offset to put in an indirect command.
    pub fn draw_vertex_offset(&self) -> i32 {
        if self.is_merged {
            i32::try_from(self.first_vertex).expect("merged vertex offset exceeds i32::MAX")
        } else {
            0
        }
    }
}

/// Sizes of the global buffers after [`merge_meshes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergedBufferLayout {
    pub total_vertices: u32,
    pub total_indices: u32,
}

/// Packs every mesh back to back into one vertex range and one index range,
/// in handle order, and flags them all as merged.
pub fn merge_meshes(meshes: &mut HandleRegistry<DrawMesh>) -> MergedBufferLayout {
    let mut layout = MergedBufferLayout::default();

    for mesh in meshes.iter_mut() {
        mesh.first_vertex = layout.total_vertices;
        mesh.first_index = layout.total_indices;
        mesh.is_merged = true;

        layout.total_vertices = match layout
            .total_vertices
            .checked_add(mesh.vertex_count)
            .filter(|total| i32::try_from(*total).is_ok())
        {
            Some(total) => total,
            None => panic!(
                "merged vertex buffer overflows at mesh {:?} ({} + {} vertices)",
                mesh.original, layout.total_vertices, mesh.vertex_count
            ),
        };
        layout.total_indices = match layout.total_indices.checked_add(mesh.index_count) {
            Some(total) => total,
            None => panic!(
                "merged index buffer overflows at mesh {:?} ({} + {} indices)",
                mesh.original, layout.total_indices, mesh.index_count
            ),
        };
    }

    log::info!(
        "Merged {} meshes: {} vertices, {} indices",
        meshes.len(),
        layout.total_vertices,
        layout.total_indices
    );

    layout
}
