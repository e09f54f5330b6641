// renderer/objects.rs (GPU records)
use bytemuck::{Pod, Zeroable};

use crate::scene::object::RenderObject;

/// Per-object record, indexed by render object handle on the GPU.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct GpuObjectData {
    pub model: [[f32; 4]; 4],     // 64 bytes
    pub origin_radius: [f32; 4],  // 16 bytes, w = bounding sphere radius
    pub extents: [f32; 4],        // 16 bytes, w = 1.0 when bounds are valid
}

impl GpuObjectData {
    pub fn from_object(object: &RenderObject) -> Self {
        let bounds = &object.bounds;
        Self {
            model: object.transform.to_cols_array_2d(),
            origin_radius: bounds.origin.extend(bounds.radius).to_array(),
            extents: bounds
                .extents
                .extend(if bounds.valid { 1.0 } else { 0.0 })
                .to_array(),
        }
    }
}

/// Layout of an indexed indirect draw as the GPU reads it.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct GpuDrawIndexedIndirect {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}

/// Indirect command plus the ids the culling shader needs to fill it in.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct GpuIndirectObject {
    pub command: GpuDrawIndexedIndirect,
    pub object_id: u32,
    pub batch_id: u32,
}

/// Maps one instance slot to the object it draws and the batch it belongs to.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct GpuInstance {
    pub object_id: u32,
    pub batch_id: u32,
}
