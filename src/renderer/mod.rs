pub mod batch;
pub mod draw_mesh;
pub mod material;
pub mod mesh_pass;
pub mod objects;
pub mod pass;
pub mod writers;

pub use batch::{IndirectBatch, Multibatch, PassObject, RenderBatch};
pub use draw_mesh::{DrawMesh, MergedBufferLayout};
pub use material::{BindingSetRef, Material, PassMaterial, PipelineRef, ShaderPass, TransparencyMode};
pub use mesh_pass::{BatchStats, MeshPass};
pub use objects::{GpuDrawIndexedIndirect, GpuIndirectObject, GpuInstance, GpuObjectData};
pub use pass::{MeshPassType, PassTypeFlags, PerPassData};
pub use writers::{fill_dirty_object_data, fill_indirect_array, fill_instances_array, fill_object_data};
