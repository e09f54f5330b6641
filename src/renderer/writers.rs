//! Flattening of scene and pass state into the records the upload stage copies
//! to the device. Nothing here mutates the scene; callers own the scratch
//! vectors and reuse them across frames.

use bytemuck::Zeroable;

use super::mesh_pass::MeshPass;
use super::objects::{GpuDrawIndexedIndirect, GpuIndirectObject, GpuInstance, GpuObjectData};
use crate::scene::RenderScene;

/// One record per render object slot, in handle order. Freed slots are
/// written as zeroed records so handles keep lining up with indices.
pub fn fill_object_data(dest: &mut Vec<GpuObjectData>, scene: &RenderScene) {
    dest.clear();
    dest.reserve(scene.object_slots());
    dest.extend(scene.object_table().iter().map(|slot| match slot {
        Some(object) => GpuObjectData::from_object(object),
        None => GpuObjectData::zeroed(),
    }));
}

/// Records for the dirty objects only, paired with the slot each one must be
/// scattered to.
pub fn fill_dirty_object_data(
    data: &mut Vec<GpuObjectData>,
    targets: &mut Vec<u32>,
    scene: &RenderScene,
) {
    data.clear();
    targets.clear();

    let dirty = scene.dirty_objects();
    data.reserve(dirty.len());
    targets.reserve(dirty.len());

    for &handle in dirty {
        let record = match scene.try_object(handle) {
            Some(object) => GpuObjectData::from_object(object),
            None => GpuObjectData::zeroed(),
        };
        data.push(record);
        targets.push(handle.raw());
    }
}

/// One indirect command per draw batch, in batch order. `instance_count`
/// starts at zero; GPU culling fills it in.
pub fn fill_indirect_array(dest: &mut Vec<GpuIndirectObject>, pass: &MeshPass, scene: &RenderScene) {
    dest.clear();
    dest.reserve(pass.batches().len());

    for (batch_id, batch) in pass.batches().iter().enumerate() {
        let mesh = scene.mesh(batch.mesh);
        dest.push(GpuIndirectObject {
            command: GpuDrawIndexedIndirect {
                index_count: mesh.index_count,
                instance_count: 0,
                first_index: mesh.draw_first_index(),
                vertex_offset: mesh.draw_vertex_offset(),
                first_instance: batch.first,
            },
            object_id: 0,
            batch_id: batch_id as u32,
        });
    }
}

/// Every instance covered by every batch, tagged with the render object it
/// draws and the batch it belongs to.
pub fn fill_instances_array(dest: &mut Vec<GpuInstance>, pass: &MeshPass) {
    dest.clear();
    dest.reserve(pass.instance_count());

    let flat = pass.flat_batches();
    for (batch_id, batch) in pass.batches().iter().enumerate() {
        let run = batch.first as usize..(batch.first + batch.count) as usize;
        for entry in &flat[run] {
            dest.push(GpuInstance {
                object_id: pass.pass_object(entry.object).original.raw(),
                batch_id: batch_id as u32,
            });
        }
    }
}
