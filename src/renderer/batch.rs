// renderer/batch.rs
use std::cmp::Ordering;

use super::draw_mesh::DrawMesh;
use super::material::{mix64, PassMaterial};
use crate::asset::Handle;
use crate::scene::object::RenderObject;

/// Pass-local snapshot of a render object, taken when it was inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassObject {
    pub material: PassMaterial,
    pub mesh: Handle<DrawMesh>,
    pub original: Handle<RenderObject>,
    pub custom_key: u32,
}

impl PassObject {
    /// Low 32 bits group by pipeline, binding set and mesh; high 32 bits carry
    /// the caller's explicit priority.
    pub fn sort_key(&self) -> u64 {
        let material_hash = self.material.hash_key();
        let mesh_hash = mix64(u64::from(self.mesh.raw()) ^ MESH_SEED);
        let meshmat = mix64(material_hash ^ mesh_hash) as u32;
        u64::from(meshmat) | (u64::from(self.custom_key) << 32)
    }

    fn same_draw(&self, mesh: Handle<DrawMesh>, material: &PassMaterial) -> bool {
        self.mesh == mesh && self.material == *material
    }
}

const MESH_SEED: u64 = 0x6a09_e667_f3bc_c909;

/// One sortable entry of a pass's flat draw list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBatch {
    pub object: Handle<PassObject>,
    pub sort_key: u64,
}

impl Ord for RenderBatch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key
            .cmp(&other.sort_key)
            .then(self.object.cmp(&other.object))
    }
}

impl PartialOrd for RenderBatch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A run of flat batches drawn with one indirect command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndirectBatch {
    pub mesh: Handle<DrawMesh>,
    pub material: PassMaterial,
    pub first: u32,
    pub count: u32,
}

/// A run of indirect batches that can go out in one multi-draw-indirect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multibatch {
    pub first: u32,
    pub count: u32,
}

/// Collapses a sorted flat list into runs sharing mesh and material.
pub(crate) fn compact_indirect_batches(
    flat: &[RenderBatch],
    objects: &[Option<PassObject>],
    out: &mut Vec<IndirectBatch>,
) {
    out.clear();

    for (i, batch) in flat.iter().enumerate() {
        let object = live_object(objects, batch.object);

        match out.last_mut() {
            Some(back) if object.same_draw(back.mesh, &back.material) => back.count += 1,
            _ => out.push(IndirectBatch {
                mesh: object.mesh,
                material: object.material,
                first: i as u32,
                count: 1,
            }),
        }
    }
}

/// Groups consecutive indirect batches sharing pipeline and binding set, as
/// long as every mesh in the group lives in the merged buffers.
pub(crate) fn compact_multibatches(
    batches: &[IndirectBatch],
    is_merged: &impl Fn(Handle<DrawMesh>) -> bool,
    out: &mut Vec<Multibatch>,
) {
    out.clear();

    let Some(head) = batches.first() else {
        return;
    };

    let mut current = Multibatch { first: 0, count: 1 };
    let mut joinable = is_merged(head.mesh);

    for (i, batch) in batches.iter().enumerate().skip(1) {
        let run_head = &batches[current.first as usize];
        let merged = is_merged(batch.mesh);

        if joinable && merged && run_head.material == batch.material {
            current.count += 1;
        } else {
            out.push(current);
            current = Multibatch {
                first: i as u32,
                count: 1,
            };
            joinable = merged;
        }
    }

    out.push(current);
}

pub(crate) fn live_object(objects: &[Option<PassObject>], handle: Handle<PassObject>) -> &PassObject {
    match objects.get(handle.index()) {
        Some(Some(object)) => object,
        Some(None) => panic!("{:?} refers to a freed pass object slot", handle),
        None => panic!(
            "{:?} is out of range for a pass pool of {} slots",
            handle,
            objects.len()
        ),
    }
}
