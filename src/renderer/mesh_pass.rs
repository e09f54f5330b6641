use std::time::Duration;

use instant::Instant;
use log::{debug, trace};

use super::batch::{
    compact_indirect_batches, compact_multibatches, live_object, IndirectBatch, Multibatch,
    PassObject, RenderBatch,
};
use super::draw_mesh::DrawMesh;
use super::material::Material;
use super::pass::MeshPassType;
use crate::asset::{Handle, HandleRegistry};
use crate::scene::object::RenderObject;

/// Read-only scene tables a pass consults while refreshing.
#[derive(Clone, Copy)]
pub(crate) struct PassInputs<'a> {
    pub objects: &'a [Option<RenderObject>],
    pub meshes: &'a HandleRegistry<DrawMesh>,
    pub materials: &'a HandleRegistry<Material>,
}

impl<'a> PassInputs<'a> {
    fn object(&self, handle: Handle<RenderObject>) -> &'a RenderObject {
        match self.objects.get(handle.index()) {
            Some(Some(object)) => object,
            _ => panic!("{:?} does not refer to a live render object", handle),
        }
    }
}

/// Counters from the last refresh of a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchStats {
    pub objects: usize,
    pub flat_batches: usize,
    pub draw_batches: usize,
    pub multibatches: usize,
    pub refresh_time: Duration,
}

/// Batching state for one rendering purpose.
///
/// `flat_batches` stays sorted by `(sort_key, handle)` between refreshes so
/// that deletions and insertions can be applied with linear merges.
pub struct MeshPass {
    kind: MeshPassType,

    objects: Vec<Option<PassObject>>,
    reusable_objects: Vec<Handle<PassObject>>,
    pub(crate) unbatched_objects: Vec<Handle<RenderObject>>,
    pub(crate) objects_to_delete: Vec<Handle<PassObject>>,

    flat_batches: Vec<RenderBatch>,
    batches: Vec<IndirectBatch>,
    multibatches: Vec<Multibatch>,

    pub needs_indirect_refresh: bool,
    pub needs_instance_refresh: bool,

    force_rebuild: bool,
    inserted: Vec<(Handle<RenderObject>, Handle<PassObject>)>,
    merge_scratch: Vec<RenderBatch>,
    stats: BatchStats,
}

impl MeshPass {
    pub fn new(kind: MeshPassType) -> Self {
        Self {
            kind,
            objects: Vec::new(),
            reusable_objects: Vec::new(),
            unbatched_objects: Vec::new(),
            objects_to_delete: Vec::new(),
            flat_batches: Vec::new(),
            batches: Vec::new(),
            multibatches: Vec::new(),
            needs_indirect_refresh: true,
            needs_instance_refresh: true,
            force_rebuild: false,
            inserted: Vec::new(),
            merge_scratch: Vec::new(),
            stats: BatchStats::default(),
        }
    }

    pub fn kind(&self) -> MeshPassType {
        self.kind
    }

    pub fn objects(&self) -> &[Option<PassObject>] {
        &self.objects
    }

    pub fn reusable_objects(&self) -> &[Handle<PassObject>] {
        &self.reusable_objects
    }

    pub fn unbatched_objects(&self) -> &[Handle<RenderObject>] {
        &self.unbatched_objects
    }

    pub fn objects_to_delete(&self) -> &[Handle<PassObject>] {
        &self.objects_to_delete
    }

    pub fn flat_batches(&self) -> &[RenderBatch] {
        &self.flat_batches
    }

    pub fn batches(&self) -> &[IndirectBatch] {
        &self.batches
    }

    pub fn multibatches(&self) -> &[Multibatch] {
        &self.multibatches
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// # Panics
    /// If `handle` is out of range or its slot has been freed.
    pub fn pass_object(&self, handle: Handle<PassObject>) -> &PassObject {
        live_object(&self.objects, handle)
    }

    pub fn live_object_count(&self) -> usize {
        self.objects.len() - self.reusable_objects.len()
    }

    /// Total number of instances covered by `batches`.
    pub fn instance_count(&self) -> usize {
        self.flat_batches.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.force_rebuild || !self.unbatched_objects.is_empty() || !self.objects_to_delete.is_empty()
    }

    /// Recompute batches on the next refresh even if no objects changed.
    pub fn mark_for_rebuild(&mut self) {
        self.force_rebuild = true;
    }

    /// Called by the upload stage once the device buffers are current.
    pub fn clear_refresh_flags(&mut self) {
        self.needs_indirect_refresh = false;
        self.needs_instance_refresh = false;
    }

    pub(crate) fn forget_unbatched(&mut self, object: Handle<RenderObject>) {
        self.unbatched_objects.retain(|pending| *pending != object);
    }

    /// Slots assigned during the last refresh, for the scene to record on its
    /// render objects.
    pub(crate) fn drain_inserted(
        &mut self,
    ) -> std::vec::Drain<'_, (Handle<RenderObject>, Handle<PassObject>)> {
        self.inserted.drain(..)
    }

    pub(crate) fn refresh(&mut self, inputs: PassInputs<'_>) {
        let start = Instant::now();
        self.inserted.clear();

        if !self.objects_to_delete.is_empty() {
            self.apply_deletions();
        }

        let mut fresh = self.insert_unbatched(inputs);
        fresh.sort_unstable();
        self.merge_batches(&fresh);

        if self.flat_batches.is_empty() {
            self.batches.clear();
            self.multibatches.clear();
        } else {
            compact_indirect_batches(&self.flat_batches, &self.objects, &mut self.batches);
            compact_multibatches(
                &self.batches,
                &|mesh: Handle<DrawMesh>| inputs.meshes[mesh].is_merged,
                &mut self.multibatches,
            );
        }

        self.needs_indirect_refresh = true;
        self.needs_instance_refresh = true;
        self.force_rebuild = false;

        self.stats = BatchStats {
            objects: self.live_object_count(),
            flat_batches: self.flat_batches.len(),
            draw_batches: self.batches.len(),
            multibatches: self.multibatches.len(),
            refresh_time: start.elapsed(),
        };
    }

    fn apply_deletions(&mut self) {
        let mut deletions = Vec::with_capacity(self.objects_to_delete.len());

        for handle in self.objects_to_delete.drain(..) {
            let sort_key = live_object(&self.objects, handle).sort_key();
            deletions.push(RenderBatch {
                object: handle,
                sort_key,
            });
            self.objects[handle.index()] = None;
            self.reusable_objects.push(handle);
        }

        deletions.sort_unstable();
        remove_sorted(&mut self.flat_batches, &deletions);

        trace!("{:?} pass: removed {} batches", self.kind, deletions.len());
    }

    fn insert_unbatched(&mut self, inputs: PassInputs<'_>) -> Vec<RenderBatch> {
        let mut pending = std::mem::take(&mut self.unbatched_objects);
        let mut fresh = Vec::with_capacity(pending.len());

        for object_handle in pending.drain(..) {
            let object = inputs.object(object_handle);

            let Some(material) = inputs.materials[object.material].snapshot(self.kind) else {
                debug!(
                    "{:?} pass: skipping {:?}, material {:?} has no pipeline for this pass",
                    self.kind, object_handle, object.material
                );
                continue;
            };

            let pass_object = PassObject {
                material,
                mesh: object.mesh,
                original: object_handle,
                custom_key: object.custom_sort_key,
            };
            let slot = self.allocate(pass_object);

            self.inserted.push((object_handle, slot));
            fresh.push(RenderBatch {
                object: slot,
                sort_key: pass_object.sort_key(),
            });
        }

        // Hand the emptied buffer back so its capacity is reused.
        self.unbatched_objects = pending;
        fresh
    }

    fn allocate(&mut self, object: PassObject) -> Handle<PassObject> {
        match self.reusable_objects.pop() {
            Some(handle) => {
                self.objects[handle.index()] = Some(object);
                handle
            }
            None => {
                let handle = Handle::from_usize(self.objects.len());
                self.objects.push(Some(object));
                handle
            }
        }
    }

    fn merge_batches(&mut self, fresh: &[RenderBatch]) {
        if fresh.is_empty() {
            return;
        }
        if self.flat_batches.is_empty() {
            self.flat_batches.extend_from_slice(fresh);
            return;
        }

        self.merge_scratch.clear();
        merge_sorted(&self.flat_batches, fresh, &mut self.merge_scratch);
        std::mem::swap(&mut self.flat_batches, &mut self.merge_scratch);
    }
}

/// Linear merge of two sorted lists. On ties the entry from `existing` wins.
fn merge_sorted(existing: &[RenderBatch], fresh: &[RenderBatch], out: &mut Vec<RenderBatch>) {
    out.reserve(existing.len() + fresh.len());

    let (mut i, mut j) = (0, 0);
    while i < existing.len() && j < fresh.len() {
        if fresh[j] < existing[i] {
            out.push(fresh[j]);
            j += 1;
        } else {
            out.push(existing[i]);
            i += 1;
        }
    }
    out.extend_from_slice(&existing[i..]);
    out.extend_from_slice(&fresh[j..]);
}

/// Ordered set difference: drops every entry of `removed` from `flat`. Both
/// lists must be sorted.
fn remove_sorted(flat: &mut Vec<RenderBatch>, removed: &[RenderBatch]) {
    let mut pending = removed.iter().peekable();

    flat.retain(|batch| {
        while pending.next_if(|next| *next < batch).is_some() {}
        pending.next_if_eq(&batch).is_none()
    });
}
