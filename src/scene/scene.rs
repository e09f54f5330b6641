// scene/scene.rs
use glam::Mat4;
use instant::Instant;
use log::{debug, info};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use super::bounds::RenderBounds;
use super::node::SceneNode;
use super::object::{MeshObject, RenderObject};
use crate::asset::{Handle, HandleRegistry, MeshAsset};
use crate::renderer::draw_mesh::{self, DrawMesh, MergedBufferLayout};
use crate::renderer::mesh_pass::{MeshPass, PassInputs};
use crate::renderer::{Material, MeshPassType, PassTypeFlags, PerPassData};
use crate::settings::BatchingSettings;

/// How much of the object-data buffer has to be re-uploaded this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectUpload {
    Nothing,
    /// Scatter the dirty records only (see `fill_dirty_object_data`).
    Partial,
    Full,
}

/// Owns every render object and the batching state of every mesh pass.
///
/// All mutation goes through `&mut self`, so nothing can register or move
/// objects while [`RenderScene::build_batches`] has passes in flight.
pub struct RenderScene {
    renderables: Vec<Option<RenderObject>>,
    free_objects: Vec<Handle<RenderObject>>,
    retired_objects: Vec<Handle<RenderObject>>,
    dirty_objects: Vec<Handle<RenderObject>>,

    meshes: HandleRegistry<DrawMesh>,
    materials: HandleRegistry<Material>,

    passes: PerPassData<MeshPass>,

    settings: BatchingSettings,
    pool: ThreadPool,
}

impl RenderScene {
    pub fn new(settings: BatchingSettings) -> Result<Self, ThreadPoolBuildError> {
        let workers = settings.resolved_worker_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("mesh-pass-{}", i))
            .build()?;

        info!("Render scene using {} pass refresh workers", workers);

        Ok(Self {
            renderables: Vec::with_capacity(settings.initial_object_capacity),
            free_objects: Vec::new(),
            retired_objects: Vec::new(),
            dirty_objects: Vec::with_capacity(settings.initial_object_capacity),
            meshes: HandleRegistry::new(),
            materials: HandleRegistry::new(),
            passes: PerPassData::from_fn(MeshPass::new),
            settings,
            pool,
        })
    }

    pub fn with_default_settings() -> Result<Self, ThreadPoolBuildError> {
        Self::new(BatchingSettings::default())
    }

    // ------------------------------------------------------------------
    // Asset tables
    // ------------------------------------------------------------------

    pub fn register_mesh(&mut self, asset: &MeshAsset) -> Handle<DrawMesh> {
        self.meshes
            .get_or_create_handle(asset.id, || DrawMesh::from_asset(asset))
    }

    /// Registers a resolved material. A material whose id is already known
    /// keeps its existing handle and data.
    pub fn register_material(&mut self, material: Material) -> Handle<Material> {
        self.materials.get_or_create_handle(material.id, || material)
    }

    /// Packs all registered meshes into the global buffers. Every pass is
    /// rebuilt on the next [`build_batches`](Self::build_batches) since draw
    /// offsets and multi-draw eligibility change.
    pub fn merge_meshes(&mut self) -> MergedBufferLayout {
        let layout = draw_mesh::merge_meshes(&mut self.meshes);
        for pass in self.passes.values_mut() {
            pass.mark_for_rebuild();
        }
        layout
    }

    // ------------------------------------------------------------------
    // Object registration
    // ------------------------------------------------------------------

    /// # Panics
    /// If the descriptor names a mesh or material that was never registered.
    pub fn register_object(&mut self, desc: &MeshObject) -> Handle<RenderObject> {
        let mesh = match self.meshes.handle_of(desc.mesh) {
            Some(handle) => handle,
            None => panic!("mesh {:?} must be registered before objects use it", desc.mesh),
        };
        let material = match self.materials.handle_of(desc.material) {
            Some(handle) => handle,
            None => panic!(
                "material {:?} must be registered before objects use it",
                desc.material
            ),
        };

        let mut object = RenderObject::new(mesh, material, desc.transform);
        object.bounds = desc.bounds;
        object.custom_sort_key = desc.custom_sort_key;
        object.passes = desc.passes;

        let transparent = self.materials[material].is_transparent();
        let handle = self.allocate_object(object);

        for (kind, pass) in self.passes.iter_mut() {
            if participates(desc.passes, transparent, kind) {
                pass.unbatched_objects.push(handle);
            }
        }

        self.update_object(handle);
        handle
    }

    pub fn register_object_batch(&mut self, descs: &[MeshObject]) -> Vec<Handle<RenderObject>> {
        let growth = descs.len().saturating_sub(self.free_objects.len());
        self.renderables.reserve(growth);
        self.dirty_objects.reserve(descs.len());
        for pass in self.passes.values_mut() {
            pass.unbatched_objects.reserve(descs.len());
        }

        descs.iter().map(|desc| self.register_object(desc)).collect()
    }

    /// Registers every mesh node of a prefab hierarchy placed at `root`.
    pub fn register_scene(&mut self, node: &SceneNode, root: Mat4) -> Vec<Handle<RenderObject>> {
        let mut descs = Vec::with_capacity(node.mesh_count());
        node.collect_objects(root, &mut descs);
        self.register_object_batch(&descs)
    }

    fn allocate_object(&mut self, object: RenderObject) -> Handle<RenderObject> {
        match self.free_objects.pop() {
            Some(handle) => {
                self.renderables[handle.index()] = Some(object);
                handle
            }
            None => {
                let handle = Handle::from_usize(self.renderables.len());
                self.renderables.push(Some(object));
                handle
            }
        }
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Moves an object. Bounds that were valid are refitted from the mesh's
    /// local bounds.
    pub fn update_transform(&mut self, handle: Handle<RenderObject>, transform: Mat4) {
        let object = live_mut(&mut self.renderables, handle);
        object.transform = transform;
        if object.bounds.valid {
            object.bounds = RenderBounds::from_mesh(&self.meshes[object.mesh].bounds, transform);
        }

        self.update_object(handle);
    }

    /// Pulls the object out of every pass it is batched in and queues it for
    /// reinsertion, then marks it dirty. Calling it again before the next
    /// refresh changes nothing.
    pub fn update_object(&mut self, handle: Handle<RenderObject>) {
        let object = live_mut(&mut self.renderables, handle);

        for (kind, slot) in object.pass_indices.iter_mut() {
            if let Some(pass_object) = slot.take() {
                let pass = &mut self.passes[kind];
                pass.objects_to_delete.push(pass_object);
                pass.unbatched_objects.push(handle);
            }
        }

        if object.update_index.is_none() {
            object.update_index = Some(self.dirty_objects.len() as u32);
            self.dirty_objects.push(handle);
        }
    }

    /// Takes the object out of every pass and frees its slot. The slot is
    /// handed out again only after [`clear_dirty_objects`](Self::clear_dirty_objects),
    /// once the zeroed record has been uploaded.
    pub fn remove_object(&mut self, handle: Handle<RenderObject>) {
        let object = match self.renderables.get_mut(handle.index()).and_then(Option::take) {
            Some(object) => object,
            None => panic!("{:?} does not refer to a live render object", handle),
        };

        for (kind, slot) in object.pass_indices.iter() {
            if let Some(pass_object) = slot {
                self.passes[kind].objects_to_delete.push(*pass_object);
            }
        }
        // Only objects without a slot can still be waiting for insertion.
        let transparent = self.materials[object.material].is_transparent();
        for (kind, pass) in self.passes.iter_mut() {
            if object.pass_indices[kind].is_none() && participates(object.passes, transparent, kind) {
                pass.forget_unbatched(handle);
            }
        }

        if object.update_index.is_none() {
            self.dirty_objects.push(handle);
        }
        self.retired_objects.push(handle);
    }

    // ------------------------------------------------------------------
    // Per-frame
    // ------------------------------------------------------------------

    /// Refreshes every dirty pass on the worker pool and waits for all of them.
    pub fn build_batches(&mut self) {
        let start = Instant::now();

        let inputs = PassInputs {
            objects: &self.renderables,
            meshes: &self.meshes,
            materials: &self.materials,
        };
        let passes = &mut self.passes;

        self.pool.scope(move |scope| {
            for pass in passes.values_mut() {
                if pass.is_dirty() {
                    scope.spawn(move |_| pass.refresh(inputs));
                }
            }
        });

        for (kind, pass) in self.passes.iter_mut() {
            for (object, slot) in pass.drain_inserted() {
                live_mut(&mut self.renderables, object).pass_indices[kind] = Some(slot);
            }
        }

        for (kind, pass) in self.passes.iter() {
            let stats = pass.stats();
            debug!(
                "{:?} pass: {} objects, {} draws, {} multi-draws ({:?})",
                kind, stats.objects, stats.draw_batches, stats.multibatches, stats.refresh_time
            );
        }
        debug!("build_batches took {:?}", start.elapsed());
    }

    pub fn object_upload(&self) -> ObjectUpload {
        if self.dirty_objects.is_empty() {
            return ObjectUpload::Nothing;
        }

        let threshold = self.renderables.len() as f32 * self.settings.partial_upload_ratio;
        if self.dirty_objects.len() as f32 >= threshold {
            ObjectUpload::Full
        } else {
            ObjectUpload::Partial
        }
    }

    pub fn clear_dirty_objects(&mut self) {
        for (position, handle) in self.dirty_objects.drain(..).enumerate() {
            if let Some(Some(object)) = self.renderables.get_mut(handle.index()) {
                debug_assert_eq!(
                    object.update_index,
                    Some(position as u32),
                    "{:?} is listed at the wrong dirty position",
                    handle
                );
                object.update_index = None;
            }
        }
        self.free_objects.append(&mut self.retired_objects);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// # Panics
    /// If `handle` is stale or out of range.
    pub fn object(&self, handle: Handle<RenderObject>) -> &RenderObject {
        match self.try_object(handle) {
            Some(object) => object,
            None => panic!("{:?} does not refer to a live render object", handle),
        }
    }

    pub fn try_object(&self, handle: Handle<RenderObject>) -> Option<&RenderObject> {
        self.renderables.get(handle.index()).and_then(Option::as_ref)
    }

    /// Object slots in handle order, `None` for freed slots.
    pub fn object_table(&self) -> &[Option<RenderObject>] {
        &self.renderables
    }

    pub fn object_slots(&self) -> usize {
        self.renderables.len()
    }

    pub fn object_count(&self) -> usize {
        self.renderables.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn dirty_objects(&self) -> &[Handle<RenderObject>] {
        &self.dirty_objects
    }

    pub fn mesh(&self, handle: Handle<DrawMesh>) -> &DrawMesh {
        &self.meshes[handle]
    }

    pub fn material(&self, handle: Handle<Material>) -> &Material {
        &self.materials[handle]
    }

    pub fn meshes(&self) -> &HandleRegistry<DrawMesh> {
        &self.meshes
    }

    pub fn materials(&self) -> &HandleRegistry<Material> {
        &self.materials
    }

    pub fn pass(&self, kind: MeshPassType) -> &MeshPass {
        &self.passes[kind]
    }

    pub fn pass_mut(&mut self, kind: MeshPassType) -> &mut MeshPass {
        &mut self.passes[kind]
    }

    pub fn settings(&self) -> &BatchingSettings {
        &self.settings
    }
}

/// Transparent materials only draw in the transparency pass and never cast
/// shadows.
fn participates(flags: PassTypeFlags, transparent: bool, kind: MeshPassType) -> bool {
    match kind {
        MeshPassType::Forward => flags.contains(PassTypeFlags::FORWARD) && !transparent,
        MeshPassType::Transparency => flags.contains(PassTypeFlags::FORWARD) && transparent,
        MeshPassType::DirectionalShadow => flags.contains(PassTypeFlags::SHADOW) && !transparent,
    }
}

fn live_mut(
    renderables: &mut [Option<RenderObject>],
    handle: Handle<RenderObject>,
) -> &mut RenderObject {
    match renderables.get_mut(handle.index()) {
        Some(Some(object)) => object,
        _ => panic!("{:?} does not refer to a live render object", handle),
    }
}
