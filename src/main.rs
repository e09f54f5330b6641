use glam::{Mat4, Vec3};
use log::{error, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use scene_batcher::asset::{AssetId, MeshAsset, MeshBounds};
use scene_batcher::renderer::{
    fill_dirty_object_data, fill_indirect_array, fill_instances_array, fill_object_data,
    BindingSetRef, Material, MeshPassType, PipelineRef, ShaderPass, TransparencyMode,
};
use scene_batcher::scene::{MeshObject, ObjectUpload, RenderScene};
use scene_batcher::settings::BatchingSettings;

const MESHES: u64 = 16;
const MATERIALS: u64 = 8;
const OBJECTS: usize = 20_000;
const FRAMES: usize = 4;

fn populate(scene: &mut RenderScene, rng: &mut SmallRng) -> Vec<MeshObject> {
    let unit = MeshBounds::from_min_max(Vec3::splat(-0.5), Vec3::splat(0.5));
    for id in 0..MESHES {
        scene.register_mesh(&MeshAsset::new(AssetId(id), 24, 36).with_bounds(unit));
    }

    for id in 0..MATERIALS {
        let transparency = if id == MATERIALS - 1 {
            TransparencyMode::Transparent
        } else {
            TransparencyMode::Opaque
        };
        let material = Material::new(AssetId(1_000 + id))
            .with_pass(
                MeshPassType::Forward,
                ShaderPass::new(PipelineRef(id % 2), BindingSetRef(id)),
            )
            .with_pass(
                MeshPassType::Transparency,
                ShaderPass::new(PipelineRef(10), BindingSetRef(id)),
            )
            .with_pass(
                MeshPassType::DirectionalShadow,
                ShaderPass::new(PipelineRef(20), BindingSetRef(0)),
            )
            .with_transparency(transparency);
        scene.register_material(material);
    }

    (0..OBJECTS)
        .map(|_| {
            let position = Vec3::new(
                rng.gen_range(-100.0..100.0),
                0.0,
                rng.gen_range(-100.0..100.0),
            );
            MeshObject::new(
                AssetId(rng.gen_range(0..MESHES)),
                AssetId(1_000 + rng.gen_range(0..MATERIALS)),
            )
            .with_transform(Mat4::from_translation(position))
        })
        .collect()
}

fn main() {
    scene_batcher::init_logging();

    let settings = BatchingSettings::load();
    let mut scene = match RenderScene::new(settings) {
        Ok(scene) => scene,
        Err(err) => {
            error!("Failed to create render scene: {}", err);
            return;
        }
    };

    let mut rng = SmallRng::seed_from_u64(7);
    let descs = populate(&mut scene, &mut rng);
    let handles = scene.register_object_batch(&descs);
    let layout = scene.merge_meshes();
    info!(
        "Registered {} objects over {} vertices / {} indices",
        handles.len(),
        layout.total_vertices,
        layout.total_indices
    );

    let mut objects = Vec::new();
    let mut dirty_objects = Vec::new();
    let mut dirty_targets = Vec::new();
    let mut indirect = Vec::new();
    let mut instances = Vec::new();

    for frame in 0..FRAMES {
        for _ in 0..OBJECTS / 20 {
            let handle = handles[rng.gen_range(0..handles.len())];
            let offset = Vec3::new(rng.gen_range(-1.0..1.0), 0.0, rng.gen_range(-1.0..1.0));
            let moved = Mat4::from_translation(offset) * scene.object(handle).transform;
            scene.update_transform(handle, moved);
        }

        scene.build_batches();

        let upload = scene.object_upload();
        match upload {
            ObjectUpload::Nothing => {}
            ObjectUpload::Partial => {
                fill_dirty_object_data(&mut dirty_objects, &mut dirty_targets, &scene);
                info!(
                    "frame {}: scattering {} object records",
                    frame,
                    dirty_targets.len()
                );
            }
            ObjectUpload::Full => {
                fill_object_data(&mut objects, &scene);
                info!("frame {}: uploading all {} object records", frame, objects.len());
            }
        }
        scene.clear_dirty_objects();

        for kind in MeshPassType::ALL {
            let pass = scene.pass(kind);
            fill_indirect_array(&mut indirect, pass, &scene);
            fill_instances_array(&mut instances, pass);
            info!(
                "frame {} {:?}: {} instances, {} draws, {} multi-draws, upload {:?}",
                frame,
                kind,
                instances.len(),
                indirect.len(),
                pass.multibatches().len(),
                upload
            );
            scene.pass_mut(kind).clear_refresh_flags();
        }
    }
}
