//! Buffer flattening, upload planning and prefab registration.

use bytemuck::Zeroable;
use glam::{Mat4, Quat, Vec3};
use scene_batcher::asset::{AssetId, MeshAsset, MeshBounds};
use scene_batcher::renderer::{
    fill_dirty_object_data, fill_indirect_array, fill_instances_array, fill_object_data,
    BindingSetRef, GpuObjectData, Material, MeshPassType, PipelineRef, ShaderPass,
};
use scene_batcher::scene::{MeshNode, MeshObject, ObjectUpload, RenderScene, SceneNode, Transform};
use scene_batcher::settings::BatchingSettings;

fn scene_with(ratio: f32) -> RenderScene {
    let settings = BatchingSettings {
        worker_threads: 1,
        partial_upload_ratio: ratio,
        ..BatchingSettings::default()
    };
    let mut scene = RenderScene::new(settings).unwrap();
    let unit = MeshBounds::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0));
    scene.register_mesh(&MeshAsset::new(AssetId(1), 24, 36).with_bounds(unit));
    scene.register_mesh(&MeshAsset::new(AssetId(2), 3, 3).with_bounds(unit));
    for (id, pipeline) in [(10, 1), (11, 2)] {
        scene.register_material(Material::new(AssetId(id)).with_pass(
            MeshPassType::Forward,
            ShaderPass::new(PipelineRef(pipeline), BindingSetRef(0)),
        ));
    }
    scene
}

fn placed(mesh: u64, material: u64, x: f32) -> MeshObject {
    MeshObject::new(AssetId(mesh), AssetId(material))
        .with_transform(Mat4::from_translation(Vec3::new(x, 0.0, 0.0)))
}

#[test]
fn object_data_follows_handle_order() {
    let mut scene = scene_with(0.8);
    let handles = scene.register_object_batch(&[
        placed(1, 10, 1.0),
        placed(1, 10, 2.0),
        placed(2, 11, 3.0),
    ]);
    scene.build_batches();

    let mut data = Vec::new();
    fill_object_data(&mut data, &scene);

    assert_eq!(data.len(), 3);
    for (record, handle) in data.iter().zip(&handles) {
        let expected = scene.object(*handle).transform.to_cols_array_2d();
        assert_eq!(record.model, expected);
    }
    assert_eq!(data[2].model[3][0], 3.0);
}

#[test]
fn removed_objects_upload_zeroed_records() {
    let mut scene = scene_with(0.8);
    let handles = scene.register_object_batch(&[placed(1, 10, 1.0), placed(1, 10, 2.0)]);
    scene.build_batches();
    scene.clear_dirty_objects();

    scene.remove_object(handles[0]);

    let mut data = Vec::new();
    fill_object_data(&mut data, &scene);
    assert_eq!(data.len(), 2);
    assert_eq!(data[0], GpuObjectData::zeroed());
    assert_eq!(data[1], GpuObjectData::from_object(scene.object(handles[1])));

    let (mut dirty, mut targets) = (Vec::new(), Vec::new());
    fill_dirty_object_data(&mut dirty, &mut targets, &scene);
    assert_eq!(targets, vec![handles[0].raw()]);
    assert_eq!(dirty[0].model, [[0.0; 4]; 4]);
}

#[test]
fn upload_plan_switches_on_ratio() {
    let mut scene = scene_with(0.5);
    let handles: Vec<_> = (0..10)
        .map(|i| scene.register_object(&placed(1, 10, i as f32)))
        .collect();

    assert_eq!(scene.object_upload(), ObjectUpload::Full);
    scene.build_batches();
    scene.clear_dirty_objects();
    assert_eq!(scene.object_upload(), ObjectUpload::Nothing);

    scene.update_transform(handles[4], Mat4::from_translation(Vec3::Y));
    assert_eq!(scene.object_upload(), ObjectUpload::Partial);

    let (mut dirty, mut targets) = (Vec::new(), Vec::new());
    fill_dirty_object_data(&mut dirty, &mut targets, &scene);
    assert_eq!(targets, vec![4]);
    assert_eq!(dirty[0].model[3][1], 1.0);

    for handle in &handles[..5] {
        scene.update_object(*handle);
    }
    assert_eq!(scene.object_upload(), ObjectUpload::Full);
}

#[test]
fn moved_bounds_are_refitted() {
    let mut scene = scene_with(0.8);
    let unit = MeshBounds::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0));
    let world = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
    let bounds = scene_batcher::scene::RenderBounds::from_mesh(&unit, world);
    let h = scene.register_object(&placed(1, 10, 5.0).with_bounds(bounds));

    scene.update_transform(h, Mat4::from_translation(Vec3::new(0.0, 0.0, -8.0)));

    let object = scene.object(h);
    assert!(object.bounds.valid);
    assert!(object.bounds.origin.abs_diff_eq(Vec3::new(0.0, 0.0, -8.0), 1e-5));
}

#[test]
fn indirect_commands_point_at_batch_ranges() {
    let mut scene = scene_with(0.8);
    scene.register_object_batch(&[
        placed(1, 10, 0.0),
        placed(2, 11, 0.0),
        placed(1, 10, 1.0),
        placed(1, 10, 2.0),
    ]);
    scene.build_batches();

    let pass = scene.pass(MeshPassType::Forward);
    let mut commands = Vec::new();
    fill_indirect_array(&mut commands, pass, &scene);

    assert_eq!(commands.len(), pass.batches().len());
    for (i, (command, batch)) in commands.iter().zip(pass.batches()).enumerate() {
        let mesh = scene.mesh(batch.mesh);
        assert_eq!(command.batch_id, i as u32);
        assert_eq!(command.command.first_instance, batch.first);
        assert_eq!(command.command.instance_count, 0);
        assert_eq!(command.command.index_count, mesh.index_count);
        assert_eq!(command.command.first_index, 0);
    }

    scene.merge_meshes();
    scene.build_batches();

    let pass = scene.pass(MeshPassType::Forward);
    fill_indirect_array(&mut commands, pass, &scene);
    let small = pass
        .batches()
        .iter()
        .position(|b| scene.mesh(b.mesh).original == AssetId(2))
        .unwrap();
    assert_eq!(commands[small].command.first_index, 36);
    assert_eq!(commands[small].command.vertex_offset, 24);
}

#[test]
fn instances_cover_every_batched_object() {
    let mut scene = scene_with(0.8);
    let handles = scene.register_object_batch(&[
        placed(1, 10, 0.0),
        placed(2, 11, 0.0),
        placed(1, 10, 1.0),
    ]);
    scene.build_batches();

    let pass = scene.pass(MeshPassType::Forward);
    let mut instances = Vec::new();
    fill_instances_array(&mut instances, pass);

    assert_eq!(instances.len(), 3);
    assert!(instances.windows(2).all(|w| w[0].batch_id <= w[1].batch_id));

    let mut ids: Vec<_> = instances.iter().map(|i| i.object_id).collect();
    ids.sort();
    let mut expected: Vec<_> = handles.iter().map(|h| h.raw()).collect();
    expected.sort();
    assert_eq!(ids, expected);

    for (batch_id, batch) in pass.batches().iter().enumerate() {
        let run = &instances[batch.first as usize..(batch.first + batch.count) as usize];
        assert!(run.iter().all(|i| i.batch_id == batch_id as u32));
    }
}

#[test]
fn prefab_registers_every_mesh_node() {
    let mut scene = scene_with(0.8);
    let unit = MeshBounds::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0));
    let prefab = SceneNode::group(
        Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)),
        vec![
            SceneNode::mesh(Transform::IDENTITY, MeshNode::new(AssetId(1), AssetId(10), unit)),
            SceneNode::group(
                Transform::from_trs(Vec3::X, Quat::IDENTITY, Vec3::splat(2.0)),
                vec![SceneNode::mesh(
                    Transform::from_translation(Vec3::X),
                    MeshNode::new(AssetId(2), AssetId(11), unit),
                )],
            ),
        ],
    );

    let handles = scene.register_scene(&prefab, Mat4::from_translation(Vec3::Z));
    assert_eq!(handles.len(), 2);

    let leaf = scene.object(handles[1]);
    let origin = leaf.transform.transform_point3(Vec3::ZERO);
    assert!(origin.abs_diff_eq(Vec3::new(3.0, 1.0, 1.0), 1e-5));
    assert!(leaf.bounds.valid);

    scene.build_batches();
    assert_eq!(scene.pass(MeshPassType::Forward).instance_count(), 2);
}
