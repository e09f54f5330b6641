// scene/node.rs
use glam::Mat4;

use super::bounds::RenderBounds;
use super::object::MeshObject;
use super::transform::Transform;
use crate::asset::{AssetId, MeshBounds};
use crate::renderer::PassTypeFlags;

/// Mesh instance carried by a [`SceneNode::Mesh`].
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub mesh: AssetId,
    pub material: AssetId,
    pub bounds: MeshBounds,
    pub custom_sort_key: u32,
    pub passes: PassTypeFlags,
}

impl MeshNode {
    pub fn new(mesh: AssetId, material: AssetId, bounds: MeshBounds) -> Self {
        Self {
            mesh,
            material,
            bounds,
            custom_sort_key: 0,
            passes: PassTypeFlags::default(),
        }
    }
}

/// Prefab hierarchy handed over by the asset layer. The node kinds are a closed
/// set, so traversal is a plain match.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    Group {
        transform: Transform,
        children: Vec<SceneNode>,
    },
    Mesh {
        transform: Transform,
        mesh: MeshNode,
        children: Vec<SceneNode>,
    },
}

impl SceneNode {
    pub fn group(transform: Transform, children: Vec<SceneNode>) -> Self {
        SceneNode::Group {
            transform,
            children,
        }
    }

    pub fn mesh(transform: Transform, mesh: MeshNode) -> Self {
        SceneNode::Mesh {
            transform,
            mesh,
            children: Vec::new(),
        }
    }

    pub fn transform(&self) -> &Transform {
        match self {
            SceneNode::Group { transform, .. } | SceneNode::Mesh { transform, .. } => transform,
        }
    }

    pub fn children(&self) -> &[SceneNode] {
        match self {
            SceneNode::Group { children, .. } | SceneNode::Mesh { children, .. } => children,
        }
    }

    /// Walks the tree depth first, composing transforms, and appends one
    /// registration descriptor per mesh node.
    pub fn collect_objects(&self, parent: Mat4, out: &mut Vec<MeshObject>) {
        let world = parent * self.transform().matrix();

        if let SceneNode::Mesh { mesh, .. } = self {
            out.push(
                MeshObject::new(mesh.mesh, mesh.material)
                    .with_transform(world)
                    .with_bounds(RenderBounds::from_mesh(&mesh.bounds, world))
                    .with_sort_key(mesh.custom_sort_key)
                    .with_passes(mesh.passes),
            );
        }

        for child in self.children() {
            child.collect_objects(world, out);
        }
    }

    pub fn mesh_count(&self) -> usize {
        let own = usize::from(matches!(self, SceneNode::Mesh { .. }));
        own + self.children().iter().map(SceneNode::mesh_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn unit_mesh(id: u64) -> MeshNode {
        MeshNode::new(
            AssetId(id),
            AssetId(100),
            MeshBounds::from_min_max(Vec3::splat(-0.5), Vec3::splat(0.5)),
        )
    }

    #[test]
    fn nested_transforms_compose() {
        let root = SceneNode::group(
            Transform::from_trs(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE),
            vec![SceneNode::Mesh {
                transform: Transform::from_trs(Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY, Vec3::ONE),
                mesh: unit_mesh(1),
                children: vec![SceneNode::mesh(
                    Transform::from_trs(Vec3::new(0.0, 0.0, 3.0), Quat::IDENTITY, Vec3::ONE),
                    unit_mesh(2),
                )],
            }],
        );

        let mut objects = Vec::new();
        root.collect_objects(Mat4::IDENTITY, &mut objects);

        assert_eq!(objects.len(), 2);
        assert_eq!(root.mesh_count(), 2);
        assert_eq!(objects[0].mesh, AssetId(1));

        let leaf = objects[1].transform.transform_point3(Vec3::ZERO);
        assert!(leaf.abs_diff_eq(Vec3::new(10.0, 2.0, 3.0), 1e-5));
        assert!(objects[1].bounds.valid);
        assert!(objects[1].bounds.origin.abs_diff_eq(Vec3::new(10.0, 2.0, 3.0), 1e-5));
    }

    #[test]
    fn groups_emit_nothing_themselves() {
        let root = SceneNode::group(Transform::default(), Vec::new());
        let mut objects = Vec::new();
        root.collect_objects(Mat4::IDENTITY, &mut objects);
        assert!(objects.is_empty());
    }
}
