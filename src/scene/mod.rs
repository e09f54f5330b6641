// scene/mod.rs

pub mod bounds;
pub mod node;
pub mod object;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use bounds::RenderBounds;
pub use node::{MeshNode, SceneNode};
pub use object::{MeshObject, RenderObject};
pub use scene::{ObjectUpload, RenderScene};
pub use transform::Transform;
