//! Incremental render-scene batching: keeps renderable objects grouped by
//! pipeline, binding set and mesh across frames, and flattens the groups into
//! indirect-draw and instance buffers.

pub mod asset;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use asset::{AssetId, Handle, MeshAsset, MeshBounds};
pub use renderer::{
    DrawMesh, IndirectBatch, Material, MeshPass, MeshPassType, Multibatch, PassTypeFlags,
};
pub use scene::{MeshObject, RenderObject, RenderScene, SceneNode};
pub use settings::BatchingSettings;

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    // Set panic hook to get better error messages
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
