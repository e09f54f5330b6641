pub mod cache;
pub mod handle;
pub mod mesh;

pub use cache::HandleRegistry;
pub use handle::Handle;
pub use mesh::{MeshAsset, MeshBounds};

use serde::{Deserialize, Serialize};

/// Stable identity the loader assigns to every mesh or material it produces.
///
/// Registries key on this instead of object addresses, so assets can be moved
/// or reallocated without breaking deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u64);
