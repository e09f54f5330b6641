// renderer/material.rs
use serde::{Deserialize, Serialize};

use super::pass::{MeshPassType, PerPassData};
use crate::asset::AssetId;

/// Opaque reference to a compiled pipeline owned by the shader system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipelineRef(pub u64);

/// Opaque reference to a bound resource set (descriptor set / bind group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindingSetRef(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransparencyMode {
    #[default]
    Opaque,
    Transparent,
    Masked,
}

/// Pipeline and binding set a material uses in one pass. Either side may still
/// be unresolved while the shader system is warming up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ShaderPass {
    pub pipeline: Option<PipelineRef>,
    pub binding_set: Option<BindingSetRef>,
}

impl ShaderPass {
    pub const fn new(pipeline: PipelineRef, binding_set: BindingSetRef) -> Self {
        Self {
            pipeline: Some(pipeline),
            binding_set: Some(binding_set),
        }
    }

    pub fn resolve(&self) -> Option<PassMaterial> {
        Some(PassMaterial {
            pipeline: self.pipeline?,
            binding_set: self.binding_set?,
        })
    }
}

/// The part of a material that matters for batching. Two materials batch
/// together iff their snapshots are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassMaterial {
    pub pipeline: PipelineRef,
    pub binding_set: BindingSetRef,
}

impl PassMaterial {
    /// 64-bit mix of pipeline and binding set used for sort keys. The two
    /// fields are chained through separately seeded mixes, so swapped or equal
    /// raw values never cancel out.
    pub fn hash_key(&self) -> u64 {
        let binding_set = mix64(self.binding_set.0 ^ BINDING_SET_SEED);
        mix64(self.pipeline.0 ^ binding_set ^ PIPELINE_SEED)
    }
}

const PIPELINE_SEED: u64 = 0x9e37_79b9_7f4a_7c15;
const BINDING_SET_SEED: u64 = 0xd1b5_4a32_d192_ed03;

/// Finalizer from splitmix64. Deterministic across runs and platforms.
pub(crate) const fn mix64(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// A material as resolved by the material system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: AssetId,
    pub passes: PerPassData<ShaderPass>,
    #[serde(default)]
    pub transparency: TransparencyMode,
}

impl Material {
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            passes: PerPassData::default(),
            transparency: TransparencyMode::Opaque,
        }
    }

    pub fn with_pass(mut self, pass: MeshPassType, shader: ShaderPass) -> Self {
        self.passes[pass] = shader;
        self
    }

    pub fn with_transparency(mut self, transparency: TransparencyMode) -> Self {
        self.transparency = transparency;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.transparency == TransparencyMode::Transparent
    }

    pub fn snapshot(&self, pass: MeshPassType) -> Option<PassMaterial> {
        self.passes[pass].resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_pass_has_no_snapshot() {
        let material = Material::new(AssetId(1)).with_pass(
            MeshPassType::Forward,
            ShaderPass {
                pipeline: Some(PipelineRef(3)),
                binding_set: None,
            },
        );
        assert_eq!(material.snapshot(MeshPassType::Forward), None);
        assert_eq!(material.snapshot(MeshPassType::DirectionalShadow), None);
    }

    #[test]
    fn equal_snapshots_hash_equal() {
        let a = ShaderPass::new(PipelineRef(1), BindingSetRef(2)).resolve().unwrap();
        let b = ShaderPass::new(PipelineRef(1), BindingSetRef(2)).resolve().unwrap();
        let c = ShaderPass::new(PipelineRef(1), BindingSetRef(3)).resolve().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hash_key(), b.hash_key());
        assert_ne!(a.hash_key(), c.hash_key());
    }

    #[test]
    fn pipeline_and_binding_set_never_cancel() {
        let key = |p: u64, s: u64| PassMaterial {
            pipeline: PipelineRef(p),
            binding_set: BindingSetRef(s),
        }
        .hash_key();

        assert_ne!(key(1, 1), 0);
        assert_ne!(key(1, 1), key(2, 2));
        assert_ne!(key(3, 4), key(4, 3));

        let mut keys: Vec<_> = (0..8).flat_map(|p| (0..8).map(move |s| key(p, s))).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 64);
    }

    #[test]
    fn mix_is_not_identity() {
        assert_ne!(mix64(1), 1);
        assert_eq!(mix64(0), 0);
    }
}
