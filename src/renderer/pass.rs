use std::ops::{Index, IndexMut};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Rendering purposes that keep their own batching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshPassType {
    Forward,
    Transparency,
    DirectionalShadow,
}

impl MeshPassType {
    pub const COUNT: usize = 3;
    pub const ALL: [MeshPassType; Self::COUNT] = [
        MeshPassType::Forward,
        MeshPassType::Transparency,
        MeshPassType::DirectionalShadow,
    ];

    pub const fn slot(self) -> usize {
        match self {
            MeshPassType::Forward => 0,
            MeshPassType::Transparency => 1,
            MeshPassType::DirectionalShadow => 2,
        }
    }
}

bitflags! {
    /// Which passes an object asks to be drawn in. The material's transparency
    /// decides whether a forward request lands in the forward or the
    /// transparency pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PassTypeFlags: u8 {
        const FORWARD = 1 << 0;
        const SHADOW = 1 << 1;
    }
}

impl Default for PassTypeFlags {
    fn default() -> Self {
        PassTypeFlags::FORWARD | PassTypeFlags::SHADOW
    }
}

/// One `T` per [`MeshPassType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerPassData<T> {
    data: [T; MeshPassType::COUNT],
}

impl<T> PerPassData<T> {
    pub const fn new(forward: T, transparency: T, shadow: T) -> Self {
        Self {
            data: [forward, transparency, shadow],
        }
    }

    pub fn from_fn(mut f: impl FnMut(MeshPassType) -> T) -> Self {
        Self {
            data: MeshPassType::ALL.map(&mut f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshPassType, &T)> {
        MeshPassType::ALL.into_iter().zip(self.data.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (MeshPassType, &mut T)> {
        MeshPassType::ALL.into_iter().zip(self.data.iter_mut())
    }

    pub fn values_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }
}

impl<T: Clone> PerPassData<T> {
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T> Index<MeshPassType> for PerPassData<T> {
    type Output = T;

    fn index(&self, pass: MeshPassType) -> &T {
        &self.data[pass.slot()]
    }
}

impl<T> IndexMut<MeshPassType> for PerPassData<T> {
    fn index_mut(&mut self, pass: MeshPassType) -> &mut T {
        &mut self.data[pass.slot()]
    }
}
