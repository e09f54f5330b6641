use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Dense index into a table of `T`.
///
/// Handles are plain `u32` indices tagged with the table they point into, so a
/// `Handle<DrawMesh>` can't be passed where a `Handle<Material>` is expected.
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

// Manual impls so none of them require bounds on T.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

impl<T> Handle<T> {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub(crate) fn from_usize(index: usize) -> Self {
        let index = u32::try_from(index).expect("handle table exceeded u32::MAX entries");
        Self::new(index)
    }

    pub const fn raw(&self) -> u32 {
        self.index
    }

    pub const fn index(&self) -> usize {
        self.index as usize
    }
}
