use std::collections::HashMap;

use super::{AssetId, Handle};

/// Dense table of `T` with an identity map from the loader's [`AssetId`] to the
/// handle of the entry created for it.
///
/// Entries are never removed; asset identities outlive any scene that
/// references them.
pub struct HandleRegistry<T> {
    items: Vec<T>,
    lookup: HashMap<AssetId, Handle<T>>,
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Returns the handle already bound to `id`, or appends `make()` and binds
    /// the new slot to it.
    pub fn get_or_create_handle(&mut self, id: AssetId, make: impl FnOnce() -> T) -> Handle<T> {
        if let Some(&handle) = self.lookup.get(&id) {
            return handle;
        }

        let handle = Handle::from_usize(self.items.len());
        self.items.push(make());
        self.lookup.insert(id, handle);
        handle
    }

    pub fn handle_of(&self, id: AssetId) -> Option<Handle<T>> {
        self.lookup.get(&id).copied()
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (Handle::from_usize(index), item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<Handle<T>> for HandleRegistry<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        match self.items.get(handle.index()) {
            Some(item) => item,
            None => panic!(
                "{:?} is out of range for a registry of {} entries",
                handle,
                self.items.len()
            ),
        }
    }
}
