// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bookkeeping for objects allocated by a [`GraphicsDevice`].
//!
//! The device keeps every live resource in a [`ResourcePool`], and the
//! resources themselves only carry a [`ResourceId`]. The id's generation makes
//! it safe to keep using an id after the resource has been disposed: it just
//! doesn't resolve to anything anymore.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice

use core::fmt::Debug;

/// Generation-checked index of a resource in a [`ResourcePool`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    index: u32,
    generation: u32,
}

impl Debug for ResourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ResourceId({}v{})", self.index, self.generation)
    }
}

/// Something allocated on a graphics device.
///
/// Disposal goes through the device, see
/// [`GraphicsDevice::dispose_resource`](crate::GraphicsDevice::dispose_resource).
pub trait GraphicsResource {
    /// The id of this resource in its device's resource pool.
    fn resource_id(&self) -> ResourceId;
}

/// Notifications sent to a resource's handlers, see
/// [`GraphicsDevice::connect_resource_events`](crate::GraphicsDevice::connect_resource_events).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEvent {
    /// The device the resource was created on has been reset.
    DeviceReset,
    /// The resource is about to be released. Sent exactly once.
    Disposing,
}

struct Slot<T> {
    // Bumped every time the slot is vacated, so that old ids stop matching.
    generation: u32,
    value: Option<T>,
}

/// Arena of `T` addressed by generation-checked [`ResourceId`]s.
pub struct ResourcePool<T> {
    slots: Vec<Slot<T>>,
    free_indices: Vec<u32>,
    len: usize,
}

impl<T> Default for ResourcePool<T> {
    fn default() -> Self {
        ResourcePool {
            slots: Vec::new(),
            free_indices: Vec::new(),
            len: 0,
        }
    }
}

impl<T> ResourcePool<T> {
    /// Creates an empty pool.
    pub fn new() -> ResourcePool<T> {
        ResourcePool::default()
    }

    /// Stores `value`, reusing a vacated slot if there is one.
    pub fn insert(&mut self, value: T) -> ResourceId {
        self.len += 1;
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            ResourceId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            ResourceId {
                index,
                generation: 0,
            }
        }
    }

    /// Returns the value if `id` still refers to it.
    pub fn get(&self, id: ResourceId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation == id.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    /// Returns the value if `id` still refers to it.
    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation == id.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    /// Removes and returns the value, invalidating `id` and every copy of it.
    /// Returns `None` if `id` was already invalid.
    pub fn remove(&mut self, id: ResourceId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(id.index);
        self.len -= 1;
        Some(value)
    }

    /// The ids of the live values, in slot order.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| ResourceId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Iterates over the live values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| slot.value.as_mut())
    }

    /// The amount of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::ResourcePool;

    #[test]
    fn removed_ids_go_stale() {
        let mut pool = ResourcePool::new();
        let a = pool.insert("a");
        let b = pool.insert("b");
        assert_eq!(Some(&"a"), pool.get(a));
        assert_eq!(Some("a"), pool.remove(a));
        assert_eq!(None, pool.remove(a), "second removal should do nothing");
        assert_eq!(None, pool.get(a));
        assert_eq!(1, pool.len());

        // The slot is reused, but the old id doesn't see the new value.
        let c = pool.insert("c");
        assert_eq!(None, pool.get(a));
        assert_eq!(Some(&"c"), pool.get(c));
        assert_eq!(vec![c, b], pool.ids());
    }

    #[test]
    fn iterates_live_values_only() {
        let mut pool = ResourcePool::new();
        let ids: Vec<_> = (0..5).map(|i| pool.insert(i)).collect();
        pool.remove(ids[1]);
        pool.remove(ids[3]);
        let mut values: Vec<i32> = pool.iter_mut().map(|value| *value).collect();
        values.sort();
        assert_eq!(vec![0, 2, 4], values);
        assert!(!pool.is_empty());
    }
}
