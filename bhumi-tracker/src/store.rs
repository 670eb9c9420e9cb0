//! Fixed-capacity store of tracked devices
//!
//! Entries live in a slot array sized at compile time. A second array keeps
//! the occupied slot indices in insertion order: the most recently inserted
//! entry is the head, the oldest one the tail. Nothing here allocates, and
//! every operation is a single pass over at most `N` elements.

use log::*;

use bhumi_proto::{DeviceId, DeviceToken};

use crate::entry::TrackedDevice;
use crate::error::TrackerError;

/// Bounded, insertion-ordered collection of tracked devices
#[derive(Debug, Clone)]
pub struct EntryStore<const N: usize> {
    slots: [Option<TrackedDevice>; N],
    /// Slot indices, head first; only `order[..len]` is meaningful
    order: [usize; N],
    len: usize,
}

impl<const N: usize> Default for EntryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EntryStore<N> {
    pub fn new() -> Self {
        Self {
            slots: [None; N],
            order: [0; N],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= N
    }

    /// Entries from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &TrackedDevice> + '_ {
        self.order[..self.len]
            .iter()
            .filter_map(move |&index| self.slots[index].as_ref())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedDevice> + '_ {
        self.slots.iter_mut().flatten()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&TrackedDevice> {
        self.slots.get(index)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut TrackedDevice> {
        self.slots.get_mut(index)?.as_mut()
    }

    // Ids are unique, and so are tokens among entries holding one, so slot
    // order does not matter for lookups.

    fn position(&self, device_id: DeviceId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|d| d.device_id() == device_id))
    }

    pub(crate) fn position_by_token(&self, token: &DeviceToken) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| {
                slot.as_ref()
                    .is_some_and(|d| d.has_token() && d.device_token() == token)
            })
    }

    pub fn find(&self, device_id: DeviceId) -> Option<&TrackedDevice> {
        self.get(self.position(device_id)?)
    }

    /// Only entries that had a token written can match
    pub fn find_by_token(&self, token: &DeviceToken) -> Option<&TrackedDevice> {
        self.get(self.position_by_token(token)?)
    }

    /// Slot of the device, creating an empty record at the head if it is new
    pub(crate) fn find_or_add(&mut self, device_id: DeviceId) -> Result<usize, TrackerError> {
        if let Some(index) = self.position(device_id) {
            return Ok(index);
        }
        let index = self.add(device_id)?;
        debug!("Tracking new device {} ({}/{} slots used)", device_id, self.len, N);
        Ok(index)
    }

    fn add(&mut self, device_id: DeviceId) -> Result<usize, TrackerError> {
        if self.is_full() {
            self.evict()?;
        }
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(TrackerError::CapacityExhausted)?;

        self.slots[index] = Some(TrackedDevice::new(device_id));
        self.order.copy_within(0..self.len, 1);
        self.order[0] = index;
        self.len += 1;
        Ok(index)
    }

    /// Removes one entry to make room, returning the evicted device id
    ///
    /// Scans head to tail. The first incomplete entry is removed right away.
    /// Otherwise the entry with the lowest TTL goes, and on equal TTL the one
    /// closer to the tail.
    pub fn evict(&mut self) -> Result<DeviceId, TrackerError> {
        let mut lowest_ttl = u16::MAX;
        let mut to_remove = None;

        for (pos, &index) in self.order[..self.len].iter().enumerate() {
            let Some(device) = self.get(index) else { continue };
            if !device.is_complete() {
                to_remove = Some(pos);
                break;
            }
            if device.ttl_minutes() <= lowest_ttl {
                lowest_ttl = device.ttl_minutes();
                to_remove = Some(pos);
            }
        }

        let pos = to_remove.ok_or(TrackerError::CapacityExhausted)?;
        let removed = self.slots[self.order[pos]]
            .take()
            .ok_or(TrackerError::CapacityExhausted)?;
        self.order.copy_within(pos + 1..self.len, pos);
        self.len -= 1;

        info!(
            "Evicted tracked device {} (complete: {}, ttl: {})",
            removed.device_id(),
            removed.is_complete(),
            removed.ttl_minutes()
        );
        Ok(removed.device_id())
    }
}
