//! TTL decay driven by the periodic tick

use log::*;

use crate::store::EntryStore;

/// Counts ticks down to the next minute boundary
#[derive(Debug, Clone)]
pub struct DecayDriver {
    ticks_per_minute: u32,
    ticks_left: u32,
}

impl DecayDriver {
    pub fn new(ticks_per_minute: u32) -> Self {
        let ticks_per_minute = ticks_per_minute.max(1);
        Self {
            ticks_per_minute,
            ticks_left: ticks_per_minute,
        }
    }

    pub fn ticks_left(&self) -> u32 {
        self.ticks_left
    }

    /// Returns true when a minute has passed
    pub fn on_tick(&mut self) -> bool {
        self.ticks_left -= 1;
        if self.ticks_left == 0 {
            self.ticks_left = self.ticks_per_minute;
            return true;
        }
        false
    }
}

/// Takes one minute off every valid TTL. Entries reaching zero stay in place.
pub fn decrease_ttl<const N: usize>(store: &mut EntryStore<N>) {
    let mut decayed = 0;
    for device in store.iter_mut() {
        if device.is_valid_ttl() {
            device.decrease_ttl();
            decayed += 1;
        }
    }
    debug!("Decayed TTL of {decayed} tracked device(s)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_minute() {
        let mut driver = DecayDriver::new(3);
        assert!(!driver.on_tick());
        assert!(!driver.on_tick());
        assert!(driver.on_tick());
        assert_eq!(driver.ticks_left(), 3);
        assert!(!driver.on_tick());
    }

    #[test]
    fn single_tick_minute() {
        let mut driver = DecayDriver::new(1);
        assert!(driver.on_tick());
        assert!(driver.on_tick());
    }

    #[test]
    fn zero_is_treated_as_one() {
        let mut driver = DecayDriver::new(0);
        assert!(driver.on_tick());
    }

    #[test]
    fn only_set_ttls_decay() {
        let mut store = EntryStore::<3>::new();
        let with_ttl = store.find_or_add(1).unwrap();
        store.get_mut(with_ttl).unwrap().set_ttl(2);
        let expired = store.find_or_add(2).unwrap();
        store.get_mut(expired).unwrap().set_ttl(0);
        store.find_or_add(3).unwrap();

        decrease_ttl(&mut store);
        assert_eq!(store.find(1).unwrap().ttl_minutes(), 1);
        assert_eq!(store.find(2).unwrap().ttl_minutes(), 0);
        assert_eq!(store.find(3).unwrap().ttl_minutes(), 0);
        assert!(!store.find(3).unwrap().fields_set().contains(crate::FieldsSet::TTL));

        decrease_ttl(&mut store);
        decrease_ttl(&mut store);
        assert_eq!(store.find(1).unwrap().ttl_minutes(), 0);
        assert_eq!(store.len(), 3);
    }
}
