//! Overwrite permission and token uniqueness checks

use bhumi_mcu::AccessPolicy;
use bhumi_proto::{DeviceId, DeviceToken};

use crate::entry::{FieldsSet, TrackedDevice};
use crate::store::EntryStore;

/// Whether a request at `requested` level may overwrite `device`
///
/// A device whose token timed out (or never got one) can be claimed by anyone,
/// and so can one that was never registered with an access level.
pub fn has_access<P: AccessPolicy + ?Sized>(
    policy: &P,
    device: &TrackedDevice,
    requested: u8,
) -> bool {
    if !device.is_valid_ttl() {
        return true;
    }
    if !device.fields_set().contains(FieldsSet::ACCESS_LEVEL) {
        return true;
    }
    policy.allow_access(device.access_level(), requested)
}

/// The other device holding `token`, if that would make setting it on `device`
/// a duplicate
///
/// The owner's TTL is not looked at: an expired registration still holds on
/// to its token.
pub fn token_conflict<const N: usize>(
    store: &EntryStore<N>,
    device: &TrackedDevice,
    token: &DeviceToken,
) -> Option<DeviceId> {
    let owner = store.find_by_token(token)?;
    if owner.device_id() == device.device_id() {
        return None;
    }
    Some(owner.device_id())
}

pub fn is_token_ok_to_set<const N: usize>(
    store: &EntryStore<N>,
    device: &TrackedDevice,
    token: &DeviceToken,
) -> bool {
    token_conflict(store, device, token).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Deny;

    impl AccessPolicy for Deny {
        fn allow_access(&self, _existing: u8, _requested: u8) -> bool {
            false
        }
    }

    #[test]
    fn invalid_ttl_grants_access() {
        let mut device = TrackedDevice::new(1);
        device.set_access_level(0);
        assert!(has_access(&Deny, &device, 2));

        device.set_ttl(0);
        assert!(has_access(&Deny, &device, 2));
    }

    #[test]
    fn no_access_level_grants_access() {
        let mut device = TrackedDevice::new(1);
        device.set_ttl(10);
        assert!(has_access(&Deny, &device, 2));

        device.set_access_level(0);
        assert!(!has_access(&Deny, &device, 2));
    }

    #[test]
    fn policy_decides_otherwise() {
        let mut device = TrackedDevice::new(1);
        device.set_ttl(10);
        device.set_access_level(1);
        let policy = bhumi_mcu::RankedAccessPolicy;
        assert!(has_access(&policy, &device, 0));
        assert!(!has_access(&policy, &device, 2));
    }

    #[test]
    fn token_owned_by_self_or_nobody() {
        let mut store = EntryStore::<3>::new();
        let first = store.find_or_add(1).unwrap();
        store.get_mut(first).unwrap().set_device_token([1, 1, 1]);
        store.find_or_add(2).unwrap();

        let one = *store.find(1).unwrap();
        let two = *store.find(2).unwrap();
        assert!(is_token_ok_to_set(&store, &one, &[1, 1, 1]));
        assert!(is_token_ok_to_set(&store, &two, &[2, 2, 2]));
        assert!(!is_token_ok_to_set(&store, &two, &[1, 1, 1]));
        assert_eq!(token_conflict(&store, &two, &[1, 1, 1]), Some(1));
    }

    #[test]
    fn expired_owner_still_conflicts() {
        let mut store = EntryStore::<2>::new();
        let first = store.find_or_add(1).unwrap();
        let owner = store.get_mut(first).unwrap();
        owner.set_device_token([5, 5, 5]);
        owner.set_ttl(0);
        store.find_or_add(2).unwrap();

        let two = *store.find(2).unwrap();
        assert!(!is_token_ok_to_set(&store, &two, &[5, 5, 5]));
    }
}
