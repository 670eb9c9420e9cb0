//! Access Levels and Policy
//!
//! Every local command carries the access level of whoever issued it. A stored
//! registration remembers the level it was written with, and the policy decides
//! whether a new request may overwrite it.

/// Ordered trust tiers, lower value means more privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum AccessLevel {
    Admin = 0,
    Member = 1,
    Basic = 2,
    Setup = 100,
    NotSet = 201,
    EncryptionDisabled = 254,
    NoOne = 255,
}

impl AccessLevel {
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(AccessLevel::Admin),
            1 => Some(AccessLevel::Member),
            2 => Some(AccessLevel::Basic),
            100 => Some(AccessLevel::Setup),
            201 => Some(AccessLevel::NotSet),
            254 => Some(AccessLevel::EncryptionDisabled),
            255 => Some(AccessLevel::NoOne),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> u8 {
        *self as u8
    }
}

/// Decides whether a request at `requested` level may act on something that
/// requires `existing` level
pub trait AccessPolicy {
    fn allow_access(&self, existing: u8, requested: u8) -> bool;
}

impl<P: AccessPolicy + ?Sized> AccessPolicy for &P {
    fn allow_access(&self, existing: u8, requested: u8) -> bool {
        (**self).allow_access(existing, requested)
    }
}

/// Reference policy: a user tier may act when it is at least as privileged as
/// the stored one. Setup only unlocks setup-level registrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedAccessPolicy;

impl AccessPolicy for RankedAccessPolicy {
    fn allow_access(&self, existing: u8, requested: u8) -> bool {
        let (Some(existing), Some(requested)) =
            (AccessLevel::from_byte(existing), AccessLevel::from_byte(requested))
        else {
            return false;
        };

        match existing {
            AccessLevel::NoOne => return false,
            AccessLevel::EncryptionDisabled => return true,
            _ => {}
        }

        match requested {
            AccessLevel::Admin | AccessLevel::Member | AccessLevel::Basic => requested <= existing,
            AccessLevel::Setup => existing == AccessLevel::Setup,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(existing: AccessLevel, requested: AccessLevel) -> bool {
        RankedAccessPolicy.allow_access(existing.as_byte(), requested.as_byte())
    }

    #[test]
    fn more_privileged_tiers_may_overwrite() {
        assert!(allow(AccessLevel::Basic, AccessLevel::Admin));
        assert!(allow(AccessLevel::Member, AccessLevel::Member));
        assert!(!allow(AccessLevel::Admin, AccessLevel::Member));
        assert!(!allow(AccessLevel::Member, AccessLevel::Basic));
    }

    #[test]
    fn special_tiers() {
        assert!(!allow(AccessLevel::NoOne, AccessLevel::Admin));
        assert!(allow(AccessLevel::EncryptionDisabled, AccessLevel::Basic));
        assert!(allow(AccessLevel::Setup, AccessLevel::Setup));
        assert!(!allow(AccessLevel::Admin, AccessLevel::Setup));
        assert!(!allow(AccessLevel::Basic, AccessLevel::NotSet));
    }

    #[test]
    fn unknown_bytes_are_denied() {
        assert_eq!(AccessLevel::from_byte(7), None);
        assert!(!RankedAccessPolicy.allow_access(7, 0));
        assert!(!RankedAccessPolicy.allow_access(2, 7));
    }
}
