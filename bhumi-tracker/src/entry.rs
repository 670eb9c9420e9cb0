//! Tracked device record and the bitmask of fields written so far

use serde::Serialize;

use bhumi_proto::{
    DeviceId, DeviceToken, FLAG_IGNORE_FOR_BEHAVIOUR, MeshProfileLocation, MeshRegister, MeshToken,
};

/// Which of the seven registration fields have been written at least once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FieldsSet(u8);

impl FieldsSet {
    pub const ACCESS_LEVEL: FieldsSet = FieldsSet(1 << 0);
    pub const LOCATION: FieldsSet = FieldsSet(1 << 1);
    pub const PROFILE: FieldsSet = FieldsSet(1 << 2);
    pub const RSSI_OFFSET: FieldsSet = FieldsSet(1 << 3);
    pub const FLAGS: FieldsSet = FieldsSet(1 << 4);
    pub const DEVICE_TOKEN: FieldsSet = FieldsSet(1 << 5);
    pub const TTL: FieldsSet = FieldsSet(1 << 6);

    pub const NONE: FieldsSet = FieldsSet(0);
    pub const ALL: FieldsSet = FieldsSet(0x7f);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, field: FieldsSet) -> bool {
        self.0 & field.0 == field.0
    }

    pub fn insert(&mut self, field: FieldsSet) {
        self.0 |= field.0;
    }

    pub fn is_complete(&self) -> bool {
        *self == Self::ALL
    }
}

/// A device the node knows about, possibly only partially registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackedDevice {
    device_id: DeviceId,
    access_level: u8,
    location_id: u8,
    profile_id: u8,
    rssi_offset: i8,
    flags: u8,
    #[serde(with = "bhumi_proto::hex_token")]
    device_token: DeviceToken,
    ttl_minutes: u16,
    fields_set: FieldsSet,
}

impl TrackedDevice {
    /// Zero-valued record with nothing but its id
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            access_level: 0,
            location_id: 0,
            profile_id: 0,
            rssi_offset: 0,
            flags: 0,
            device_token: [0; bhumi_proto::DEVICE_TOKEN_SIZE],
            ttl_minutes: 0,
            fields_set: FieldsSet::NONE,
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn access_level(&self) -> u8 {
        self.access_level
    }

    pub fn location_id(&self) -> u8 {
        self.location_id
    }

    pub fn profile_id(&self) -> u8 {
        self.profile_id
    }

    pub fn rssi_offset(&self) -> i8 {
        self.rssi_offset
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn device_token(&self) -> &DeviceToken {
        &self.device_token
    }

    pub fn ttl_minutes(&self) -> u16 {
        self.ttl_minutes
    }

    pub fn fields_set(&self) -> FieldsSet {
        self.fields_set
    }

    pub fn is_complete(&self) -> bool {
        self.fields_set.is_complete()
    }

    pub fn has_token(&self) -> bool {
        self.fields_set.contains(FieldsSet::DEVICE_TOKEN)
    }

    pub fn ignore_for_behaviour(&self) -> bool {
        self.flags & FLAG_IGNORE_FOR_BEHAVIOUR != 0
    }

    /// TTL counts only once written, and not after it ran out
    pub fn is_valid_ttl(&self) -> bool {
        self.fields_set.contains(FieldsSet::TTL) && self.ttl_minutes != 0
    }

    // Setters overwrite unconditionally and mark the field as set.

    pub fn set_access_level(&mut self, access_level: u8) {
        self.access_level = access_level;
        self.fields_set.insert(FieldsSet::ACCESS_LEVEL);
    }

    pub fn set_location(&mut self, location_id: u8) {
        self.location_id = location_id;
        self.fields_set.insert(FieldsSet::LOCATION);
    }

    pub fn set_profile(&mut self, profile_id: u8) {
        self.profile_id = profile_id;
        self.fields_set.insert(FieldsSet::PROFILE);
    }

    pub fn set_rssi_offset(&mut self, rssi_offset: i8) {
        self.rssi_offset = rssi_offset;
        self.fields_set.insert(FieldsSet::RSSI_OFFSET);
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
        self.fields_set.insert(FieldsSet::FLAGS);
    }

    pub fn set_device_token(&mut self, device_token: DeviceToken) {
        self.device_token = device_token;
        self.fields_set.insert(FieldsSet::DEVICE_TOKEN);
    }

    pub fn set_ttl(&mut self, ttl_minutes: u16) {
        self.ttl_minutes = ttl_minutes;
        self.fields_set.insert(FieldsSet::TTL);
    }

    /// Counts the TTL down by one minute; untouched when unset or already zero
    pub(crate) fn decrease_ttl(&mut self) {
        if self.is_valid_ttl() {
            self.ttl_minutes -= 1;
        }
    }

    pub fn mesh_register(&self) -> MeshRegister {
        MeshRegister {
            device_id: self.device_id,
            location_id: self.location_id,
            profile_id: self.profile_id,
            rssi_offset: self.rssi_offset,
            flags: self.flags,
            access_level: self.access_level,
        }
    }

    pub fn mesh_token(&self) -> MeshToken {
        MeshToken {
            device_id: self.device_id,
            device_token: self.device_token,
            ttl_minutes: self.ttl_minutes,
        }
    }

    pub fn mesh_profile_location(&self) -> MeshProfileLocation {
        MeshProfileLocation {
            profile_id: self.profile_id,
            location_id: self.location_id,
        }
    }
}
