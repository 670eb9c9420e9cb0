//! Tracked-device packets exchanged between the command layer, the mesh and the
//! background scanner.
//!
//! All packets are packed; multi-byte fields are little endian, matching the
//! on-air layout of mesh messages.

use std::io;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Primary key of a tracked device
pub type DeviceId = u16;

/// Size of a tracked device token in bytes
pub const DEVICE_TOKEN_SIZE: usize = 3;

/// Token broadcast by a tracked device in its background advertisements
pub type DeviceToken = [u8; DEVICE_TOKEN_SIZE];

/// Bit in the flags byte: sightings of this device must not drive behaviour
pub const FLAG_IGNORE_FOR_BEHAVIOUR: u8 = 1 << 1;

// Result status codes for register/update commands
pub const REGISTER_OK: u8 = 0;
pub const REGISTER_ERR_NO_SPACE: u8 = 1;
pub const REGISTER_ERR_NO_ACCESS: u8 = 2;
pub const REGISTER_ERR_ALREADY_EXISTS: u8 = 3;

/// Outcome of a locally-originated register or update command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Status {
    Success,
    NoSpace,
    NoAccess,
    AlreadyExists,
}

impl Status {
    pub fn code(&self) -> u8 {
        match self {
            Status::Success => REGISTER_OK,
            Status::NoSpace => REGISTER_ERR_NO_SPACE,
            Status::NoAccess => REGISTER_ERR_NO_ACCESS,
            Status::AlreadyExists => REGISTER_ERR_ALREADY_EXISTS,
        }
    }

    pub fn from_code(code: u8) -> io::Result<Self> {
        match code {
            REGISTER_OK => Ok(Status::Success),
            REGISTER_ERR_NO_SPACE => Ok(Status::NoSpace),
            REGISTER_ERR_NO_ACCESS => Ok(Status::NoAccess),
            REGISTER_ERR_ALREADY_EXISTS => Ok(Status::AlreadyExists),
            other => Err(invalid(format!("unknown register status {other}"))),
        }
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn check_len(data: &[u8], len: usize, what: &str) -> io::Result<()> {
    if data.len() < len {
        return Err(invalid(format!("{what} too short")));
    }
    Ok(())
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_token(data: &[u8], at: usize) -> DeviceToken {
    [data[at], data[at + 1], data[at + 2]]
}

/// REGISTER / UPDATE command: full description of a tracked device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegisterTrackedDevice {
    pub device_id: DeviceId,
    /// Access level of whoever issued the command
    pub access_level: u8,
    pub location_id: u8,
    pub profile_id: u8,
    pub rssi_offset: i8,
    pub flags: u8,
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_token"))]
    pub device_token: DeviceToken,
    pub ttl_minutes: u16,
}

impl RegisterTrackedDevice {
    pub const SIZE: usize = 12;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.device_id.to_le_bytes());
        buf.push(self.access_level);
        buf.push(self.location_id);
        buf.push(self.profile_id);
        buf.push(self.rssi_offset as u8);
        buf.push(self.flags);
        buf.extend_from_slice(&self.device_token);
        buf.extend_from_slice(&self.ttl_minutes.to_le_bytes());
        buf
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        check_len(data, Self::SIZE, "REGISTER_TRACKED_DEVICE")?;
        Ok(Self {
            device_id: read_u16(data, 0),
            access_level: data[2],
            location_id: data[3],
            profile_id: data[4],
            rssi_offset: data[5] as i8,
            flags: data[6],
            device_token: read_token(data, 7),
            ttl_minutes: read_u16(data, 10),
        })
    }
}

/// Tracked device registration as replicated over the mesh (no token)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshRegister {
    pub device_id: DeviceId,
    pub location_id: u8,
    pub profile_id: u8,
    pub rssi_offset: i8,
    pub flags: u8,
    pub access_level: u8,
}

impl MeshRegister {
    pub const SIZE: usize = 7;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.device_id.to_le_bytes());
        buf.push(self.location_id);
        buf.push(self.profile_id);
        buf.push(self.rssi_offset as u8);
        buf.push(self.flags);
        buf.push(self.access_level);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        check_len(data, Self::SIZE, "MESH_TRACKED_DEVICE_REGISTER")?;
        Ok(Self {
            device_id: read_u16(data, 0),
            location_id: data[2],
            profile_id: data[3],
            rssi_offset: data[4] as i8,
            flags: data[5],
            access_level: data[6],
        })
    }
}

/// Token and its time to live, replicated over the mesh separately
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshToken {
    pub device_id: DeviceId,
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_token"))]
    pub device_token: DeviceToken,
    pub ttl_minutes: u16,
}

impl MeshToken {
    pub const SIZE: usize = 7;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.device_id.to_le_bytes());
        buf.extend_from_slice(&self.device_token);
        buf.extend_from_slice(&self.ttl_minutes.to_le_bytes());
        buf
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        check_len(data, Self::SIZE, "MESH_TRACKED_DEVICE_TOKEN")?;
        Ok(Self {
            device_id: read_u16(data, 0),
            device_token: read_token(data, 2),
            ttl_minutes: read_u16(data, 5),
        })
    }
}

/// Profile/location pair broadcast to the rest of the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshProfileLocation {
    pub profile_id: u8,
    pub location_id: u8,
}

impl MeshProfileLocation {
    pub const SIZE: usize = 2;

    pub fn to_bytes(&self) -> Vec<u8> {
        vec![self.profile_id, self.location_id]
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        check_len(data, Self::SIZE, "MESH_PROFILE_LOCATION")?;
        Ok(Self {
            profile_id: data[0],
            location_id: data[1],
        })
    }
}

/// Local event: a profile has been observed at a location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileLocation {
    pub profile_id: u8,
    pub location_id: u8,
    pub from_mesh: bool,
}

/// A background advertisement that was parsed into a token sighting
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sighting {
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_token"))]
    pub device_token: DeviceToken,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rssi: i8,
}

impl Sighting {
    pub const SIZE: usize = 4;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.device_token);
        buf.push(self.rssi as u8);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        check_len(data, Self::SIZE, "BACKGROUND_SIGHTING")?;
        Ok(Self {
            device_token: read_token(data, 0),
            rssi: data[3] as i8,
        })
    }
}
