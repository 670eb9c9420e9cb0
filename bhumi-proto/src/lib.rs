//! Bhumi tracked-device protocol - message types and framing

use std::io::{self, Read, Write};

pub mod tracked;

pub use tracked::*;

// Message types
pub const MSG_REGISTER_TRACKED_DEVICE: u16 = 0x0101;
pub const MSG_UPDATE_TRACKED_DEVICE: u16 = 0x0102;
pub const MSG_REGISTER_RESULT: u16 = 0x0103;
pub const MSG_MESH_TRACKED_DEVICE_REGISTER: u16 = 0x0111;
pub const MSG_MESH_TRACKED_DEVICE_TOKEN: u16 = 0x0112;
pub const MSG_MESH_PROFILE_LOCATION: u16 = 0x0113;
pub const MSG_BACKGROUND_SIGHTING: u16 = 0x0121;

/// Largest payload any tracked-device frame carries, with headroom
pub const MAX_FRAME_PAYLOAD: usize = 64;

/// Frame: wraps any message with type and length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u16,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(msg_type: u16, payload: Vec<u8>) -> Self {
        Self { msg_type, payload }
    }

    pub fn register(packet: &RegisterTrackedDevice) -> Self {
        Self::new(MSG_REGISTER_TRACKED_DEVICE, packet.to_bytes())
    }

    pub fn update(packet: &RegisterTrackedDevice) -> Self {
        Self::new(MSG_UPDATE_TRACKED_DEVICE, packet.to_bytes())
    }

    pub fn register_result(status: Status) -> Self {
        Self::new(MSG_REGISTER_RESULT, vec![status.code()])
    }

    pub fn mesh_register(packet: &MeshRegister) -> Self {
        Self::new(MSG_MESH_TRACKED_DEVICE_REGISTER, packet.to_bytes())
    }

    pub fn mesh_token(packet: &MeshToken) -> Self {
        Self::new(MSG_MESH_TRACKED_DEVICE_TOKEN, packet.to_bytes())
    }

    pub fn mesh_profile_location(packet: &MeshProfileLocation) -> Self {
        Self::new(MSG_MESH_PROFILE_LOCATION, packet.to_bytes())
    }

    pub fn sighting(packet: &Sighting) -> Self {
        Self::new(MSG_BACKGROUND_SIGHTING, packet.to_bytes())
    }

    /// Header plus payload, as written by `write_to`
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        if self.payload.len() > MAX_FRAME_PAYLOAD {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "frame too large"));
        }
        let mut buf = Vec::with_capacity(4 + self.payload.len());
        buf.extend_from_slice(&self.msg_type.to_be_bytes());
        buf.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// Write frame to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes()?)
    }

    /// Read frame from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header)?;

        let msg_type = u16::from_be_bytes([header[0], header[1]]);
        let len = u16::from_be_bytes([header[2], header[3]]) as usize;

        // Sanity check
        if len > MAX_FRAME_PAYLOAD {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "frame too large"));
        }

        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload)?;

        Ok(Self { msg_type, payload })
    }
}

/// Serde helper: tokens travel as lowercase hex strings in JSON
#[cfg(feature = "serde")]
pub mod hex_token {
    use super::{DEVICE_TOKEN_SIZE, DeviceToken};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(token: &DeviceToken, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&data_encoding::HEXLOWER.encode(token))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DeviceToken, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = data_encoding::HEXLOWER_PERMISSIVE
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("expected {DEVICE_TOKEN_SIZE} bytes")))
    }
}

/// Async frame operations for tokio
#[cfg(feature = "async")]
pub mod async_io {
    use super::*;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

    pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> io::Result<()> {
        writer.write_all(&frame.to_bytes()?).await?;
        writer.flush().await?;
        Ok(())
    }

    pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Frame> {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header).await?;

        let msg_type = u16::from_be_bytes([header[0], header[1]]);
        let len = u16::from_be_bytes([header[2], header[3]]) as usize;

        if len > MAX_FRAME_PAYLOAD {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "frame too large"));
        }

        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload).await?;

        Ok(Frame { msg_type, payload })
    }
}
