//! Inbound events
//!
//! Everything the registry reacts to, decoded from wire frames or read from
//! JSON scripts. Ticks come from a local timer and never travel as frames.

use std::io;

use serde::{Deserialize, Serialize};

use bhumi_proto::{
    Frame, MSG_BACKGROUND_SIGHTING, MSG_MESH_TRACKED_DEVICE_REGISTER, MSG_MESH_TRACKED_DEVICE_TOKEN,
    MSG_REGISTER_TRACKED_DEVICE, MSG_UPDATE_TRACKED_DEVICE, MeshRegister, MeshToken,
    RegisterTrackedDevice, Sighting,
};

/// Everything the registry reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    Register(RegisterTrackedDevice),
    Update(RegisterTrackedDevice),
    MeshRegister(MeshRegister),
    MeshToken(MeshToken),
    Sighting(Sighting),
    Tick,
}

impl Inbound {
    /// Decode a received frame. Ticks are local and have no frame.
    pub fn from_frame(frame: &Frame) -> io::Result<Self> {
        let payload = &frame.payload;
        match frame.msg_type {
            MSG_REGISTER_TRACKED_DEVICE => {
                Ok(Inbound::Register(RegisterTrackedDevice::from_bytes(payload)?))
            }
            MSG_UPDATE_TRACKED_DEVICE => {
                Ok(Inbound::Update(RegisterTrackedDevice::from_bytes(payload)?))
            }
            MSG_MESH_TRACKED_DEVICE_REGISTER => {
                Ok(Inbound::MeshRegister(MeshRegister::from_bytes(payload)?))
            }
            MSG_MESH_TRACKED_DEVICE_TOKEN => Ok(Inbound::MeshToken(MeshToken::from_bytes(payload)?)),
            MSG_BACKGROUND_SIGHTING => Ok(Inbound::Sighting(Sighting::from_bytes(payload)?)),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected msg_type {other:#06x}"),
            )),
        }
    }

    pub fn to_frame(&self) -> Option<Frame> {
        match self {
            Inbound::Register(packet) => Some(Frame::register(packet)),
            Inbound::Update(packet) => Some(Frame::update(packet)),
            Inbound::MeshRegister(packet) => Some(Frame::mesh_register(packet)),
            Inbound::MeshToken(packet) => Some(Frame::mesh_token(packet)),
            Inbound::Sighting(packet) => Some(Frame::sighting(packet)),
            Inbound::Tick => None,
        }
    }

    /// Commands expect a status reply, everything else is fire-and-forget
    pub fn is_command(&self) -> bool {
        matches!(self, Inbound::Register(_) | Inbound::Update(_))
    }
}
