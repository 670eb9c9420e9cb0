//! Outbound Events
//!
//! Everything the tracked-device registry emits goes through an `EventSink`:
//! messages for the mesh and events for the local behaviour engine.

use std::collections::VecDeque;

use bhumi_proto::{Frame, MeshProfileLocation, MeshRegister, MeshToken, ProfileLocation};

/// Event emitted by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Registration without token, for other nodes in the mesh
    RegisterToMesh(MeshRegister),
    /// Token and TTL, replicated as a separate unit
    TokenToMesh(MeshToken),
    /// Profile/location pair, re-broadcast after a mesh registration
    LocationToMesh(MeshProfileLocation),
    /// Local behaviour trigger, never sent to the mesh
    ProfileLocation(ProfileLocation),
}

impl Event {
    /// Whether this event is meant for the mesh transport
    pub fn is_mesh(&self) -> bool {
        !matches!(self, Event::ProfileLocation(_))
    }

    /// Wire frame for mesh events
    pub fn to_frame(&self) -> Option<Frame> {
        match self {
            Event::RegisterToMesh(packet) => Some(Frame::mesh_register(packet)),
            Event::TokenToMesh(packet) => Some(Frame::mesh_token(packet)),
            Event::LocationToMesh(packet) => Some(Frame::mesh_profile_location(packet)),
            Event::ProfileLocation(_) => None,
        }
    }
}

/// Fire-and-forget event dispatch
///
/// Implementations must not call back into the registry synchronously; queue
/// the event and handle it on the next turn of the event loop instead.
pub trait EventSink {
    fn dispatch(&mut self, event: Event);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn dispatch(&mut self, event: Event) {
        (**self).dispatch(event)
    }
}

impl EventSink for Vec<Event> {
    fn dispatch(&mut self, event: Event) {
        self.push(event);
    }
}

impl EventSink for VecDeque<Event> {
    fn dispatch(&mut self, event: Event) {
        self.push_back(event);
    }
}

/// Sink that drops everything, for nodes without a mesh
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn dispatch(&mut self, _event: Event) {}
}
