//! Bhumi Tracker - tracked-device registry for mesh-networked nodes
//!
//! Keeps a bounded set of tracked devices (phones, tags) identified by the
//! token they advertise, replicates registrations over the mesh and turns
//! sightings of registered tokens into local "profile at location" events.
//!
//! Collaborators come from `bhumi-mcu`: an `AccessPolicy` decides who may
//! overwrite a registration, an `EventSink` carries everything the registry
//! emits.

mod config;
mod decay;
mod entry;
mod error;
mod event_loop;
pub mod gate;
mod inbound;
mod store;
mod tracker;

pub use config::TrackerConfig;
pub use decay::DecayDriver;
pub use entry::{FieldsSet, TrackedDevice};
pub use error::{ConfigError, TrackerError};
pub use event_loop::{EventLoop, Processed, mesh_delivery};
pub use inbound::Inbound;
pub use store::EntryStore;
pub use tracker::{DEFAULT_CAPACITY, TrackedDevices};

// Re-export commonly used types
pub use bhumi_mcu::{AccessLevel, AccessPolicy, Event, EventSink, NullSink, RankedAccessPolicy};
pub use bhumi_proto::{
    DeviceId, DeviceToken, FLAG_IGNORE_FOR_BEHAVIOUR, MeshProfileLocation, MeshRegister, MeshToken, ProfileLocation,
    RegisterTrackedDevice, Sighting, Status,
};
