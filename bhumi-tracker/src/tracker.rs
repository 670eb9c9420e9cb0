//! Tracked device registry: local commands, mesh replication and sightings

use log::*;

use bhumi_mcu::{AccessPolicy, Event, EventSink};
use bhumi_proto::{MeshRegister, MeshToken, ProfileLocation, RegisterTrackedDevice, Sighting, Status};

use crate::config::TrackerConfig;
use crate::decay::{self, DecayDriver};
use crate::entry::TrackedDevice;
use crate::error::TrackerError;
use crate::gate;
use crate::inbound::Inbound;
use crate::store::EntryStore;

/// Default number of devices a node keeps track of
pub const DEFAULT_CAPACITY: usize = 20;

/// The registry of one node
///
/// Three paths write to it with different authority:
/// - local register/update commands, fully checked and replicated to the mesh
/// - mesh messages, trusted (the sender already checked access) except for
///   token collisions
/// - background sightings, which never write and only trigger local events
pub struct TrackedDevices<P, S, const N: usize = DEFAULT_CAPACITY> {
    store: EntryStore<N>,
    policy: P,
    sink: S,
    decay: DecayDriver,
}

impl<P: AccessPolicy, S: EventSink, const N: usize> TrackedDevices<P, S, N> {
    pub fn new(config: &TrackerConfig, policy: P, sink: S) -> Self {
        Self {
            store: EntryStore::new(),
            policy,
            sink,
            decay: DecayDriver::new(config.ticks_per_minute()),
        }
    }

    pub fn store(&self) -> &EntryStore<N> {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn find(&self, device_id: bhumi_proto::DeviceId) -> Option<&TrackedDevice> {
        self.store.find(device_id)
    }

    /// Route an inbound event; commands return their status
    pub fn handle_event(&mut self, event: &Inbound) -> Option<Status> {
        match event {
            Inbound::Register(packet) => Some(status_of(self.register(packet))),
            Inbound::Update(packet) => Some(status_of(self.update(packet))),
            Inbound::MeshRegister(packet) => {
                self.on_mesh_register(packet);
                None
            }
            Inbound::MeshToken(packet) => {
                self.on_mesh_token(packet);
                None
            }
            Inbound::Sighting(packet) => {
                self.on_sighting(packet);
                None
            }
            Inbound::Tick => {
                self.on_tick();
                None
            }
        }
    }

    /// Register a device on behalf of a local user
    ///
    /// Nothing is written unless all checks pass. On success the registration
    /// and the token go out to the mesh as two separate messages.
    pub fn register(&mut self, packet: &RegisterTrackedDevice) -> Result<(), TrackerError> {
        let slot = self.store.find_or_add(packet.device_id).inspect_err(|e| {
            warn!("Register of device {} failed: {e}", packet.device_id);
        })?;

        self.check_register(slot, packet).inspect_err(|e| {
            warn!("Register of device {} refused: {e}", packet.device_id);
        })?;

        let device = self
            .store
            .get_mut(slot)
            .ok_or(TrackerError::CapacityExhausted)?;
        device.set_access_level(packet.access_level);
        device.set_location(packet.location_id);
        device.set_profile(packet.profile_id);
        device.set_rssi_offset(packet.rssi_offset);
        device.set_flags(packet.flags);
        device.set_device_token(packet.device_token);
        device.set_ttl(packet.ttl_minutes);

        let (register, token) = (device.mesh_register(), device.mesh_token());
        info!(
            "Registered device {} (profile {}, location {}, ttl {} min)",
            packet.device_id, packet.profile_id, packet.location_id, packet.ttl_minutes
        );

        self.sink.dispatch(Event::RegisterToMesh(register));
        self.sink.dispatch(Event::TokenToMesh(token));
        Ok(())
    }

    /// Same as `register`
    pub fn update(&mut self, packet: &RegisterTrackedDevice) -> Result<(), TrackerError> {
        self.register(packet)
    }

    fn check_register(&self, slot: usize, packet: &RegisterTrackedDevice) -> Result<(), TrackerError> {
        let device = self.store.get(slot).ok_or(TrackerError::CapacityExhausted)?;
        if !gate::has_access(&self.policy, device, packet.access_level) {
            return Err(TrackerError::AccessDenied {
                existing: device.access_level(),
                requested: packet.access_level,
            });
        }
        if let Some(owner) = gate::token_conflict(&self.store, device, &packet.device_token) {
            return Err(TrackerError::TokenConflict { owner });
        }
        Ok(())
    }

    /// Registration replicated by another node, which already checked access
    pub fn on_mesh_register(&mut self, packet: &MeshRegister) {
        let device = match self.store.find_or_add(packet.device_id) {
            Ok(slot) => self.store.get_mut(slot),
            Err(e) => {
                warn!("Dropped mesh register of device {}: {e}", packet.device_id);
                return;
            }
        };
        let Some(device) = device else { return };

        device.set_location(packet.location_id);
        device.set_profile(packet.profile_id);
        device.set_rssi_offset(packet.rssi_offset);
        device.set_flags(packet.flags);
        device.set_access_level(packet.access_level);

        debug!(
            "Mesh register of device {} (profile {}, location {})",
            packet.device_id, packet.profile_id, packet.location_id
        );
        let location = device.mesh_profile_location();
        self.sink.dispatch(Event::LocationToMesh(location));
    }

    /// Token replicated by another node; collisions are still refused
    pub fn on_mesh_token(&mut self, packet: &MeshToken) {
        let slot = match self.store.find_or_add(packet.device_id) {
            Ok(slot) => slot,
            Err(e) => {
                warn!("Dropped mesh token of device {}: {e}", packet.device_id);
                return;
            }
        };

        let conflict = self
            .store
            .get(slot)
            .and_then(|device| gate::token_conflict(&self.store, device, &packet.device_token));
        if let Some(owner) = conflict {
            warn!(
                "Dropped mesh token of device {}: token held by device {owner}",
                packet.device_id
            );
            return;
        }

        if let Some(device) = self.store.get_mut(slot) {
            device.set_device_token(packet.device_token);
            device.set_ttl(packet.ttl_minutes);
            debug!(
                "Mesh token of device {} (ttl {} min)",
                packet.device_id, packet.ttl_minutes
            );
        }
    }

    /// A background advertisement carrying a token was received
    pub fn on_sighting(&mut self, packet: &Sighting) {
        let Some(device) = self.store.find_by_token(&packet.device_token) else {
            return;
        };
        if !device.is_complete() || device.ignore_for_behaviour() || !device.is_valid_ttl() {
            return;
        }

        debug!(
            "Sighted device {}: profile {} at location {}",
            device.device_id(),
            device.profile_id(),
            device.location_id()
        );
        let event = ProfileLocation {
            profile_id: device.profile_id(),
            location_id: device.location_id(),
            from_mesh: false,
        };
        self.sink.dispatch(Event::ProfileLocation(event));
    }

    /// Periodic tick; returns true when TTLs were decreased
    pub fn on_tick(&mut self) -> bool {
        if !self.decay.on_tick() {
            return false;
        }
        decay::decrease_ttl(&mut self.store);
        true
    }
}

fn status_of(result: Result<(), TrackerError>) -> Status {
    match result {
        Ok(()) => Status::Success,
        Err(e) => e.status(),
    }
}
