//! Run-to-completion event loop around one registry
//!
//! Inbound events are queued and handled one at a time. Whatever the registry
//! dispatches while handling an event lands in the outbox and is only looked
//! at after the handler returned, so dispatch never nests into another
//! handler. Feeding mesh output back in (to this node or to peers) goes
//! through `post`, which is bounded.

use std::collections::VecDeque;

use log::*;

use bhumi_mcu::{AccessPolicy, Event};
use bhumi_proto::Status;

use crate::config::TrackerConfig;
use crate::inbound::Inbound;
use crate::tracker::{DEFAULT_CAPACITY, TrackedDevices};

/// One handled inbound event and what it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub inbound: Inbound,
    pub status: Option<Status>,
    pub events: Vec<Event>,
}

pub struct EventLoop<P, const N: usize = DEFAULT_CAPACITY> {
    tracker: TrackedDevices<P, VecDeque<Event>, N>,
    inbox: VecDeque<Inbound>,
    max_pending: usize,
    dropped: usize,
}

impl<P: AccessPolicy, const N: usize> EventLoop<P, N> {
    pub fn new(config: &TrackerConfig, policy: P) -> Self {
        Self {
            tracker: TrackedDevices::new(config, policy, VecDeque::new()),
            inbox: VecDeque::with_capacity(config.max_pending),
            max_pending: config.max_pending,
            dropped: 0,
        }
    }

    pub fn tracker(&self) -> &TrackedDevices<P, VecDeque<Event>, N> {
        &self.tracker
    }

    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// Events refused because the inbox was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Queue an event; returns false and drops it when the inbox is full
    pub fn post(&mut self, inbound: Inbound) -> bool {
        if self.inbox.len() >= self.max_pending {
            self.dropped += 1;
            warn!("Inbox full ({} pending), dropping {:?}", self.inbox.len(), inbound);
            return false;
        }
        self.inbox.push_back(inbound);
        true
    }

    /// Handle the oldest queued event
    pub fn step(&mut self) -> Option<Processed> {
        let inbound = self.inbox.pop_front()?;
        let status = self.tracker.handle_event(&inbound);
        let events = self.tracker.sink_mut().drain(..).collect();
        Some(Processed { inbound, status, events })
    }

    /// Handle at most `budget` queued events
    pub fn run(&mut self, budget: usize) -> Vec<Processed> {
        let mut processed = Vec::new();
        while processed.len() < budget {
            let Some(item) = self.step() else { break };
            processed.push(item);
        }
        processed
    }
}

/// Inbound event another node receives when `event` is sent over the mesh
pub fn mesh_delivery(event: &Event) -> Option<Inbound> {
    match event {
        Event::RegisterToMesh(packet) => Some(Inbound::MeshRegister(packet.clone())),
        Event::TokenToMesh(packet) => Some(Inbound::MeshToken(packet.clone())),
        // consumed by the behaviour layer, not by the registry
        Event::LocationToMesh(_) => None,
        Event::ProfileLocation(_) => None,
    }
}
