//! Event scripts and the simulated mesh they run against

use std::path::Path;

use anyhow::Context;
use log::*;
use serde::Deserialize;

use bhumi_tracker::{EventLoop, Inbound, Processed, RankedAccessPolicy, TrackerConfig, mesh_delivery};

fn one() -> u32 {
    1
}

/// One script line: deliver `event` to `node`, `repeat` times
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub node: usize,
    pub event: Inbound,
    #[serde(default = "one")]
    pub repeat: u32,
}

pub fn load(path: &Path) -> anyhow::Result<Vec<Step>> {
    let data = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let steps = serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(steps)
}

/// A handled event together with the node it ran on
pub struct Outcome {
    pub node: usize,
    pub processed: Processed,
}

/// Nodes that broadcast their mesh output to every other node
pub struct Mesh {
    nodes: Vec<EventLoop<RankedAccessPolicy>>,
    budget: usize,
}

impl Mesh {
    pub fn new(config: &TrackerConfig, nodes: usize, budget: usize) -> Self {
        Self {
            nodes: (0..nodes).map(|_| EventLoop::new(config, RankedAccessPolicy)).collect(),
            budget,
        }
    }

    pub fn nodes(&self) -> &[EventLoop<RankedAccessPolicy>] {
        &self.nodes
    }

    pub fn post(&mut self, node: usize, event: &Inbound) -> anyhow::Result<()> {
        let count = self.nodes.len();
        let target = self
            .nodes
            .get_mut(node)
            .with_context(|| format!("node {} does not exist ({} nodes)", node, count))?;
        target.post(event.clone());
        Ok(())
    }

    /// Deliver a step, settling the mesh after every repetition
    pub fn play(&mut self, step: &Step) -> anyhow::Result<Vec<Outcome>> {
        let mut outcomes = Vec::new();
        for _ in 0..step.repeat {
            self.post(step.node, &step.event)?;
            outcomes.extend(self.settle());
        }
        Ok(outcomes)
    }

    /// Run every node until all inboxes are empty or the budget is spent
    pub fn settle(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        loop {
            let mut progressed = false;
            for idx in 0..self.nodes.len() {
                if outcomes.len() >= self.budget {
                    let pending: usize = self.nodes.iter().map(|n| n.pending()).sum();
                    if pending > 0 {
                        warn!("Step budget of {} spent, {} events left queued", self.budget, pending);
                    }
                    return outcomes;
                }
                let Some(processed) = self.nodes[idx].step() else { continue };
                progressed = true;
                self.broadcast(idx, &processed);
                outcomes.push(Outcome { node: idx, processed });
            }
            if !progressed {
                return outcomes;
            }
        }
    }

    fn broadcast(&mut self, from: usize, processed: &Processed) {
        for inbound in processed.events.iter().filter_map(mesh_delivery) {
            for (peer, node) in self.nodes.iter_mut().enumerate() {
                if peer != from {
                    debug!("node {} -> node {}: {:?}", from, peer, inbound);
                    node.post(inbound.clone());
                }
            }
        }
    }
}
