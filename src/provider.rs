//! Source of node trees and events.
//!
//! Fetching data is the provider's business; the visualizer only calls these
//! methods while binding and then drains the event channel it handed over.

use std::collections::HashMap;
use std::sync::mpsc::Sender;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::scene::{NodeId, SpatialNodeInfo};
use crate::trajectory::EventInfo;

/// Dataset-wide facts needed before any event is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfo {
    pub root_node_id: NodeId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

pub trait DataProvider {
    fn meta(&self) -> Result<MetaInfo>;

    /// The tree rooted at `root`, children included.
    fn spatial_subtree(&self, root: NodeId) -> Result<SpatialNodeInfo>;

    /// Starts delivering events into `sink` until [`unsubscribe`](Self::unsubscribe).
    fn subscribe(&mut self, sink: Sender<EventInfo>) -> SubscriptionToken;

    fn unsubscribe(&mut self, token: SubscriptionToken);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dataset {
    meta: MetaInfo,
    root: SpatialNodeInfo,
    #[serde(default)]
    events: Vec<EventInfo>,
}

/// A provider backed by an in-memory dataset.
///
/// New subscribers first receive every recorded event, then anything passed to
/// [`publish`](Self::publish).
#[derive(Debug)]
pub struct StaticDataProvider {
    meta: MetaInfo,
    root: SpatialNodeInfo,
    events: Vec<EventInfo>,
    subscribers: HashMap<SubscriptionToken, Sender<EventInfo>>,
    next_token: u64,
}

impl StaticDataProvider {
    pub fn new(meta: MetaInfo, root: SpatialNodeInfo, events: Vec<EventInfo>) -> Self {
        Self {
            meta,
            root,
            events,
            subscribers: HashMap::new(),
            next_token: 0,
        }
    }

    /// Parses `{ "meta": ..., "root": ..., "events": [...] }`.
    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(json)?;
        Ok(Self::new(dataset.meta, dataset.root, dataset.events))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Records `event` and forwards it to every live subscriber.
    pub fn publish(&mut self, event: EventInfo) {
        self.subscribers
            .retain(|token, sink| match sink.send(event.clone()) {
                Ok(()) => true,
                Err(_) => {
                    debug!(token = token.0, "subscriber hung up, dropping it");
                    false
                }
            });
        self.events.push(event);
    }
}

impl DataProvider for StaticDataProvider {
    fn meta(&self) -> Result<MetaInfo> {
        Ok(self.meta.clone())
    }

    fn spatial_subtree(&self, root: NodeId) -> Result<SpatialNodeInfo> {
        find_node(&self.root, root)
            .cloned()
            .ok_or(Error::UnknownNode(root))
    }

    fn subscribe(&mut self, sink: Sender<EventInfo>) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;

        let delivered = self
            .events
            .iter()
            .try_for_each(|event| sink.send(event.clone()));
        if delivered.is_ok() {
            self.subscribers.insert(token, sink);
        }
        token
    }

    fn unsubscribe(&mut self, token: SubscriptionToken) {
        self.subscribers.remove(&token);
    }
}

fn find_node(node: &SpatialNodeInfo, id: NodeId) -> Option<&SpatialNodeInfo> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter().find_map(|child| find_node(child, id))
}
