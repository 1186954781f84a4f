use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PackageId;
use crate::algebra::Cartographic;
use crate::scene::{NodeId, VisualInfo};

/// One timestamped change to an animated object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub time: DateTime<Utc>,
    pub package_id: PackageId,
    #[serde(flatten)]
    pub event: PackageEvent,
}

impl EventInfo {
    pub fn new(time: DateTime<Utc>, package_id: PackageId, event: PackageEvent) -> Self {
        Self {
            time,
            package_id,
            event,
        }
    }

    pub fn moved(time: DateTime<Utc>, package_id: PackageId, position: PackagePosition) -> Self {
        Self::new(
            time,
            package_id,
            PackageEvent::Moved {
                new_position: position,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "packageEventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageEvent {
    Created {
        package: PackageInfo,
    },
    InfoModified {
        package: PackageInfo,
    },
    Moved {
        #[serde(rename = "newPosition")]
        new_position: PackagePosition,
    },
    Destroyed,
}

/// Where an object is, as reported by a single event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackagePosition {
    /// Riding along with another object.
    ParentPackage {
        #[serde(rename = "parentPackageId")]
        parent_id: PackageId,
    },
    /// Resting at a site node.
    Site {
        #[serde(rename = "siteNodeId")]
        node_id: NodeId,
    },
    /// Travelling along the pipe between two site nodes; `progress` runs from 0 to 1.
    Pipe {
        #[serde(rename = "fromSiteNodeId")]
        from: NodeId,
        #[serde(rename = "toSiteNodeId")]
        to: NodeId,
        #[serde(rename = "interpolationAmount")]
        progress: f64,
    },
    Absolute {
        carto: Cartographic,
    },
}

/// Descriptive data carried by creation and info-modified events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visual: VisualInfo,
    #[serde(default)]
    pub custom_props: Value,
    /// Initial placement, applied at the creation time.
    #[serde(default)]
    pub position: Option<PackagePosition>,
}
