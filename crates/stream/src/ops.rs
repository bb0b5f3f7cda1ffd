//! Renderer-agnostic output of the pipeline. The view layer (terminal, GUI,
//! DOM) applies these ops; nothing below it knows how rendering works.

use serde::Serialize;
use shoal_core::status::TileColor;
use shoal_core::{ClusterEvent, ConditionStatus, LogLine};

use crate::viewport::Scroll;

/// At most this many conditions are shown on a dashboard tile.
pub const TILE_CONDITION_LIMIT: usize = 5;

/// One condition row on a tile, already colorized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub color: TileColor,
}

/// A dashboard tile for one cluster: overall color plus the worst-first
/// condition list, truncated to the most important entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterTile {
    pub cluster_name: String,
    pub color: TileColor,
    pub conditions: Vec<TileCondition>,
    /// Opaque drill-down target opened in a new tab on click.
    pub detail_path: String,
}

/// Instructions for the view, in apply order.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    /// Full roster replacement for the cluster selection controls.
    SetClusterRoster(Vec<String>),
    /// Full tile replacement derived from a conditions snapshot.
    SetTiles(Vec<ClusterTile>),
    AppendLogs { lines: Vec<LogLine>, scroll: Scroll },
    ClearLogs,
    AppendEvents { cluster_name: String, events: Vec<ClusterEvent>, scroll: Scroll },
    /// A cluster left the event selection; its panel goes away.
    RemoveEventPanel { cluster_name: String },
    ClearEvents,
}
