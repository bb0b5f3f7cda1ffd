//! Shoal push-channel protocol.
//!
//! One JSON object per frame, discriminated by a required `type` tag. The
//! dispatch that used to be duck-typed lives here as an exhaustive sum type;
//! unrecognized tags are reported to the caller instead of vanishing.

#![forbid(unsafe_code)]

pub mod client;
pub use client::{connect, PushChannel};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shoal_core::{ClusterEvent, Condition};

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("message has no type tag")]
    MissingType,
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("connect: {0}")]
    Connect(String),
}

/// Inbound push messages as consumed by the dashboard.
///
/// `cachedevent` is the server replaying events cached before the
/// subscription started; consumers treat it exactly like `event`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inbound {
    Clusters {
        clusters: Vec<String>,
    },
    /// Condition snapshot keyed by cluster name. The server serializes the
    /// map with sorted keys, so tiles render in alphabetical cluster order.
    ClusterConditions {
        conditions: BTreeMap<String, Vec<Condition>>,
    },
    #[serde(rename_all = "camelCase")]
    Event {
        #[serde(default)]
        session_id: Option<String>,
        #[serde(flatten)]
        event: ClusterEvent,
    },
    #[serde(rename_all = "camelCase")]
    Cachedevent {
        #[serde(default)]
        session_id: Option<String>,
        #[serde(flatten)]
        event: ClusterEvent,
    },
    #[serde(rename_all = "camelCase")]
    Log {
        #[serde(default)]
        session_id: Option<String>,
        message: String,
    },
}

/// Outbound subscription-change requests. Fire-and-forget: there is no ack
/// and no retry; a failed write just leaves the subscription unestablished.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    /// `session_id: None` signals server-side teardown of the log stream.
    #[serde(rename_all = "camelCase")]
    Logs {
        session_id: Option<String>,
        follow: bool,
        start_time: String,
        end_time: String,
        cluster_map: BTreeMap<String, bool>,
    },
    /// `session_id: None` or an empty cluster list signals unsubscribe.
    #[serde(rename = "clustersevents", rename_all = "camelCase")]
    ClustersEvents {
        clusters: Vec<String>,
        session_id: Option<String>,
    },
}

/// Decode one inbound frame, surfacing unknown tags explicitly so the
/// transport can log them (forward compatibility without silent drops).
pub fn decode_inbound(text: &str) -> Result<Inbound, WireError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let tag = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(WireError::MissingType)?;
    match tag {
        "clusters" | "clusterConditions" | "event" | "cachedevent" | "log" => {
            Ok(serde_json::from_value(value)?)
        }
        other => Err(WireError::UnknownType(other.to_string())),
    }
}

pub fn encode_outbound(msg: &Outbound) -> Result<String, WireError> {
    Ok(serde_json::to_string(msg)?)
}
