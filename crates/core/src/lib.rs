//! Shoal core types: stream identities and the cluster data model.

#![forbid(unsafe_code)]

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub mod status;

/// The two session-scoped stream kinds served over the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Logs,
    Events,
}

/// Opaque subscription identifier. Generated from a millisecond timestamp
/// plus a random component so a superseded subscription can never collide
/// with its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One log line as pushed by the backend. Append-only, ordered by arrival,
/// no identity beyond position; duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub message: String,
}

/// One Kubernetes-style event for a cluster. Events are grouped per cluster
/// and appended in arrival order; there is no de-duplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterEvent {
    pub cluster_name: String,
    pub kind: String,
    pub object_name: String,
    pub message: String,
}

/// A cluster condition, keyed by `(cluster, type)`. Conditions always arrive
/// as a full replacement snapshot per cluster; the client re-derives sorted
/// views instead of patching incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub last_update_time: Option<String>,
}

/// Condition status as serialized by the backend. Anything outside the three
/// canonical values colorizes to grey, so unknown strings map to `Other`
/// instead of failing the whole conditions snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
    Other,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown | ConditionStatus::Other => "Unknown",
        }
    }
}

impl From<&str> for ConditionStatus {
    fn from(s: &str) -> Self {
        match s {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            "Unknown" => ConditionStatus::Unknown,
            _ => ConditionStatus::Other,
        }
    }
}

impl Serialize for ConditionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConditionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl de::Visitor<'_> for V {
            type Value = ConditionStatus;
            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a condition status string")
            }
            fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
                Ok(ConditionStatus::from(s))
            }
        }
        deserializer.deserialize_str(V)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_decodes_wire_shape() {
        let raw = r#"{
            "type": "Available",
            "status": "True",
            "reason": "Healthy",
            "message": "all nodes up",
            "lastTransitionTime": "2024-01-01T00:00:00Z"
        }"#;
        let c: Condition = serde_json::from_str(raw).expect("decode");
        assert_eq!(c.type_, "Available");
        assert_eq!(c.status, ConditionStatus::True);
        assert_eq!(c.last_transition_time.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert!(c.last_update_time.is_none());
    }

    #[test]
    fn unexpected_status_string_maps_to_other() {
        let c: Condition =
            serde_json::from_str(r#"{"type":"Available","status":"Degraded"}"#).expect("decode");
        assert_eq!(c.status, ConditionStatus::Other);
    }

    #[test]
    fn cluster_event_uses_camel_case_keys() {
        let raw = r#"{"clusterName":"east","kind":"Pod","objectName":"db-0","message":"Started"}"#;
        let e: ClusterEvent = serde_json::from_str(raw).expect("decode");
        assert_eq!(e.cluster_name, "east");
        assert_eq!(e.object_name, "db-0");
    }
}
