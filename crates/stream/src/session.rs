//! Subscription lifecycle: one active session id per stream kind.

use std::collections::BTreeMap;

use chrono::Utc;
use shoal_core::{SessionId, StreamKind};
use shoal_wire::Outbound;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// User-facing validation failure; surfaced before any network call and
    /// the triggering control reverts to its prior state.
    #[error("a start time is required when not following logs")]
    StartTimeRequired,
}

/// Parameters for a log subscription. Times are RFC3339 strings, already
/// formatted by the control layer.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub follow: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub clusters: Vec<String>,
}

/// Tracks the single active session id per stream kind so late or stale push
/// messages can be filtered. Changing a subscription never reuses an id:
/// it is always stop-then-start, which is what keeps messages from a
/// superseded filter set out of the new view.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    logs: Option<SessionId>,
    events: Option<SessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self, kind: StreamKind) -> Option<&SessionId> {
        match kind {
            StreamKind::Logs => self.logs.as_ref(),
            StreamKind::Events => self.events.as_ref(),
        }
    }

    /// Whether an inbound message tagged with `session_id` belongs to the
    /// currently active subscription for `kind`. Messages with no id are
    /// stale by definition.
    pub fn accepts(&self, kind: StreamKind, session_id: Option<&str>) -> bool {
        match (self.active(kind), session_id) {
            (Some(active), Some(id)) => active.as_str() == id,
            _ => false,
        }
    }

    /// Begin a log session: validate, mint a fresh id, and produce the
    /// subscription request to write to the push channel.
    pub fn start_logs(&mut self, filter: &LogFilter) -> Result<(SessionId, Outbound), StreamError> {
        if !filter.follow && filter.start_time.is_none() {
            return Err(StreamError::StartTimeRequired);
        }
        let id = fresh_id();
        self.logs = Some(id.clone());
        info!(session = %id, follow = filter.follow, clusters = filter.clusters.len(), "log session started");

        let mut cluster_map = BTreeMap::new();
        for c in &filter.clusters {
            cluster_map.insert(c.clone(), true);
        }
        // Follow mode has no upper bound; the end time is cleared.
        let end_time = if filter.follow {
            String::new()
        } else {
            filter.end_time.clone().unwrap_or_default()
        };
        let request = Outbound::Logs {
            session_id: Some(id.to_string()),
            follow: filter.follow,
            start_time: filter.start_time.clone().unwrap_or_default(),
            end_time,
            cluster_map,
        };
        Ok((id, request))
    }

    /// End the log session. The returned request carries a null id, which
    /// tells the server to tear down its side; anything still in flight with
    /// the old id fails the `accepts` check from now on.
    pub fn stop_logs(&mut self) -> Outbound {
        if let Some(id) = self.logs.take() {
            info!(session = %id, "log session stopped");
        }
        Outbound::Logs {
            session_id: None,
            follow: false,
            start_time: String::new(),
            end_time: String::new(),
            cluster_map: BTreeMap::new(),
        }
    }

    /// Replace the event subscription with a new cluster selection. A
    /// non-empty selection gets a fresh id; an empty one unsubscribes.
    pub fn select_event_clusters(&mut self, clusters: Vec<String>) -> Outbound {
        self.events = if clusters.is_empty() { None } else { Some(fresh_id()) };
        match &self.events {
            Some(id) => info!(session = %id, clusters = clusters.len(), "event session started"),
            None => info!("event session stopped"),
        }
        Outbound::ClustersEvents {
            clusters,
            session_id: self.events.as_ref().map(|s| s.as_str().to_string()),
        }
    }
}

/// Time component plus random component; collision probability negligible.
fn fresh_id() -> SessionId {
    let millis = Utc::now().timestamp_millis();
    SessionId::new(format!("{millis}{}", Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_most_one_active_id_per_kind() {
        let mut reg = SessionRegistry::new();
        let (first, _) = reg
            .start_logs(&LogFilter { follow: true, ..Default::default() })
            .expect("start");
        let (second, _) = reg
            .start_logs(&LogFilter { follow: true, ..Default::default() })
            .expect("restart");
        assert_ne!(first, second, "restart must mint a fresh id");
        assert!(reg.accepts(StreamKind::Logs, Some(second.as_str())));
        assert!(!reg.accepts(StreamKind::Logs, Some(first.as_str())));
    }

    #[test]
    fn non_follow_without_start_time_is_rejected_before_any_request() {
        let mut reg = SessionRegistry::new();
        let err = reg
            .start_logs(&LogFilter { follow: false, ..Default::default() })
            .expect_err("validation");
        assert_eq!(err, StreamError::StartTimeRequired);
        assert!(reg.active(StreamKind::Logs).is_none());
    }

    #[test]
    fn non_follow_with_start_time_carries_both_bounds() {
        let mut reg = SessionRegistry::new();
        let filter = LogFilter {
            follow: false,
            start_time: Some("2024-05-01T00:00:00Z".into()),
            end_time: Some("2024-05-02T00:00:00Z".into()),
            clusters: vec!["east".into()],
        };
        let (_, req) = reg.start_logs(&filter).expect("start");
        match req {
            Outbound::Logs { session_id, follow, start_time, end_time, cluster_map } => {
                assert!(session_id.is_some());
                assert!(!follow);
                assert_eq!(start_time, "2024-05-01T00:00:00Z");
                assert_eq!(end_time, "2024-05-02T00:00:00Z");
                assert_eq!(cluster_map.get("east"), Some(&true));
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn follow_mode_drops_the_end_bound() {
        let mut reg = SessionRegistry::new();
        let filter = LogFilter {
            follow: true,
            end_time: Some("2024-05-02T00:00:00Z".into()),
            ..Default::default()
        };
        let (_, req) = reg.start_logs(&filter).expect("start");
        match req {
            Outbound::Logs { end_time, .. } => assert!(end_time.is_empty()),
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn stop_sends_null_id_and_clears_state() {
        let mut reg = SessionRegistry::new();
        let _ = reg.start_logs(&LogFilter { follow: true, ..Default::default() });
        let req = reg.stop_logs();
        match req {
            Outbound::Logs { session_id, .. } => assert!(session_id.is_none()),
            other => panic!("wrong request: {other:?}"),
        }
        assert!(!reg.accepts(StreamKind::Logs, Some("anything")));
    }

    #[test]
    fn event_selection_changes_supersede_the_old_id() {
        let mut reg = SessionRegistry::new();
        let first = match reg.select_event_clusters(vec!["east".into()]) {
            Outbound::ClustersEvents { session_id, .. } => session_id.expect("id"),
            other => panic!("wrong request: {other:?}"),
        };
        let second = match reg.select_event_clusters(vec!["east".into(), "west".into()]) {
            Outbound::ClustersEvents { session_id, .. } => session_id.expect("id"),
            other => panic!("wrong request: {other:?}"),
        };
        assert_ne!(first, second);
        assert!(!reg.accepts(StreamKind::Events, Some(&first)));
        assert!(reg.accepts(StreamKind::Events, Some(&second)));
    }

    #[test]
    fn empty_selection_unsubscribes() {
        let mut reg = SessionRegistry::new();
        let _ = reg.select_event_clusters(vec!["east".into()]);
        match reg.select_event_clusters(Vec::new()) {
            Outbound::ClustersEvents { clusters, session_id } => {
                assert!(clusters.is_empty());
                assert!(session_id.is_none());
            }
            other => panic!("wrong request: {other:?}"),
        }
        assert!(reg.active(StreamKind::Events).is_none());
    }

    #[test]
    fn messages_without_an_id_are_never_accepted() {
        let mut reg = SessionRegistry::new();
        let _ = reg.start_logs(&LogFilter { follow: true, ..Default::default() });
        assert!(!reg.accepts(StreamKind::Logs, None));
    }
}
