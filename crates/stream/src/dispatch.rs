//! The dispatcher: session gatekeeping, queue/index feeding, and tile
//! derivation. All state lives on one logical task; inbound messages and
//! timer expiries are handed in by the driver loop.

use std::time::Instant;

use rustc_hash::FxHashMap;
use shoal_core::status::{color_of, overall_color, sort_by_severity};
use shoal_core::{ClusterEvent, Condition, LogLine, SessionId, StreamKind};
use shoal_search::{Hit, Index, STREAM_MIN_QUERY};
use shoal_wire::{Inbound, Outbound};
use tracing::debug;

use crate::batch::{BatchQueue, FanoutQueue, EVENT_BATCH_INTERVAL, LOG_BATCH_INTERVAL};
use crate::ops::{ClusterTile, RenderOp, TileCondition, TILE_CONDITION_LIMIT};
use crate::session::{LogFilter, SessionRegistry, StreamError};
use crate::viewport::Viewport;

pub struct Dispatcher {
    registry: SessionRegistry,
    log_queue: BatchQueue<LogLine>,
    event_queue: FanoutQueue<ClusterEvent>,
    log_view: Viewport,
    event_views: FxHashMap<String, Viewport>,
    logs_index: Index<String>,
    events_index: Index<ClusterEvent>,
    roster: Vec<String>,
    event_selection: Vec<String>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
            log_queue: BatchQueue::new(LOG_BATCH_INTERVAL),
            event_queue: FanoutQueue::new(EVENT_BATCH_INTERVAL),
            log_view: Viewport::new(true),
            event_views: FxHashMap::default(),
            logs_index: Index::new(STREAM_MIN_QUERY),
            events_index: Index::new(STREAM_MIN_QUERY),
            roster: Vec::new(),
            event_selection: Vec::new(),
        }
    }

    // ---- subscription controls -------------------------------------------

    /// Enable the log stream. On validation failure nothing is sent and no
    /// ops are produced; the caller reverts the control and notifies.
    ///
    /// Enabling while already active is stop-then-start: the pending batch,
    /// the index, and the viewport all belong to the superseded session.
    pub fn enable_logs(
        &mut self,
        filter: &LogFilter,
    ) -> Result<(Vec<RenderOp>, Outbound), StreamError> {
        let (_id, request) = self.registry.start_logs(filter)?;
        self.log_queue.cancel();
        self.logs_index.clear();
        self.log_view = Viewport::new(true);
        Ok((vec![RenderOp::ClearLogs], request))
    }

    /// Disable the log stream: teardown request, pending batch discarded,
    /// index reset, panel cleared.
    pub fn disable_logs(&mut self) -> (Vec<RenderOp>, Outbound) {
        let request = self.registry.stop_logs();
        self.log_queue.cancel();
        self.logs_index.clear();
        self.log_view.reset();
        (vec![RenderOp::ClearLogs], request)
    }

    /// Replace the event cluster selection. Always stop-then-start: pending
    /// batches and the index belong to the superseded session and go away;
    /// panels of deselected clusters are removed.
    pub fn select_event_clusters(
        &mut self,
        clusters: Vec<String>,
    ) -> (Vec<RenderOp>, Outbound) {
        let mut ops = Vec::new();
        if clusters.is_empty() {
            self.event_views.clear();
            ops.push(RenderOp::ClearEvents);
        } else {
            for old in &self.event_selection {
                if !clusters.contains(old) {
                    self.event_views.remove(old);
                    ops.push(RenderOp::RemoveEventPanel { cluster_name: old.clone() });
                }
            }
        }
        self.event_queue.cancel();
        self.events_index.clear();
        self.event_selection = clusters.clone();
        let request = self.registry.select_event_clusters(clusters);
        (ops, request)
    }

    pub fn active_session(&self, kind: StreamKind) -> Option<&SessionId> {
        self.registry.active(kind)
    }

    // ---- inbound ----------------------------------------------------------

    /// Route one push message. Stale stream messages are dropped silently;
    /// that race is expected during subscription changeover.
    pub fn handle(&mut self, msg: Inbound, now: Instant) -> Vec<RenderOp> {
        match msg {
            Inbound::Clusters { clusters } => {
                self.roster = clusters.clone();
                vec![RenderOp::SetClusterRoster(clusters)]
            }
            Inbound::ClusterConditions { conditions } => {
                let tiles = conditions
                    .into_iter()
                    .map(|(name, conds)| build_tile(name, conds))
                    .collect();
                vec![RenderOp::SetTiles(tiles)]
            }
            Inbound::Event { session_id, event } | Inbound::Cachedevent { session_id, event } => {
                if self.registry.accepts(StreamKind::Events, session_id.as_deref()) {
                    let key = event.cluster_name.clone();
                    self.events_index.add(event.clone());
                    self.event_queue.push(&key, event, now);
                } else {
                    metrics::counter!("stream_stale_dropped_total", 1u64);
                    debug!(kind = "event", "dropping message from superseded session");
                }
                Vec::new()
            }
            Inbound::Log { session_id, message } => {
                if self.registry.accepts(StreamKind::Logs, session_id.as_deref()) {
                    self.logs_index.add(message.clone());
                    self.log_queue.push(LogLine { message }, now);
                } else {
                    metrics::counter!("stream_stale_dropped_total", 1u64);
                    debug!(kind = "log", "dropping message from superseded session");
                }
                Vec::new()
            }
        }
    }

    // ---- timers -----------------------------------------------------------

    /// The earliest armed flush deadline across all queues, for the driver's
    /// sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.log_queue.next_deadline(), self.event_queue.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Flush every queue whose deadline has passed, producing at most one
    /// append (and one scroll adjustment) per panel.
    pub fn flush_due(&mut self, now: Instant) -> Vec<RenderOp> {
        let mut ops = Vec::new();
        if let Some(lines) = self.log_queue.take_due(now) {
            let scroll = self.log_view.after_flush(lines.len());
            ops.push(RenderOp::AppendLogs { lines, scroll });
        }
        if let Some(batches) = self.event_queue.take_due(now) {
            for (cluster_name, events) in batches {
                let vp = self
                    .event_views
                    .entry(cluster_name.clone())
                    .or_insert_with(|| Viewport::new(true));
                let scroll = vp.after_flush(events.len());
                ops.push(RenderOp::AppendEvents { cluster_name, events, scroll });
            }
        }
        ops
    }

    // ---- viewport controls ------------------------------------------------

    pub fn record_log_scroll(&mut self, offset: f32) {
        self.log_view.record_scroll(offset);
    }

    pub fn set_log_follow(&mut self, on: bool) {
        self.log_view.set_follow(on);
    }

    pub fn record_event_scroll(&mut self, cluster: &str, offset: f32) {
        if let Some(vp) = self.event_views.get_mut(cluster) {
            vp.record_scroll(offset);
        }
    }

    pub fn set_event_follow(&mut self, cluster: &str, on: bool) {
        self.event_views
            .entry(cluster.to_string())
            .or_insert_with(|| Viewport::new(true))
            .set_follow(on);
    }

    // ---- search -----------------------------------------------------------

    pub fn search_logs(&self, query: &str, limit: usize) -> Option<Vec<Hit>> {
        self.logs_index.query(query, limit)
    }

    pub fn search_events(&self, query: &str, limit: usize) -> Option<Vec<Hit>> {
        self.events_index.query(query, limit)
    }

    pub fn logs_index(&self) -> &Index<String> {
        &self.logs_index
    }

    pub fn events_index(&self) -> &Index<ClusterEvent> {
        &self.events_index
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn build_tile(cluster_name: String, mut conditions: Vec<Condition>) -> ClusterTile {
    let color = overall_color(&conditions);
    sort_by_severity(&mut conditions);
    conditions.truncate(TILE_CONDITION_LIMIT);
    let detail_path = format!("/cluster/{cluster_name}");
    ClusterTile {
        cluster_name,
        color,
        conditions: conditions
            .into_iter()
            .map(|c| TileCondition {
                color: color_of(c.status, &c.type_),
                type_: c.type_,
                status: c.status,
            })
            .collect(),
        detail_path,
    }
}
