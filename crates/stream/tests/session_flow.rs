//! End-to-end subscription flows through the dispatcher, driven with
//! injected clocks so no runtime is needed.

use std::time::Instant;

use shoal_core::StreamKind;
use shoal_stream::{
    Dispatcher, LogFilter, RenderOp, Scroll, StreamError, EVENT_BATCH_INTERVAL,
    LOG_BATCH_INTERVAL,
};
use shoal_wire::{Inbound, Outbound};

fn follow_filter(clusters: &[&str]) -> LogFilter {
    LogFilter {
        follow: true,
        start_time: None,
        end_time: None,
        clusters: clusters.iter().map(|c| c.to_string()).collect(),
    }
}

fn log(session_id: &str, message: &str) -> Inbound {
    Inbound::Log {
        session_id: Some(session_id.to_string()),
        message: message.to_string(),
    }
}

#[test]
fn follow_logs_from_enable_to_disable() {
    let t0 = Instant::now();
    let mut d = Dispatcher::new();

    let (ops, request) = d.enable_logs(&follow_filter(&["east"])).expect("enable");
    assert_eq!(ops, vec![RenderOp::ClearLogs]);
    let sid = match request {
        Outbound::Logs { session_id, follow, end_time, cluster_map, .. } => {
            assert!(follow);
            assert!(end_time.is_empty(), "follow mode carries no end time");
            assert_eq!(cluster_map.get("east"), Some(&true));
            session_id.expect("fresh id")
        }
        other => panic!("wrong request: {other:?}"),
    };

    // Lines arriving inside one interval are coalesced into a single append.
    for i in 0..3 {
        let ops = d.handle(log(&sid, &format!("line {i}")), t0);
        assert!(ops.is_empty(), "ingest never renders directly");
    }
    assert!(d.flush_due(t0).is_empty(), "deadline not yet reached");

    let ops = d.flush_due(t0 + LOG_BATCH_INTERVAL);
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        RenderOp::AppendLogs { lines, scroll } => {
            let texts: Vec<&str> = lines.iter().map(|l| l.message.as_str()).collect();
            assert_eq!(texts, vec!["line 0", "line 1", "line 2"], "arrival order kept");
            assert_eq!(*scroll, Scroll::ToBottom, "follow pins the viewport");
        }
        other => panic!("wrong op: {other:?}"),
    }

    // Disable tears everything down; the old id is dead immediately.
    let (ops, request) = d.disable_logs();
    assert_eq!(ops, vec![RenderOp::ClearLogs]);
    match request {
        Outbound::Logs { session_id, .. } => assert!(session_id.is_none()),
        other => panic!("wrong request: {other:?}"),
    }
    let _ = d.handle(log(&sid, "too late"), t0);
    assert!(d.flush_due(t0 + 2 * LOG_BATCH_INTERVAL).is_empty());
    assert!(d.active_session(StreamKind::Logs).is_none());
}

#[test]
fn historical_logs_require_a_start_time() {
    let mut d = Dispatcher::new();
    let filter = LogFilter { follow: false, ..Default::default() };
    assert_eq!(d.enable_logs(&filter), Err(StreamError::StartTimeRequired));
    // The failed attempt left no session behind.
    assert!(d.active_session(StreamKind::Logs).is_none());
}

#[test]
fn resubscribing_logs_supersedes_the_old_session() {
    let t0 = Instant::now();
    let mut d = Dispatcher::new();

    let (_, first) = d.enable_logs(&follow_filter(&["east"])).expect("first");
    let old_sid = match first {
        Outbound::Logs { session_id, .. } => session_id.expect("id"),
        other => panic!("wrong request: {other:?}"),
    };
    let _ = d.handle(log(&old_sid, "stale pending"), t0);

    let (_, second) = d.enable_logs(&follow_filter(&["west"])).expect("second");
    let new_sid = match second {
        Outbound::Logs { session_id, .. } => session_id.expect("id"),
        other => panic!("wrong request: {other:?}"),
    };
    assert_ne!(old_sid, new_sid, "ids are never reused");

    // The old session's pending line was discarded with its timer; late
    // arrivals under the old id are dropped.
    let _ = d.handle(log(&old_sid, "late"), t0);
    let _ = d.handle(log(&new_sid, "fresh"), t0);
    let ops = d.flush_due(t0 + LOG_BATCH_INTERVAL);
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        RenderOp::AppendLogs { lines, .. } => {
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].message, "fresh");
        }
        other => panic!("wrong op: {other:?}"),
    }
}

#[test]
fn resubscribing_logs_drops_the_old_sessions_index() {
    let t0 = Instant::now();
    let mut d = Dispatcher::new();
    let (_, first) = d.enable_logs(&follow_filter(&["east"])).expect("first");
    let old_sid = match first {
        Outbound::Logs { session_id, .. } => session_id.expect("id"),
        other => panic!("wrong request: {other:?}"),
    };
    let _ = d.handle(log(&old_sid, "credential rotation started"), t0);
    assert_eq!(
        d.search_logs("credential", 10).map(|h| h.len()),
        Some(1),
        "indexed under the first session"
    );

    // Filter change is stop-then-start; nothing from the first session may
    // surface in the second, searchable content included.
    let _ = d.enable_logs(&follow_filter(&["west"])).expect("second");
    assert_eq!(d.search_logs("credential", 10), Some(vec![]));
    assert!(d.logs_index().is_empty());
}

#[test]
fn scrolled_up_viewport_is_restored_not_yanked() {
    let t0 = Instant::now();
    let mut d = Dispatcher::new();
    let (_, request) = d.enable_logs(&follow_filter(&["east"])).expect("enable");
    let sid = match request {
        Outbound::Logs { session_id, .. } => session_id.expect("id"),
        other => panic!("wrong request: {other:?}"),
    };

    // Grow the panel, then scroll well above the tolerance band.
    for i in 0..200 {
        let _ = d.handle(log(&sid, &format!("line {i}")), t0);
    }
    let _ = d.flush_due(t0 + LOG_BATCH_INTERVAL);
    d.record_log_scroll(10.0);

    let t1 = t0 + LOG_BATCH_INTERVAL;
    let _ = d.handle(log(&sid, "new line"), t1);
    let ops = d.flush_due(t1 + LOG_BATCH_INTERVAL);
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        RenderOp::AppendLogs { scroll, .. } => assert_eq!(*scroll, Scroll::Restore(10.0)),
        other => panic!("wrong op: {other:?}"),
    }
}

#[test]
fn event_fanout_flushes_per_cluster_in_first_seen_order() {
    let t0 = Instant::now();
    let mut d = Dispatcher::new();
    let (_, request) =
        d.select_event_clusters(vec!["east".to_string(), "west".to_string()]);
    let sid = match request {
        Outbound::ClustersEvents { session_id, .. } => session_id.expect("id"),
        other => panic!("wrong request: {other:?}"),
    };

    let ev = |cluster: &str, msg: &str| Inbound::Event {
        session_id: Some(sid.clone()),
        event: shoal_core::ClusterEvent {
            cluster_name: cluster.to_string(),
            kind: "Pod".to_string(),
            object_name: "db-0".to_string(),
            message: msg.to_string(),
        },
    };
    let _ = d.handle(ev("west", "first"), t0);
    let _ = d.handle(ev("east", "second"), t0);
    let _ = d.handle(ev("west", "third"), t0);

    let ops = d.flush_due(t0 + EVENT_BATCH_INTERVAL);
    let panels: Vec<(&str, usize)> = ops
        .iter()
        .map(|op| match op {
            RenderOp::AppendEvents { cluster_name, events, .. } => {
                (cluster_name.as_str(), events.len())
            }
            other => panic!("wrong op: {other:?}"),
        })
        .collect();
    assert_eq!(panels, vec![("west", 2), ("east", 1)]);
}

#[test]
fn search_follows_the_session_lifecycle() {
    let t0 = Instant::now();
    let mut d = Dispatcher::new();
    let (_, request) = d.enable_logs(&follow_filter(&["east"])).expect("enable");
    let sid = match request {
        Outbound::Logs { session_id, .. } => session_id.expect("id"),
        other => panic!("wrong request: {other:?}"),
    };
    let _ = d.handle(log(&sid, "connection refused by upstream"), t0);
    let _ = d.handle(log(&sid, "healthy heartbeat"), t0);

    // Too-short query: the live panel stays, no result set at all.
    assert!(d.search_logs("co", 10).is_none());

    let hits = d.search_logs("refused", 10).expect("long enough");
    assert_eq!(hits.len(), 1);
    assert_eq!(
        d.logs_index().get(hits[0].doc).map(String::as_str),
        Some("connection refused by upstream")
    );

    let _ = d.disable_logs();
    assert_eq!(d.search_logs("refused", 10), Some(vec![]));
}
