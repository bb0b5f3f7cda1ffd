//! Batching of inbound render units, decoupling push-message frequency from
//! view mutation cost.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

/// Logs batch aggressively; volume is high and a 500ms cadence is plenty.
pub const LOG_BATCH_INTERVAL: Duration = Duration::from_millis(500);
/// Events flush near-immediately so live tailing stays responsive.
pub const EVENT_BATCH_INTERVAL: Duration = Duration::from_millis(10);

/// Pending render units plus an armed/unarmed flush deadline. The first
/// enqueue after a flush re-arms the timer; `cancel` discards pending units
/// and disarms in one step, so a torn-down session can never flush orphaned
/// data into a cleared panel.
#[derive(Debug)]
pub struct BatchQueue<T> {
    pending: Vec<T>,
    deadline: Option<Instant>,
    interval: Duration,
}

impl<T> BatchQueue<T> {
    pub fn new(interval: Duration) -> Self {
        Self { pending: Vec::new(), deadline: None, interval }
    }

    pub fn push(&mut self, unit: T, now: Instant) {
        self.pending.push(unit);
        if self.deadline.is_none() {
            self.deadline = Some(now + self.interval);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drain the whole pending batch if the deadline has passed, FIFO,
    /// disarming the timer.
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<T>> {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                if self.pending.is_empty() {
                    None
                } else {
                    metrics::histogram!("stream_batch_size", self.pending.len() as f64);
                    Some(std::mem::take(&mut self.pending))
                }
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending.clear();
        self.deadline = None;
    }
}

/// Per-cluster buckets sharing a single flush timer, in first-seen cluster
/// order. Used for events, where each cluster renders into its own panel
/// but one timer drives all of them.
#[derive(Debug)]
pub struct FanoutQueue<T> {
    buckets: FxHashMap<String, Vec<T>>,
    order: Vec<String>,
    deadline: Option<Instant>,
    interval: Duration,
}

impl<T> FanoutQueue<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            buckets: FxHashMap::default(),
            order: Vec::new(),
            deadline: None,
            interval,
        }
    }

    pub fn push(&mut self, key: &str, unit: T, now: Instant) {
        if !self.buckets.contains_key(key) {
            self.order.push(key.to_string());
        }
        self.buckets.entry(key.to_string()).or_default().push(unit);
        if self.deadline.is_none() {
            self.deadline = Some(now + self.interval);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drain every non-empty bucket in first-seen order.
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<(String, Vec<T>)>> {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                let mut out = Vec::new();
                for key in &self.order {
                    if let Some(bucket) = self.buckets.get_mut(key) {
                        if !bucket.is_empty() {
                            out.push((key.clone(), std::mem::take(bucket)));
                        }
                    }
                }
                if out.is_empty() {
                    None
                } else {
                    Some(out)
                }
            }
            _ => None,
        }
    }

    /// Forget one cluster's bucket entirely (its panel was removed).
    pub fn drop_bucket(&mut self, key: &str) {
        self.buckets.remove(key);
        self.order.retain(|k| k != key);
    }

    pub fn cancel(&mut self) {
        self.buckets.clear();
        self.order.clear();
        self.deadline = None;
    }
}
