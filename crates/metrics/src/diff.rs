//! Identity-preserving diff of the simple-metric card grid. Cards keep the
//! position they were first seen at across refreshes, so the grid never
//! reshuffles under the reader; only genuinely new, changed, or vanished
//! cards produce ops.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::model::MetricKind;

/// Display state of one simple-metric card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub name: String,
    pub kind: MetricKind,
    /// Already-formatted headline value.
    pub value: String,
    pub help: String,
}

/// Display state of one histogram or summary chart: axis points plus the
/// count/sum statistics for its tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartCard {
    pub name: String,
    /// Humanized name for the chart heading.
    pub title: String,
    pub help: String,
    /// `(label, value)` in axis order: bucket upper bound to per-bucket
    /// increment for histograms, percentile label to value for summaries.
    pub points: Vec<(String, f64)>,
    pub count: Option<f64>,
    pub sum: Option<f64>,
}

/// Instructions for the card grid, in apply order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CardOp {
    Insert { at: usize, card: Card },
    /// `flash` is set when the headline value changed, to drive the update
    /// animation.
    Update { name: String, card: Card, flash: bool },
    Remove { name: String },
    /// Full replacement of a chart section, emitted only when its content
    /// changed since the previous poll.
    SetHistograms(Vec<ChartCard>),
    SetSummaries(Vec<ChartCard>),
    /// A refresh failed; existing cards stay up.
    Error { message: String },
}

#[derive(Debug, Default)]
pub struct GridDiff {
    /// First-seen position per metric name; grows monotonically and is never
    /// compacted, which is what keeps surviving cards in place.
    positions: FxHashMap<String, usize>,
    current: Vec<Card>,
}

impl GridDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cards currently on the grid, in display order.
    pub fn cards(&self) -> &[Card] {
        &self.current
    }

    /// Diff the incoming snapshot against the grid and adopt it.
    pub fn apply(&mut self, incoming: Vec<Card>) -> Vec<CardOp> {
        let mut ordered: Vec<Card> = incoming;
        for card in &ordered {
            let next = self.positions.len();
            self.positions.entry(card.name.clone()).or_insert(next);
        }
        ordered.sort_by_key(|card| self.positions[&card.name]);

        let mut ops = Vec::new();
        for old in &self.current {
            if !ordered.iter().any(|c| c.name == old.name) {
                ops.push(CardOp::Remove { name: old.name.clone() });
            }
        }
        for (at, card) in ordered.iter().enumerate() {
            match self.current.iter().find(|c| c.name == card.name) {
                None => ops.push(CardOp::Insert { at, card: card.clone() }),
                Some(old) if old != card => ops.push(CardOp::Update {
                    name: card.name.clone(),
                    card: card.clone(),
                    flash: old.value != card.value,
                }),
                Some(_) => {}
            }
        }
        self.current = ordered;
        ops
    }
}
