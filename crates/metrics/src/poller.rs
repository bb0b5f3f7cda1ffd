//! Polls the metrics endpoint on a fixed interval and turns each payload
//! into card-grid ops plus a rebuilt search index. A failed poll surfaces an
//! error op and leaves all existing state untouched; the next successful
//! poll recovers on its own.

use std::time::Duration;

use reqwest::header::ACCEPT;
use shoal_search::{Document, Hit, Index, METRIC_MIN_QUERY};
use tracing::{debug, warn};

use crate::diff::{Card, CardOp, ChartCard, GridDiff};
use crate::family::{incremental_buckets, FamilyDetail, MetricFamily};
use crate::format::{format_title, format_value};
use crate::model::{MetricKind, RawFamily};

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
}

/// A family as the search index sees it, matched on name, help text, and
/// type.
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
}

impl Document for MetricDoc {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![("name", &self.name), ("help", &self.help), ("type", self.kind.as_str())]
    }
}

pub struct MetricsPoller {
    url: String,
    client: reqwest::Client,
    grid: GridDiff,
    index: Index<MetricDoc>,
    histograms: Vec<ChartCard>,
    summaries: Vec<ChartCard>,
}

impl MetricsPoller {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            grid: GridDiff::new(),
            index: Index::new(METRIC_MIN_QUERY),
            histograms: Vec::new(),
            summaries: Vec::new(),
        }
    }

    /// One refresh cycle. Errors become an op rather than bubbling out, so
    /// the driver loop keeps its cadence.
    pub async fn poll_once(&mut self) -> Vec<CardOp> {
        match self.fetch().await {
            Ok(raw) => self.ingest(raw),
            Err(err) => {
                warn!(error = %err, url = %self.url, "metrics refresh failed");
                metrics::counter!("metrics_poll_failures_total", 1u64);
                vec![CardOp::Error { message: err.to_string() }]
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<RawFamily>, MetricsError> {
        let raw = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(raw)
    }

    /// Organize one payload, rebuild the search index from it, and diff the
    /// simple families into the card grid. Pure; tests feed payloads here
    /// directly.
    pub fn ingest(&mut self, raw: Vec<RawFamily>) -> Vec<CardOp> {
        let snap = crate::family::organize(raw);
        debug!(
            simple = snap.simple.len(),
            histograms = snap.histograms.len(),
            summaries = snap.summaries.len(),
            "metrics payload organized"
        );

        // Families come and go between polls, so the index is rebuilt from
        // scratch rather than grown.
        let mut index = Index::new(METRIC_MIN_QUERY);
        for fam in snap.families() {
            index.add(MetricDoc {
                name: fam.name.clone(),
                help: fam.help.clone(),
                kind: fam.kind,
            });
        }
        self.index = index;

        let cards = snap.simple.iter().map(card_of).collect();
        let mut ops = self.grid.apply(cards);

        let histograms: Vec<ChartCard> = snap.histograms.iter().map(chart_of).collect();
        if histograms != self.histograms {
            self.histograms = histograms;
            ops.push(CardOp::SetHistograms(self.histograms.clone()));
        }
        let summaries: Vec<ChartCard> = snap.summaries.iter().map(chart_of).collect();
        if summaries != self.summaries {
            self.summaries = summaries;
            ops.push(CardOp::SetSummaries(self.summaries.clone()));
        }
        ops
    }

    /// Fuzzy search across all families. `None` below the minimum query
    /// length; the full dashboard stays up in that case.
    pub fn search(&self, query: &str, limit: usize) -> Option<Vec<Hit>> {
        self.index.query(query, limit)
    }

    pub fn index(&self) -> &Index<MetricDoc> {
        &self.index
    }
}

fn card_of(fam: &MetricFamily) -> Card {
    let value = match (&fam.detail, fam.headline()) {
        (FamilyDetail::Simple { .. }, Some(v)) => format_value(v, &fam.name),
        _ => String::new(),
    };
    Card { name: fam.name.clone(), kind: fam.kind, value, help: fam.help.clone() }
}

fn chart_of(fam: &MetricFamily) -> ChartCard {
    let (points, count, sum) = match &fam.detail {
        FamilyDetail::Histogram { buckets, count, sum } => {
            let (labels, values) = incremental_buckets(buckets);
            (labels.into_iter().zip(values).collect(), *count, *sum)
        }
        FamilyDetail::Summary { quantiles, count, sum } => {
            let points = quantiles
                .iter()
                .map(|q| (format!("p{}", (q.quantile * 100.0).round() as i64), q.value))
                .collect();
            (points, *count, *sum)
        }
        FamilyDetail::Simple { .. } => (Vec::new(), None, None),
    };
    ChartCard {
        name: fam.name.clone(),
        title: format_title(&fam.name),
        help: fam.help.clone(),
        points,
        count,
        sum,
    }
}
