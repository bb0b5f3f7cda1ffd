//! Organizing a raw payload into display-ready families: simple metrics keep
//! payload order, histograms and summaries are sorted by name, and histogram
//! buckets are converted from cumulative counts to per-bucket increments for
//! charting.

use crate::model::{Flex, MetricKind, RawBuckets, RawFamily, RawSample};

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleValue {
    pub labels: std::collections::BTreeMap<String, String>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Inclusive upper bound; `f64::INFINITY` for the catch-all bucket.
    pub le: f64,
    /// Cumulative observation count.
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FamilyDetail {
    Simple { values: Vec<SimpleValue> },
    Histogram { buckets: Vec<Bucket>, count: Option<f64>, sum: Option<f64> },
    Summary { quantiles: Vec<Quantile>, count: Option<f64>, sum: Option<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub detail: FamilyDetail,
}

impl MetricFamily {
    /// The headline value shown on a card: the first sample of a simple
    /// family.
    pub fn headline(&self) -> Option<f64> {
        match &self.detail {
            FamilyDetail::Simple { values } => values.first().map(|v| v.value),
            _ => None,
        }
    }
}

/// One organized payload, split the way the dashboard lays it out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Counters, gauges, and untyped families in payload order.
    pub simple: Vec<MetricFamily>,
    /// Sorted by name.
    pub histograms: Vec<MetricFamily>,
    /// Sorted by name.
    pub summaries: Vec<MetricFamily>,
}

impl Snapshot {
    pub fn families(&self) -> impl Iterator<Item = &MetricFamily> {
        self.simple.iter().chain(&self.histograms).chain(&self.summaries)
    }
}

/// Split a raw payload into the three display groups. Families with an
/// unknown type, or with no usable samples, are skipped.
pub fn organize(raw: Vec<RawFamily>) -> Snapshot {
    let mut snap = Snapshot::default();
    for fam in raw {
        let Some(kind) = MetricKind::parse(&fam.kind) else { continue };
        match kind {
            MetricKind::Histogram => {
                if let Some(detail) = histogram_detail(&fam.metrics) {
                    snap.histograms.push(MetricFamily {
                        name: fam.name,
                        help: fam.help,
                        kind,
                        detail,
                    });
                }
            }
            MetricKind::Summary => {
                if let Some(detail) = summary_detail(&fam.metrics) {
                    snap.summaries.push(MetricFamily {
                        name: fam.name,
                        help: fam.help,
                        kind,
                        detail,
                    });
                }
            }
            _ => {
                let values: Vec<SimpleValue> = fam
                    .metrics
                    .iter()
                    .filter_map(|m| {
                        m.value.as_ref().and_then(Flex::as_f64).map(|value| SimpleValue {
                            labels: m.labels.clone(),
                            value,
                        })
                    })
                    .collect();
                if !values.is_empty() {
                    snap.simple.push(MetricFamily {
                        name: fam.name,
                        help: fam.help,
                        kind,
                        detail: FamilyDetail::Simple { values },
                    });
                }
            }
        }
    }
    snap.histograms.sort_by(|a, b| a.name.cmp(&b.name));
    snap.summaries.sort_by(|a, b| a.name.cmp(&b.name));
    snap
}

/// The first sample carrying buckets wins; classic object buckets and native
/// array buckets both normalize to `(le, cumulative count)` sorted by bound.
fn histogram_detail(samples: &[RawSample]) -> Option<FamilyDetail> {
    let sample = samples.iter().find(|m| m.buckets.is_some())?;
    let mut buckets: Vec<Bucket> = match sample.buckets.as_ref()? {
        RawBuckets::Classic(map) => map
            .iter()
            .filter_map(|(bound, count)| {
                let le = if bound == "+Inf" { f64::INFINITY } else { bound.parse().ok()? };
                Some(Bucket { le, value: count.as_f64()? })
            })
            .collect(),
        RawBuckets::Native(rows) => rows
            .iter()
            .filter(|row| row.len() >= 4)
            .filter_map(|row| {
                // `[boundaries, start, end, count]`; the span end is the
                // upper bound.
                Some(Bucket { le: row[2].as_f64()?, value: row[3].as_f64()? })
            })
            .collect(),
    };
    if buckets.is_empty() {
        return None;
    }
    buckets.sort_by(|a, b| a.le.total_cmp(&b.le));
    Some(FamilyDetail::Histogram {
        buckets,
        count: sample.count.as_ref().and_then(Flex::as_f64),
        sum: sample.sum.as_ref().and_then(Flex::as_f64),
    })
}

fn summary_detail(samples: &[RawSample]) -> Option<FamilyDetail> {
    let sample = samples.iter().find(|m| m.quantiles.is_some())?;
    let mut quantiles: Vec<Quantile> = sample
        .quantiles
        .as_ref()?
        .iter()
        .filter_map(|(q, v)| Some(Quantile { quantile: q.parse().ok()?, value: v.as_f64()? }))
        .collect();
    if quantiles.is_empty() {
        return None;
    }
    quantiles.sort_by(|a, b| a.quantile.total_cmp(&b.quantile));
    Some(FamilyDetail::Summary {
        quantiles,
        count: sample.count.as_ref().and_then(Flex::as_f64),
        sum: sample.sum.as_ref().and_then(Flex::as_f64),
    })
}

/// Chart data for a histogram: bucket labels plus per-bucket increments.
/// Counts are cumulative on the wire; a decrease between adjacent buckets
/// (a scrape race) clamps to zero rather than charting a negative bar.
pub fn incremental_buckets(buckets: &[Bucket]) -> (Vec<String>, Vec<f64>) {
    let mut labels = Vec::with_capacity(buckets.len());
    let mut values = Vec::with_capacity(buckets.len());
    let mut prev = 0.0;
    for (i, b) in buckets.iter().enumerate() {
        labels.push(if b.le.is_infinite() { "+Inf".to_string() } else { b.le.to_string() });
        let inc = if i == 0 { b.value } else { (b.value - prev).max(0.0) };
        values.push(inc);
        prev = b.value;
    }
    (labels, values)
}
