//! Terminal rendering of dispatcher and metrics ops. This is the only place
//! that knows what output looks like; everything upstream speaks ops.

use shoal_metrics::diff::{CardOp, ChartCard};
use shoal_metrics::model::MetricKind;
use shoal_search::highlight::wrap_spans;
use shoal_search::{Hit, Index};
use shoal_stream::{RenderOp, Scroll};

const HIGHLIGHT_OPEN: &str = "\x1b[1;33m";
const HIGHLIGHT_CLOSE: &str = "\x1b[0m";

pub struct TermView {
    color: bool,
    /// Type selector for the metrics panel; `None` shows every kind.
    metric_kind: Option<MetricKind>,
}

impl TermView {
    pub fn new(color: bool, metric_kind: Option<MetricKind>) -> Self {
        Self { color, metric_kind }
    }

    fn shows(&self, kind: MetricKind) -> bool {
        self.metric_kind.map_or(true, |k| k == kind)
    }

    pub fn apply(&self, ops: &[RenderOp]) {
        for op in ops {
            match op {
                RenderOp::SetClusterRoster(clusters) => {
                    println!("clusters: {}", clusters.join(", "));
                }
                RenderOp::SetTiles(tiles) => {
                    for tile in tiles {
                        println!(
                            "[{}] {} ({})",
                            tile.color.as_str(),
                            tile.cluster_name,
                            tile.detail_path
                        );
                        for cond in &tile.conditions {
                            println!(
                                "    {} {}={}",
                                cond.color.as_str(),
                                cond.type_,
                                cond.status.as_str()
                            );
                        }
                    }
                }
                RenderOp::AppendLogs { lines, scroll } => {
                    for line in lines {
                        println!("log | {}", line.message);
                    }
                    self.note_scroll(scroll);
                }
                RenderOp::ClearLogs => println!("log | --- cleared ---"),
                RenderOp::AppendEvents { cluster_name, events, scroll } => {
                    for ev in events {
                        println!(
                            "event[{cluster_name}] | {} {}: {}",
                            ev.kind, ev.object_name, ev.message
                        );
                    }
                    self.note_scroll(scroll);
                }
                RenderOp::RemoveEventPanel { cluster_name } => {
                    println!("event[{cluster_name}] | --- panel removed ---");
                }
                RenderOp::ClearEvents => println!("event | --- all panels cleared ---"),
            }
        }
    }

    pub fn apply_cards(&self, ops: &[CardOp]) {
        for op in ops {
            match op {
                CardOp::Insert { at, card } if self.shows(card.kind) => {
                    println!("metric + #{at} {} = {} ({})", card.name, card.value, card.kind.as_str());
                }
                CardOp::Update { name, card, flash } if self.shows(card.kind) => {
                    let mark = if *flash { "*" } else { " " };
                    println!("metric {mark} {name} = {}", card.value);
                }
                CardOp::Insert { .. } | CardOp::Update { .. } => {}
                CardOp::Remove { name } => println!("metric - {name}"),
                CardOp::SetHistograms(charts) if self.shows(MetricKind::Histogram) => {
                    for chart in charts {
                        self.print_chart("histogram", chart);
                    }
                }
                CardOp::SetSummaries(charts) if self.shows(MetricKind::Summary) => {
                    for chart in charts {
                        self.print_chart("summary", chart);
                    }
                }
                CardOp::SetHistograms(_) | CardOp::SetSummaries(_) => {}
                CardOp::Error { message } => println!("metric ! {message}"),
            }
        }
    }

    fn print_chart(&self, section: &str, chart: &ChartCard) {
        let points: Vec<String> =
            chart.points.iter().map(|(label, value)| format!("{label}:{value}")).collect();
        let mut stats = String::new();
        if let Some(count) = chart.count {
            stats.push_str(&format!(" count={count}"));
        }
        if let Some(sum) = chart.sum {
            stats.push_str(&format!(" sum={sum}"));
        }
        println!("{section} | {} [{}]{stats}", chart.title, points.join(" "));
    }

    /// Print ranked hits with their matched spans emphasized. A panel stays
    /// untouched when `hits` is `None` (query below the minimum length).
    pub fn show_hits<D: shoal_search::Document>(
        &self,
        label: &str,
        index: &Index<D>,
        hits: Option<&[Hit]>,
    ) {
        let Some(hits) = hits else { return };
        if hits.is_empty() {
            println!("{label}: no matches");
            return;
        }
        println!("{label}: {} match(es)", hits.len());
        for hit in hits {
            let Some(doc) = index.get(hit.doc) else { continue };
            for (field, text) in doc.fields() {
                let Some(m) = hit.matches.iter().find(|m| m.field == field) else { continue };
                let shown = if self.color {
                    wrap_spans(text, &m.spans, HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE)
                } else {
                    wrap_spans(text, &m.spans, "[", "]")
                };
                println!("    {field}: {shown}");
            }
        }
    }

    fn note_scroll(&self, scroll: &Scroll) {
        match scroll {
            Scroll::ToBottom => {}
            Scroll::Restore(offset) => {
                tracing::debug!(offset = *offset, "viewport restored instead of following");
            }
        }
    }
}
