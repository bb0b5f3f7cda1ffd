//! Shoal metrics: periodic polling of a prom2json endpoint, organized into
//! typed families, diffed into a stable card grid, and indexed for fuzzy
//! search.

#![forbid(unsafe_code)]

pub mod diff;
pub mod family;
pub mod format;
pub mod model;

mod poller;
pub use poller::{MetricDoc, MetricsError, MetricsPoller, REFRESH_INTERVAL};
