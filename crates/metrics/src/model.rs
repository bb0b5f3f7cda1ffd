//! Raw prom2json payload shapes. Everything numeric arrives either as a JSON
//! number or as a string (`"+Inf"`, `"NaN"`, `"0.003"`), so values decode
//! through [`Flex`] and are resolved to `f64` afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One metric family as the endpoint emits it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFamily {
    pub name: String,
    #[serde(default)]
    pub help: String,
    /// Kept as a string so an unknown family type skips one family instead
    /// of failing the whole payload.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metrics: Vec<RawSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricKind {
    Counter,
    Gauge,
    Untyped,
    Histogram,
    Summary,
}

impl MetricKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COUNTER" => Some(Self::Counter),
            "GAUGE" => Some(Self::Gauge),
            "UNTYPED" => Some(Self::Untyped),
            "HISTOGRAM" => Some(Self::Histogram),
            "SUMMARY" => Some(Self::Summary),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "COUNTER",
            Self::Gauge => "GAUGE",
            Self::Untyped => "UNTYPED",
            Self::Histogram => "HISTOGRAM",
            Self::Summary => "SUMMARY",
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Counter | Self::Gauge | Self::Untyped)
    }
}

/// One sample within a family. Which fields are present depends on the
/// family type; absent ones default to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub value: Option<Flex>,
    #[serde(default)]
    pub buckets: Option<RawBuckets>,
    #[serde(default)]
    pub quantiles: Option<BTreeMap<String, Flex>>,
    #[serde(default)]
    pub count: Option<Flex>,
    #[serde(default)]
    pub sum: Option<Flex>,
}

/// Classic histograms carry an upper-bound keyed object; native histograms
/// carry `[boundaries, start, end, count]` arrays.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBuckets {
    Classic(BTreeMap<String, Flex>),
    Native(Vec<Vec<Flex>>),
}

/// A number that may be spelled as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Flex {
    Num(f64),
    Text(String),
}

impl Flex {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Flex::Num(n) => Some(*n),
            Flex::Text(s) => match s.as_str() {
                "+Inf" | "Inf" => Some(f64::INFINITY),
                "-Inf" => Some(f64::NEG_INFINITY),
                "NaN" => Some(f64::NAN),
                other => other.parse().ok(),
            },
        }
    }
}
