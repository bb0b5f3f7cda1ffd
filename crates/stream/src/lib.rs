//! Shoal stream pipeline: session-scoped subscriptions, batched render
//! queues between the push channel and a rate-limited view, and the
//! dispatcher that turns accepted messages into renderer-agnostic ops.

#![forbid(unsafe_code)]

mod batch;
mod dispatch;
mod ops;
mod session;
mod viewport;

pub use batch::{BatchQueue, FanoutQueue, EVENT_BATCH_INTERVAL, LOG_BATCH_INTERVAL};
pub use dispatch::Dispatcher;
pub use ops::{ClusterTile, RenderOp, TileCondition, TILE_CONDITION_LIMIT};
pub use session::{LogFilter, SessionRegistry, StreamError};
pub use viewport::{Scroll, Viewport, FOLLOW_TOLERANCE};
