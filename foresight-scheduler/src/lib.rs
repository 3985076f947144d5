//! # foresight-scheduler
//!
//! Merges prefetch triggers into one deduplicated, rate-limited,
//! network-gated pipeline, and assembles the whole engine.
//!
//! | Trigger | Entry point | Default minimum tier |
//! |---------|-------------|----------------------|
//! | hover / touch | `hover_start` + `hover_end` (debounced) | fast |
//! | viewport | `observe_intersections` | medium |
//! | prediction | `record_visit` (after a settle delay) | slow |
//! | manual | `prefetch_manual` | slow |

pub mod engine;
pub mod fetch;
pub mod handle;
pub mod rate_limiter;
pub mod record;
pub mod scheduler;
pub mod telemetry;
pub mod tracing_setup;
pub mod triggers;

pub use engine::{EngineHost, ForesightEngine};
pub use fetch::{FnFetchStrategy, HttpFetchStrategy};
pub use handle::PrefetchHandle;
pub use record::PrefetchRecord;
pub use scheduler::{PrefetchScheduler, SchedulerParts};
pub use telemetry::TracingTelemetry;
pub use triggers::IntersectionEntry;
