//! Shared data model.

pub mod cache_entry;
pub mod network;
pub mod prefetch;
pub mod resource_hint;
pub mod route;

pub use cache_entry::{CacheEntry, EntryMetadata};
pub use network::{ConnectionSignals, EffectiveType, NetworkQuality};
pub use prefetch::{PrefetchOutcome, PrefetchQueueItem, PrefetchState, SkipReason, TriggerMethod};
pub use resource_hint::{CrossOrigin, HintType, ResourceHint};
pub use route::{PredictionScore, RouteStats};
