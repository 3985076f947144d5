//! # foresight-prediction
//!
//! Learns a first-order transition model over navigation history and scores
//! candidate next routes.
//!
//! ## Scoring
//!
//! | Component | Weight | Source |
//! |-----------|--------|--------|
//! | Transition frequency | 0.7 | `count / total outgoing` from the current route |
//! | Popularity | 0.2 | destination visits, saturating at the visit cap |
//! | Recency | 0.1 | linear decay across the recency window |
//!
//! The blend only applies to destinations visited within the recency window;
//! older destinations score on transition frequency alone.

pub mod cache;
pub mod persistence;
pub mod predictor;
pub mod scoring;

pub use cache::PredictionCache;
pub use predictor::RouteTransitionPredictor;
pub use scoring::ScoreWeights;
