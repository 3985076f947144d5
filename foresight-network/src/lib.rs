//! # foresight-network
//!
//! Classifies raw connectivity signals into a coarse quality tier and keeps
//! the current tier published for the rest of the engine.
//!
//! | Tier | Rule |
//! |------|------|
//! | offline | host reports offline (overrides everything) |
//! | slow | any of: slow-2g/2g, low downlink, high RTT, save-data |
//! | fast | all of: 4g, downlink above floor, RTT below ceiling |
//! | medium | everything else |

pub mod classifier;
pub mod connectivity;
pub mod monitor;

pub use classifier::{meets_threshold, NetworkQualityClassifier};
pub use connectivity::ManualConnectivity;
pub use monitor::NetworkMonitor;
