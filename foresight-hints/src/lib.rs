//! # foresight-hints
//!
//! Applies resource hints to the document under a priority order and a
//! global ceiling on concurrently loading hints, and retires them as the
//! underlying loads complete.
//!
//! Every document mutation happens inside a scheduling pass, and a pass runs
//! to completion under the manager's lock.

pub mod manager;
pub mod queue;

pub use manager::ResourceHintManager;
pub use queue::PendingQueue;
