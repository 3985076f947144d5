use crate::models::ConnectionSignals;

/// Source of raw connectivity signals (network information API, OS query, ...).
pub trait IConnectivity: Send + Sync {
    fn signals(&self) -> ConnectionSignals;

    fn is_online(&self) -> bool {
        self.signals().online
    }
}
