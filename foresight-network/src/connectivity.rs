//! Settable connectivity provider for hosts that push change events.

use std::sync::Mutex;

use foresight_core::models::ConnectionSignals;
use foresight_core::traits::IConnectivity;

/// Connectivity provider whose signals are pushed by the host.
#[derive(Debug, Default)]
pub struct ManualConnectivity {
    signals: Mutex<ConnectionSignals>,
}

impl ManualConnectivity {
    pub fn new(signals: ConnectionSignals) -> Self {
        Self {
            signals: Mutex::new(signals),
        }
    }

    pub fn set(&self, signals: ConnectionSignals) {
        *self.signals.lock().unwrap_or_else(|e| e.into_inner()) = signals;
    }

    pub fn set_online(&self, online: bool) {
        self.signals.lock().unwrap_or_else(|e| e.into_inner()).online = online;
    }
}

impl IConnectivity for ManualConnectivity {
    fn signals(&self) -> ConnectionSignals {
        self.signals.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
