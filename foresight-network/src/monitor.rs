//! NetworkMonitor: re-polls connectivity and publishes tier changes.

use std::sync::Arc;
use std::time::Duration;

use foresight_core::models::NetworkQuality;
use foresight_core::traits::IConnectivity;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::classifier::NetworkQualityClassifier;

/// Holds the latest classification and notifies subscribers on change.
pub struct NetworkMonitor {
    classifier: NetworkQualityClassifier,
    connectivity: Arc<dyn IConnectivity>,
    sender: watch::Sender<NetworkQuality>,
}

impl NetworkMonitor {
    /// Create a monitor, classifying the current signals immediately.
    pub fn new(classifier: NetworkQualityClassifier, connectivity: Arc<dyn IConnectivity>) -> Self {
        let initial = classifier.classify(&connectivity.signals());
        let (sender, _) = watch::channel(initial);
        Self {
            classifier,
            connectivity,
            sender,
        }
    }

    /// Last published tier.
    pub fn current(&self) -> NetworkQuality {
        *self.sender.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.current() != NetworkQuality::Offline
    }

    /// Reclassify now and publish if the tier changed.
    pub fn refresh(&self) -> NetworkQuality {
        let quality = self.classifier.classify(&self.connectivity.signals());
        self.sender.send_if_modified(|current| {
            if *current == quality {
                return false;
            }
            tracing::info!(
                event = "network_quality_changed",
                from = %current,
                to = %quality,
                "network quality changed"
            );
            *current = quality;
            true
        });
        quality
    }

    /// Receive every tier change.
    pub fn subscribe(&self) -> watch::Receiver<NetworkQuality> {
        self.sender.subscribe()
    }

    /// Re-poll on a fixed interval until the returned handle is aborted.
    pub fn spawn_polling(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                monitor.refresh();
            }
        })
    }
}
