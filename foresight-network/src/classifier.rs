use foresight_core::config::{validate_network, NetworkConfig};
use foresight_core::errors::ConfigError;
use foresight_core::models::{ConnectionSignals, EffectiveType, NetworkQuality};

/// Pure classifier from connectivity signals to a quality tier.
#[derive(Debug, Clone, Default)]
pub struct NetworkQualityClassifier {
    config: NetworkConfig,
}

impl NetworkQualityClassifier {
    pub fn new(config: NetworkConfig) -> Result<Self, ConfigError> {
        validate_network(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Classify the given signals. No side effects.
    ///
    /// Signals the host cannot observe never prove `Fast`, and never force `Slow`.
    pub fn classify(&self, signals: &ConnectionSignals) -> NetworkQuality {
        if !signals.online {
            return NetworkQuality::Offline;
        }
        if self.is_slow(signals) {
            return NetworkQuality::Slow;
        }
        if self.is_fast(signals) {
            return NetworkQuality::Fast;
        }
        NetworkQuality::Medium
    }

    fn is_slow(&self, signals: &ConnectionSignals) -> bool {
        signals.save_data
            || signals.effective_type.is_some_and(|t| t.is_low_bandwidth())
            || signals
                .downlink_mbps
                .is_some_and(|d| d < self.config.slow_max_downlink_mbps)
            || signals.rtt_ms.is_some_and(|r| r > self.config.slow_min_rtt_ms)
    }

    fn is_fast(&self, signals: &ConnectionSignals) -> bool {
        signals.effective_type == Some(EffectiveType::FourG)
            && signals
                .downlink_mbps
                .is_some_and(|d| d >= self.config.fast_min_downlink_mbps)
            && signals.rtt_ms.is_some_and(|r| r <= self.config.fast_max_rtt_ms)
    }
}

/// Whether `current` satisfies `required` under `fast > medium > slow > offline`.
pub fn meets_threshold(current: NetworkQuality, required: NetworkQuality) -> bool {
    current.meets(required)
}
