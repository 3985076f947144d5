use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse connectivity tier.
///
/// Variant order defines the total order `Offline < Slow < Medium < Fast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkQuality {
    Offline,
    Slow,
    Medium,
    Fast,
}

impl NetworkQuality {
    /// Whether `self` is at least as good as `required`.
    pub fn meets(self, required: NetworkQuality) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for NetworkQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective connection type as reported by the host's network information API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectiveType {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    FourG,
}

impl EffectiveType {
    /// Lowest-bandwidth link types.
    pub fn is_low_bandwidth(self) -> bool {
        matches!(self, Self::Slow2g | Self::TwoG)
    }
}

impl FromStr for EffectiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Ok(Self::Slow2g),
            "2g" => Ok(Self::TwoG),
            "3g" => Ok(Self::ThreeG),
            "4g" => Ok(Self::FourG),
            other => Err(format!("unknown effective connection type: {other}")),
        }
    }
}

/// Raw connectivity signals. Any signal the host cannot observe is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSignals {
    pub effective_type: Option<EffectiveType>,
    /// Downlink throughput estimate in megabits per second.
    pub downlink_mbps: Option<f64>,
    /// Round-trip time estimate in milliseconds.
    pub rtt_ms: Option<u32>,
    /// User "reduce data usage" preference.
    pub save_data: bool,
    /// Host online/offline flag.
    pub online: bool,
}

impl Default for ConnectionSignals {
    fn default() -> Self {
        Self {
            effective_type: None,
            downlink_mbps: None,
            rtt_ms: None,
            save_data: false,
            online: true,
        }
    }
}

impl ConnectionSignals {
    /// Signals for a disconnected host.
    pub fn offline() -> Self {
        Self {
            online: false,
            ..Default::default()
        }
    }

    /// Signals describing a healthy broadband link.
    pub fn broadband() -> Self {
        Self {
            effective_type: Some(EffectiveType::FourG),
            downlink_mbps: Some(10.0),
            rtt_ms: Some(50),
            save_data: false,
            online: true,
        }
    }
}
