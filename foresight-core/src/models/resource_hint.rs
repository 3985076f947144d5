use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of browser resource hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HintType {
    Preload,
    Prefetch,
    Preconnect,
    DnsPrefetch,
}

impl HintType {
    /// The `rel` attribute value for this hint.
    pub fn rel(self) -> &'static str {
        match self {
            Self::Preload => "preload",
            Self::Prefetch => "prefetch",
            Self::Preconnect => "preconnect",
            Self::DnsPrefetch => "dns-prefetch",
        }
    }
}

impl fmt::Display for HintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rel())
    }
}

/// CORS mode for a hinted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    Anonymous,
    UseCredentials,
}

/// A resource hint declaration. Identity is `(hint_type, url)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHint {
    pub url: String,
    #[serde(rename = "type")]
    pub hint_type: HintType,
    /// Destination type for preloads (`script`, `style`, `font`, `document`, ...).
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub as_type: Option<String>,
    #[serde(rename = "crossOrigin", default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<CrossOrigin>,
}

impl ResourceHint {
    pub fn new(hint_type: HintType, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hint_type,
            as_type: None,
            cross_origin: None,
        }
    }

    pub fn preload(url: impl Into<String>, as_type: impl Into<String>) -> Self {
        Self {
            as_type: Some(as_type.into()),
            ..Self::new(HintType::Preload, url)
        }
    }

    pub fn prefetch(url: impl Into<String>) -> Self {
        Self::new(HintType::Prefetch, url)
    }

    pub fn preconnect(url: impl Into<String>) -> Self {
        Self::new(HintType::Preconnect, url)
    }

    pub fn dns_prefetch(url: impl Into<String>) -> Self {
        Self::new(HintType::DnsPrefetch, url)
    }

    pub fn with_cross_origin(mut self, mode: CrossOrigin) -> Self {
        self.cross_origin = Some(mode);
        self
    }

    /// Identity key within the pending set.
    pub fn key(&self) -> (HintType, String) {
        (self.hint_type, self.url.clone())
    }
}
