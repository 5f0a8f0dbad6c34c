//! Core data types shared across the analysis pipeline
//!
//! Tiers, factors and verdicts produced by the core, plus the shapes the core
//! expects from each external collaborator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Risk level of a single signal.
///
/// Variant order is the display severity order. Aggregation never relies on
/// it; it uses the explicit weight table instead.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SignalTier {
    #[default]
    Unknown,
    Safe,
    Warning,
    Danger,
}

impl SignalTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalTier::Unknown => "unknown",
            SignalTier::Safe => "safe",
            SignalTier::Warning => "warning",
            SignalTier::Danger => "danger",
        }
    }
}

impl fmt::Display for SignalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every signal slot tracked by an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Fingerprint,
    Canvas,
    Webgl,
    Audio,
    DeviceMemory,
    Ip,
    Location,
    Isp,
    Proxy,
    DnsLeak,
    Language,
    Timezone,
    Mouse,
    Scroll,
    SessionTime,
}

impl SignalCategory {
    pub const ALL: [SignalCategory; 15] = [
        SignalCategory::Fingerprint,
        SignalCategory::Canvas,
        SignalCategory::Webgl,
        SignalCategory::Audio,
        SignalCategory::DeviceMemory,
        SignalCategory::Ip,
        SignalCategory::Location,
        SignalCategory::Isp,
        SignalCategory::Proxy,
        SignalCategory::DnsLeak,
        SignalCategory::Language,
        SignalCategory::Timezone,
        SignalCategory::Mouse,
        SignalCategory::Scroll,
        SignalCategory::SessionTime,
    ];
}

/// Collected tiers, one slot per signal category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalTiers {
    pub fingerprint: SignalTier,
    pub canvas: SignalTier,
    pub webgl: SignalTier,
    pub audio: SignalTier,
    pub device_memory: SignalTier,
    pub ip: SignalTier,
    pub location: SignalTier,
    pub isp: SignalTier,
    pub proxy: SignalTier,
    pub dns_leak: SignalTier,
    pub language: SignalTier,
    pub timezone: SignalTier,
    pub mouse: SignalTier,
    pub scroll: SignalTier,
    pub session_time: SignalTier,
}

impl SignalTiers {
    pub fn get(&self, category: SignalCategory) -> SignalTier {
        match category {
            SignalCategory::Fingerprint => self.fingerprint,
            SignalCategory::Canvas => self.canvas,
            SignalCategory::Webgl => self.webgl,
            SignalCategory::Audio => self.audio,
            SignalCategory::DeviceMemory => self.device_memory,
            SignalCategory::Ip => self.ip,
            SignalCategory::Location => self.location,
            SignalCategory::Isp => self.isp,
            SignalCategory::Proxy => self.proxy,
            SignalCategory::DnsLeak => self.dns_leak,
            SignalCategory::Language => self.language,
            SignalCategory::Timezone => self.timezone,
            SignalCategory::Mouse => self.mouse,
            SignalCategory::Scroll => self.scroll,
            SignalCategory::SessionTime => self.session_time,
        }
    }

    pub fn set(&mut self, category: SignalCategory, tier: SignalTier) {
        let slot = match category {
            SignalCategory::Fingerprint => &mut self.fingerprint,
            SignalCategory::Canvas => &mut self.canvas,
            SignalCategory::Webgl => &mut self.webgl,
            SignalCategory::Audio => &mut self.audio,
            SignalCategory::DeviceMemory => &mut self.device_memory,
            SignalCategory::Ip => &mut self.ip,
            SignalCategory::Location => &mut self.location,
            SignalCategory::Isp => &mut self.isp,
            SignalCategory::Proxy => &mut self.proxy,
            SignalCategory::DnsLeak => &mut self.dns_leak,
            SignalCategory::Language => &mut self.language,
            SignalCategory::Timezone => &mut self.timezone,
            SignalCategory::Mouse => &mut self.mouse,
            SignalCategory::Scroll => &mut self.scroll,
            SignalCategory::SessionTime => &mut self.session_time,
        };
        *slot = tier;
    }
}

/// Human-readable label per signal, shown next to its tier
pub type SignalLabels = BTreeMap<SignalCategory, String>;

/// Classification produced by a behavior analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternResult {
    pub pattern: String,
    pub risk: SignalTier,
}

impl PatternResult {
    pub fn new(pattern: impl Into<String>, risk: SignalTier) -> Self {
        Self {
            pattern: pattern.into(),
            risk,
        }
    }

    pub fn insufficient_data() -> Self {
        Self::new("Insufficient data", SignalTier::Unknown)
    }
}

/// One entry in the verdict explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub label: String,
    pub is_risk_factor: bool,
}

impl RiskFactor {
    pub fn risk(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            is_risk_factor: true,
        }
    }

    pub fn safe(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            is_risk_factor: false,
        }
    }
}

/// Final classification of the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictTier {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
}

impl VerdictTier {
    pub fn title(&self) -> &'static str {
        match self {
            VerdictTier::Low => "Low Risk",
            VerdictTier::Moderate => "Moderate Risk",
            VerdictTier::High => "High Risk",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VerdictTier::Low => {
                "No significant risk factors detected. This setup appears legitimate to CPA networks."
            }
            VerdictTier::Moderate => {
                "Several risk factors detected. Some CPA networks might flag this setup for additional verification."
            }
            VerdictTier::High => {
                "Multiple high-risk factors detected. This setup would likely be flagged as fraudulent by CPA networks."
            }
        }
    }

    /// Presentation icon class
    pub fn icon_class(&self) -> SignalTier {
        match self {
            VerdictTier::Low => SignalTier::Safe,
            VerdictTier::Moderate => SignalTier::Warning,
            VerdictTier::High => SignalTier::Danger,
        }
    }
}

impl fmt::Display for VerdictTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Score, verdict and explanation derived from the current signal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateVerdict {
    /// Bounded risk score (0-100)
    pub score: u8,
    pub tier: VerdictTier,
    pub risk_factors: Vec<RiskFactor>,
    pub safe_factors: Vec<RiskFactor>,
}

// ============================================================================
// Collaborator result shapes
// ============================================================================

/// Device fingerprint as reported by the fingerprint provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFingerprint {
    /// Stable opaque identifier for the browser
    pub id: String,
    /// Canvas rendering hash or data URL
    pub canvas: Option<String>,
    /// WebGL vendor/renderer string or render hash
    pub webgl: Option<String>,
    /// Audio processing signature
    pub audio: Option<String>,
    /// Reported device memory in gigabytes
    pub device_memory_gb: Option<f64>,
    /// Browser language tag (e.g. "en-US")
    pub language: Option<String>,
    /// Browser IANA timezone (e.g. "Europe/Berlin")
    pub timezone: Option<String>,
}

/// IP geolocation data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInfo {
    pub ip: String,
    /// ISO country code
    pub country: Option<String>,
    pub city: Option<String>,
    pub isp: Option<String>,
    /// IANA timezone of the IP location
    pub timezone: Option<String>,
}

/// Proxy/VPN/Tor detection result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyReport {
    pub vpn: bool,
    pub tor: bool,
    pub proxy: bool,
    pub is_crawler: bool,
    pub bot_status: bool,
    /// Weaker VPN/Tor evidence (recently active exit node, etc.)
    pub partial_vpn_or_tor: bool,
}

/// DNS/WebRTC leak observation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsLeakReport {
    pub leak_detected: bool,
    pub uses_public_dns: bool,
    pub dns_server: Option<String>,
}

/// Raw mailbox lookup from the email reputation service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxCheck {
    pub format: bool,
    pub mx: bool,
    pub smtp_check: bool,
    pub disposable: bool,
}

/// Email reputation attached to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailReputation {
    pub address: String,
    pub domain: String,
    pub has_valid_format: bool,
    pub has_valid_mx: bool,
    pub smtp_reachable: bool,
    pub is_disposable: bool,
    pub is_free_provider: bool,
    /// Risk score (0-100)
    pub risk_score: u8,
}
