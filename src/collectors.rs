//! External collaborator interfaces
//!
//! The core owns no network or browser code. Each signal source sits behind
//! one of these traits; the pipeline holds them as `Arc<dyn Trait>` and
//! treats every call as fallible.

use crate::error::AnalysisError;
use crate::types::{DeviceFingerprint, DnsLeakReport, EmailReputation, NetworkInfo, ProxyReport};
use std::time::Duration;

/// Device fingerprint source (browser fingerprinting library)
#[async_trait::async_trait]
pub trait FingerprintProvider: Send + Sync {
    async fn collect(&self) -> Result<DeviceFingerprint, AnalysisError>;
}

/// IP geolocation and proxy detection services
#[async_trait::async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Geolocation of the caller's public IP. `Ok(None)` means the lookup
    /// completed but returned nothing usable.
    async fn network_info(&self) -> Result<Option<NetworkInfo>, AnalysisError>;

    /// Proxy/VPN/Tor classification for an IP
    async fn check_proxy(&self, ip: &str) -> Result<ProxyReport, AnalysisError>;
}

/// DNS/WebRTC leak probe.
///
/// Implementations observe ICE candidates for `window` and report what they
/// saw; [`crate::network::assess_ice_candidates`] builds the report from raw
/// candidate lines.
#[async_trait::async_trait]
pub trait DnsLeakProbe: Send + Sync {
    async fn observe(&self, public_ip: &str, window: Duration)
        -> Result<DnsLeakReport, AnalysisError>;
}

/// Email reputation service.
///
/// Implementations usually fetch a [`crate::types::MailboxCheck`] and build
/// the result with [`EmailReputation::assess`].
#[async_trait::async_trait]
pub trait EmailVerifier: Send + Sync {
    async fn verify(&self, address: &str) -> Result<EmailReputation, AnalysisError>;
}
