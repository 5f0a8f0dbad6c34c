//! Signal normalization
//!
//! Maps raw collaborator results onto `SignalTier`s with a display label.
//! Every mapping is total: missing or unmappable input yields `unknown`.

use crate::fingerprint::abbreviate;
use crate::network::{language_matches_country, timezones_match};
use crate::types::{DnsLeakReport, NetworkInfo, ProxyReport, SignalCategory, SignalTier};
use serde::{Deserialize, Serialize};

/// Device memory (GB) below which a machine looks like a small VM
const MIN_DEVICE_MEMORY_GB: f64 = 4.0;

/// A raw observation for a single signal category
#[derive(Debug, Clone, Copy)]
pub enum RawSignal<'a> {
    /// Opaque fingerprint identifier (fingerprint, canvas, webgl or audio)
    Identifier {
        category: SignalCategory,
        value: Option<&'a str>,
    },
    DeviceMemory(Option<f64>),
    Proxy(Option<&'a ProxyReport>),
    DnsLeak(Option<&'a DnsLeakReport>),
    Language {
        browser_language: Option<&'a str>,
        country_code: Option<&'a str>,
    },
    Timezone {
        browser_timezone: Option<&'a str>,
        network_timezone: Option<&'a str>,
    },
}

/// A normalized observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSignal {
    pub category: SignalCategory,
    pub tier: SignalTier,
    pub label: String,
}

impl NormalizedSignal {
    pub fn new(category: SignalCategory, tier: SignalTier, label: impl Into<String>) -> Self {
        Self {
            category,
            tier,
            label: label.into(),
        }
    }
}

/// Normalizer for collaborator results
pub struct Normalizer;

impl Normalizer {
    /// Normalize one raw observation
    pub fn normalize(raw: RawSignal<'_>) -> NormalizedSignal {
        match raw {
            RawSignal::Identifier { category, value } => match value {
                Some(v) if !v.trim().is_empty() => {
                    NormalizedSignal::new(category, SignalTier::Safe, abbreviate(v))
                }
                _ => NormalizedSignal::new(category, SignalTier::Unknown, "Unavailable"),
            },
            RawSignal::DeviceMemory(memory) => normalize_device_memory(memory),
            RawSignal::Proxy(report) => normalize_proxy(report),
            RawSignal::DnsLeak(report) => normalize_dns_leak(report),
            RawSignal::Language {
                browser_language,
                country_code,
            } => match (present(browser_language), present(country_code)) {
                (Some(language), Some(country)) => {
                    let tier = match_tier(language_matches_country(language, country));
                    NormalizedSignal::new(SignalCategory::Language, tier, language)
                }
                _ => NormalizedSignal::new(
                    SignalCategory::Language,
                    SignalTier::Unknown,
                    present(browser_language).unwrap_or("Unknown"),
                ),
            },
            RawSignal::Timezone {
                browser_timezone,
                network_timezone,
            } => match (present(browser_timezone), present(network_timezone)) {
                (Some(browser), Some(network)) => {
                    let tier = match_tier(timezones_match(browser, network));
                    NormalizedSignal::new(SignalCategory::Timezone, tier, browser)
                }
                _ => NormalizedSignal::new(
                    SignalCategory::Timezone,
                    SignalTier::Unknown,
                    present(browser_timezone).unwrap_or("Unknown"),
                ),
            },
        }
    }

    /// IP, location and ISP signals from the geolocation lookup.
    ///
    /// A lookup that completed without data is a danger sign (blocked or
    /// filtered egress); use [`Normalizer::failed`] for a lookup error.
    pub fn network(info: Option<&NetworkInfo>) -> Vec<NormalizedSignal> {
        match info {
            Some(info) => {
                let location = format!(
                    "{}, {}",
                    info.city.as_deref().unwrap_or("Unknown"),
                    info.country.as_deref().unwrap_or("Unknown")
                );
                vec![
                    NormalizedSignal::new(SignalCategory::Ip, SignalTier::Safe, info.ip.clone()),
                    NormalizedSignal::new(SignalCategory::Location, SignalTier::Safe, location),
                    NormalizedSignal::new(
                        SignalCategory::Isp,
                        SignalTier::Safe,
                        info.isp.as_deref().unwrap_or("Unknown"),
                    ),
                ]
            }
            None => [SignalCategory::Ip, SignalCategory::Location, SignalCategory::Isp]
                .into_iter()
                .map(|category| {
                    NormalizedSignal::new(category, SignalTier::Danger, "Failed to fetch")
                })
                .collect(),
        }
    }

    /// Signal for a collaborator call that failed
    pub fn failed(category: SignalCategory) -> NormalizedSignal {
        let label = match category {
            SignalCategory::Proxy => "Proxy check failed",
            SignalCategory::DnsLeak => "DNS check failed",
            SignalCategory::Ip | SignalCategory::Location | SignalCategory::Isp => {
                "Lookup failed"
            }
            _ => "Check failed",
        };
        NormalizedSignal::new(category, SignalTier::Unknown, label)
    }
}

/// Empty strings count as missing
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn match_tier(matches: bool) -> SignalTier {
    if matches {
        SignalTier::Safe
    } else {
        SignalTier::Warning
    }
}

fn normalize_device_memory(memory: Option<f64>) -> NormalizedSignal {
    match memory {
        Some(gb) if gb.is_finite() && gb > 0.0 => {
            let tier = if gb >= MIN_DEVICE_MEMORY_GB {
                SignalTier::Safe
            } else {
                SignalTier::Warning
            };
            NormalizedSignal::new(SignalCategory::DeviceMemory, tier, format!("{gb} GB"))
        }
        _ => NormalizedSignal::new(SignalCategory::DeviceMemory, SignalTier::Unknown, "Unknown"),
    }
}

fn normalize_proxy(report: Option<&ProxyReport>) -> NormalizedSignal {
    let Some(report) = report else {
        return Normalizer::failed(SignalCategory::Proxy);
    };

    let (tier, label) = if report.vpn || report.tor || report.proxy {
        (SignalTier::Danger, "VPN/Proxy/Tor detected")
    } else if report.is_crawler || report.bot_status {
        (SignalTier::Warning, "Possible bot activity")
    } else if report.partial_vpn_or_tor {
        (SignalTier::Warning, "Possible VPN/Tor detected")
    } else {
        (SignalTier::Safe, "No VPN/Proxy detected")
    };
    NormalizedSignal::new(SignalCategory::Proxy, tier, label)
}

fn normalize_dns_leak(report: Option<&DnsLeakReport>) -> NormalizedSignal {
    let Some(report) = report else {
        return Normalizer::failed(SignalCategory::DnsLeak);
    };

    if report.leak_detected {
        return NormalizedSignal::new(
            SignalCategory::DnsLeak,
            SignalTier::Danger,
            "WebRTC leak detected",
        );
    }
    match (&report.dns_server, report.uses_public_dns) {
        (Some(server), true) => NormalizedSignal::new(
            SignalCategory::DnsLeak,
            SignalTier::Warning,
            format!("Using public DNS ({server})"),
        ),
        (None, true) => NormalizedSignal::new(
            SignalCategory::DnsLeak,
            SignalTier::Warning,
            "Using public DNS",
        ),
        _ => NormalizedSignal::new(
            SignalCategory::DnsLeak,
            SignalTier::Safe,
            "No DNS leaks detected",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        let signal = Normalizer::normalize(RawSignal::Identifier {
            category: SignalCategory::Canvas,
            value: Some("data:image/png;base64,iVBORw0KGgo"),
        });
        assert_eq!(signal.tier, SignalTier::Safe);
        assert_eq!(signal.label, "data:image/p...");

        let missing = Normalizer::normalize(RawSignal::Identifier {
            category: SignalCategory::Webgl,
            value: Some("  "),
        });
        assert_eq!(missing.tier, SignalTier::Unknown);
        assert_eq!(missing.category, SignalCategory::Webgl);
    }

    #[test]
    fn test_device_memory() {
        let low = Normalizer::normalize(RawSignal::DeviceMemory(Some(2.0)));
        assert_eq!(low.tier, SignalTier::Warning);
        assert_eq!(low.label, "2 GB");

        let normal = Normalizer::normalize(RawSignal::DeviceMemory(Some(8.0)));
        assert_eq!(normal.tier, SignalTier::Safe);

        let boundary = Normalizer::normalize(RawSignal::DeviceMemory(Some(4.0)));
        assert_eq!(boundary.tier, SignalTier::Safe);

        let unknown = Normalizer::normalize(RawSignal::DeviceMemory(None));
        assert_eq!(unknown.tier, SignalTier::Unknown);
    }

    #[test]
    fn test_proxy_tiers() {
        let cases = [
            (ProxyReport { vpn: true, ..Default::default() }, SignalTier::Danger),
            (ProxyReport { tor: true, is_crawler: true, ..Default::default() }, SignalTier::Danger),
            (ProxyReport { bot_status: true, ..Default::default() }, SignalTier::Warning),
            (ProxyReport { partial_vpn_or_tor: true, ..Default::default() }, SignalTier::Warning),
            (ProxyReport::default(), SignalTier::Safe),
        ];
        for (report, expected) in cases {
            let signal = Normalizer::normalize(RawSignal::Proxy(Some(&report)));
            assert_eq!(signal.tier, expected, "{report:?}");
        }

        let failed = Normalizer::normalize(RawSignal::Proxy(None));
        assert_eq!(failed.tier, SignalTier::Unknown);
        assert_eq!(failed.label, "Proxy check failed");
    }

    #[test]
    fn test_partial_vpn_label() {
        let report = ProxyReport {
            partial_vpn_or_tor: true,
            ..Default::default()
        };
        let signal = Normalizer::normalize(RawSignal::Proxy(Some(&report)));
        assert_eq!(signal.label, "Possible VPN/Tor detected");
    }

    #[test]
    fn test_dns_leak() {
        let leak = DnsLeakReport {
            leak_detected: true,
            uses_public_dns: true,
            dns_server: Some("8.8.8.8".to_string()),
        };
        assert_eq!(
            Normalizer::normalize(RawSignal::DnsLeak(Some(&leak))).tier,
            SignalTier::Danger
        );

        let public = DnsLeakReport {
            leak_detected: false,
            uses_public_dns: true,
            dns_server: Some("1.1.1.1".to_string()),
        };
        let signal = Normalizer::normalize(RawSignal::DnsLeak(Some(&public)));
        assert_eq!(signal.tier, SignalTier::Warning);
        assert_eq!(signal.label, "Using public DNS (1.1.1.1)");

        let clean = DnsLeakReport::default();
        assert_eq!(
            Normalizer::normalize(RawSignal::DnsLeak(Some(&clean))).tier,
            SignalTier::Safe
        );
        assert_eq!(
            Normalizer::normalize(RawSignal::DnsLeak(None)).tier,
            SignalTier::Unknown
        );
    }

    #[test]
    fn test_language() {
        let matched = Normalizer::normalize(RawSignal::Language {
            browser_language: Some("en-US"),
            country_code: Some("US"),
        });
        assert_eq!(matched.tier, SignalTier::Safe);

        let mismatched = Normalizer::normalize(RawSignal::Language {
            browser_language: Some("en-US"),
            country_code: Some("RU"),
        });
        assert_eq!(mismatched.tier, SignalTier::Warning);

        let absent = Normalizer::normalize(RawSignal::Language {
            browser_language: Some("en-US"),
            country_code: None,
        });
        assert_eq!(absent.tier, SignalTier::Unknown);
    }

    #[test]
    fn test_timezone() {
        let matched = Normalizer::normalize(RawSignal::Timezone {
            browser_timezone: Some("Europe/Paris"),
            network_timezone: Some("Europe/Paris"),
        });
        assert_eq!(matched.tier, SignalTier::Safe);

        let mismatched = Normalizer::normalize(RawSignal::Timezone {
            browser_timezone: Some("Europe/Paris"),
            network_timezone: Some("Asia/Tokyo"),
        });
        assert_eq!(mismatched.tier, SignalTier::Warning);

        let absent = Normalizer::normalize(RawSignal::Timezone {
            browser_timezone: None,
            network_timezone: Some("Asia/Tokyo"),
        });
        assert_eq!(absent.tier, SignalTier::Unknown);
    }

    #[test]
    fn test_empty_location_fields_are_unknown() {
        let language = Normalizer::normalize(RawSignal::Language {
            browser_language: Some("en-US"),
            country_code: Some(""),
        });
        assert_eq!(language.tier, SignalTier::Unknown);

        let timezone = Normalizer::normalize(RawSignal::Timezone {
            browser_timezone: Some("Europe/Berlin"),
            network_timezone: Some(""),
        });
        assert_eq!(timezone.tier, SignalTier::Unknown);
        assert_eq!(timezone.label, "Europe/Berlin");

        let blank_browser = Normalizer::normalize(RawSignal::Timezone {
            browser_timezone: Some(" "),
            network_timezone: Some("Europe/Berlin"),
        });
        assert_eq!(blank_browser.tier, SignalTier::Unknown);
        assert_eq!(blank_browser.label, "Unknown");
    }

    #[test]
    fn test_network_info() {
        let info = NetworkInfo {
            ip: "203.0.113.5".to_string(),
            country: Some("DE".to_string()),
            city: None,
            isp: Some("Example ISP".to_string()),
            timezone: Some("Europe/Berlin".to_string()),
        };
        let signals = Normalizer::network(Some(&info));
        assert_eq!(signals.len(), 3);
        assert!(signals.iter().all(|s| s.tier == SignalTier::Safe));
        assert_eq!(signals[1].label, "Unknown, DE");

        let missing = Normalizer::network(None);
        assert!(missing.iter().all(|s| s.tier == SignalTier::Danger));
        assert_eq!(missing[0].label, "Failed to fetch");
    }
}
