//! Network consistency checks
//!
//! Predicates comparing what the browser reports about itself against what
//! the network location says, plus DNS/WebRTC leak assessment from raw ICE
//! candidates gathered by a probe.

use crate::types::DnsLeakReport;

/// Well-known public resolvers
pub const KNOWN_PUBLIC_DNS: [&str; 8] = [
    "8.8.8.8",
    "8.8.4.4",
    "1.1.1.1",
    "1.0.0.1",
    "9.9.9.9",
    "149.112.112.112",
    "208.67.222.222",
    "208.67.220.220",
];

/// Country code → primary language subtag
const COUNTRY_LANGUAGES: [(&str, &str); 9] = [
    ("US", "en"),
    ("GB", "en"),
    ("DE", "de"),
    ("FR", "fr"),
    ("ES", "es"),
    ("IT", "it"),
    ("JP", "ja"),
    ("CN", "zh"),
    ("RU", "ru"),
];

/// Whether the browser language plausibly belongs to the IP country.
///
/// Matches when the language tag contains the lowercased country code, or
/// when the country's primary language appears in the tag.
pub fn language_matches_country(language: &str, country_code: &str) -> bool {
    if language.contains(&country_code.to_lowercase()) {
        return true;
    }
    COUNTRY_LANGUAGES
        .iter()
        .any(|(country, lang)| *country == country_code && language.contains(lang))
}

/// Whether two IANA timezones agree, either exactly or by city component
pub fn timezones_match(browser_timezone: &str, network_timezone: &str) -> bool {
    if browser_timezone.is_empty() || network_timezone.is_empty() {
        return false;
    }
    browser_timezone == network_timezone
        || city_component(browser_timezone) == city_component(network_timezone)
}

fn city_component(timezone: &str) -> &str {
    timezone.rsplit('/').next().unwrap_or(timezone)
}

/// Build a leak report from ICE candidate lines observed during the probe window.
///
/// Any UDP candidate that does not carry the public IP exposes another
/// address and counts as a leak. The first exposed address is reported as
/// the resolver seen, flagged when it is a well-known public one. A short
/// line still counts as a leak but reports no resolver.
pub fn assess_ice_candidates<S: AsRef<str>>(public_ip: &str, candidates: &[S]) -> DnsLeakReport {
    let mut leak_detected = false;
    let mut exposed: Vec<&str> = Vec::new();

    for candidate in candidates {
        let line = candidate.as_ref();
        if line.contains("udp") && !line.contains(public_ip) {
            leak_detected = true;
            if let Some(address) = line.split(' ').nth(4) {
                exposed.push(address);
            }
        }
    }

    let dns_server = exposed.first().map(|s| s.to_string());
    let uses_public_dns = dns_server
        .as_deref()
        .map(|server| KNOWN_PUBLIC_DNS.contains(&server))
        .unwrap_or(false);

    DnsLeakReport {
        leak_detected,
        uses_public_dns,
        dns_server,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_contains_country_code() {
        assert!(language_matches_country("pt-br", "BR"));
        assert!(language_matches_country("de-DE", "DE"));
    }

    #[test]
    fn test_language_table() {
        assert!(language_matches_country("en-US", "US"));
        assert!(language_matches_country("en-GB", "GB"));
        assert!(language_matches_country("ja-JP", "JP"));
        assert!(language_matches_country("zh-CN", "CN"));
    }

    #[test]
    fn test_language_mismatch() {
        assert!(!language_matches_country("en-US", "DE"));
        assert!(!language_matches_country("ru-RU", "FR"));
        assert!(!language_matches_country("", "US"));
    }

    #[test]
    fn test_timezone_match() {
        assert!(timezones_match("Europe/Berlin", "Europe/Berlin"));
        assert!(timezones_match("America/Indiana/Indianapolis", "America/Indianapolis"));
        assert!(!timezones_match("Europe/Berlin", "America/New_York"));
        assert!(!timezones_match("", "Europe/Berlin"));
    }

    #[test]
    fn test_no_candidates_no_leak() {
        let report = assess_ice_candidates::<&str>("203.0.113.5", &[]);
        assert_eq!(report, DnsLeakReport::default());
    }

    #[test]
    fn test_candidate_with_public_ip_is_not_a_leak() {
        let candidates = ["candidate:1 1 udp 1677729535 203.0.113.5 54321 typ srflx"];
        let report = assess_ice_candidates("203.0.113.5", &candidates);
        assert!(!report.leak_detected);
    }

    #[test]
    fn test_foreign_udp_candidate_leaks() {
        let candidates = [
            "candidate:1 1 tcp 1518280447 10.0.0.2 9 typ host",
            "candidate:2 1 udp 2122260223 192.168.1.20 61234 typ host",
            "candidate:3 1 udp 1677729535 8.8.8.8 54321 typ srflx",
        ];
        let report = assess_ice_candidates("203.0.113.5", &candidates);
        assert!(report.leak_detected);
        assert_eq!(report.dns_server.as_deref(), Some("192.168.1.20"));
        assert!(!report.uses_public_dns);
    }

    #[test]
    fn test_truncated_udp_candidate_still_leaks() {
        let report = assess_ice_candidates("203.0.113.5", &["candidate:1 1 udp"]);
        assert!(report.leak_detected);
        assert!(!report.uses_public_dns);
        assert_eq!(report.dns_server, None);
    }

    #[test]
    fn test_public_resolver_flagged() {
        let candidates = ["candidate:3 1 udp 1677729535 1.1.1.1 54321 typ srflx"];
        let report = assess_ice_candidates("203.0.113.5", &candidates);
        assert!(report.leak_detected);
        assert!(report.uses_public_dns);
    }
}
