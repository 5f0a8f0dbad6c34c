//! Risk aggregation
//!
//! Folds the current signal tiers and the optional email reputation into a
//! bounded score, a verdict tier and the list of factors that explain it.
//! The verdict is always recomputed from scratch; nothing is accumulated.

use crate::config::RiskWeights;
use crate::types::{
    AggregateVerdict, EmailReputation, RiskFactor, SignalTier, SignalTiers, VerdictTier,
};

/// Upper bound of the risk score
pub const MAX_SCORE: u32 = 100;

/// One row of the weight table: a triggered weight and its factor label
struct Contribution {
    weight: u32,
    factor: RiskFactor,
}

impl Contribution {
    fn risk(weight: u32, label: &str) -> Self {
        Self {
            weight,
            factor: RiskFactor::risk(label),
        }
    }

    fn safe(label: &str) -> Self {
        Self {
            weight: 0,
            factor: RiskFactor::safe(label),
        }
    }

    fn flag(triggered: bool, weight: u32, risk_label: &str, safe_label: &str) -> Self {
        if triggered {
            Self::risk(weight, risk_label)
        } else {
            Self::safe(safe_label)
        }
    }
}

/// Compute the aggregate verdict.
///
/// Every row of the weight table contributes exactly one factor, risk or
/// safe. Email rows only appear when a reputation is attached.
pub fn aggregate(
    tiers: &SignalTiers,
    email: Option<&EmailReputation>,
    weights: &RiskWeights,
) -> AggregateVerdict {
    let mut rows = vec![
        Contribution::flag(
            tiers.device_memory == SignalTier::Warning,
            weights.low_device_memory,
            "Low device memory (possible VM)",
            "Normal device memory",
        ),
        match tiers.proxy {
            SignalTier::Danger => {
                Contribution::risk(weights.proxy_danger, "Using VPN/Proxy/Tor (high risk)")
            }
            SignalTier::Warning => {
                Contribution::risk(weights.proxy_warning, "Possible proxy detected")
            }
            _ => Contribution::safe("No VPN/Proxy detected"),
        },
        Contribution::flag(
            tiers.dns_leak == SignalTier::Danger,
            weights.dns_leak,
            "DNS leaks detected",
            "No DNS leaks detected",
        ),
        Contribution::flag(
            tiers.language == SignalTier::Warning,
            weights.language_mismatch,
            "Language/region mismatch",
            "Language matches location",
        ),
        Contribution::flag(
            tiers.timezone == SignalTier::Warning,
            weights.timezone_mismatch,
            "Timezone/location mismatch",
            "Timezone matches location",
        ),
        Contribution::flag(
            tiers.mouse == SignalTier::Warning,
            weights.unnatural_mouse,
            "Unnatural mouse movements",
            "Natural mouse movements",
        ),
        Contribution::flag(
            tiers.scroll == SignalTier::Warning,
            weights.unnatural_scroll,
            "Unnatural scroll behavior",
            "Natural scroll behavior",
        ),
    ];

    if let Some(email) = email {
        rows.push(Contribution::flag(
            email.is_disposable,
            weights.disposable_email,
            "Disposable email detected",
            "Non-disposable email",
        ));
        rows.push(Contribution::flag(
            !email.has_valid_mx,
            weights.invalid_mx,
            "Invalid email MX records",
            "Valid email MX records",
        ));
    }

    let total: u32 = rows.iter().map(|row| row.weight).fold(0, u32::saturating_add);
    let score = total.min(MAX_SCORE) as u8;

    let (risk_factors, safe_factors): (Vec<RiskFactor>, Vec<RiskFactor>) = rows
        .into_iter()
        .map(|row| row.factor)
        .partition(|factor| factor.is_risk_factor);

    let verdict = AggregateVerdict {
        score,
        tier: verdict_tier(score, weights),
        risk_factors,
        safe_factors,
    };
    log::debug!(
        "aggregate score {} ({}), {} risk factors",
        verdict.score,
        verdict.tier,
        verdict.risk_factors.len()
    );
    verdict
}

/// Map a score onto its verdict tier
pub fn verdict_tier(score: u8, weights: &RiskWeights) -> VerdictTier {
    if score >= weights.high_risk_from {
        VerdictTier::High
    } else if score >= weights.moderate_risk_from {
        VerdictTier::Moderate
    } else {
        VerdictTier::Low
    }
}
