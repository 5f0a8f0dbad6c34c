//! Email reputation assessment
//!
//! Combines a raw mailbox lookup with local provider heuristics into an
//! `EmailReputation`, and maps a reputation onto per-field display tiers.

use crate::error::AnalysisError;
use crate::types::{EmailReputation, MailboxCheck, SignalTier};
use serde::{Deserialize, Serialize};

/// Free webmail suffixes
const FREE_PROVIDER_SUFFIXES: [&str; 3] = ["@gmail.com", "@yahoo.com", "@outlook.com"];

/// Throwaway inbox domains the lookup service sometimes misses
const DISPOSABLE_DOMAINS: [&str; 3] = ["temp-mail.org", "mailinator.com", "guerrillamail.com"];

const DISPOSABLE_PENALTY: u32 = 70;
const MISSING_MX_PENALTY: u32 = 50;
const BAD_FORMAT_PENALTY: u32 = 30;
const FREE_PROVIDER_PENALTY: u32 = 10;

/// Trim and validate a user-supplied address before any lookup
pub fn validate_address(address: &str) -> Result<String, AnalysisError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::Validation(
            "email address is empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

impl EmailReputation {
    /// Build a reputation from a mailbox lookup.
    ///
    /// Risk score: +70 disposable, +50 no MX, +30 bad format, +10 free
    /// provider, capped at 100. Only the lookup's own disposable flag feeds
    /// the score; the local domain list only affects `is_disposable`.
    pub fn assess(address: &str, check: &MailboxCheck) -> Self {
        let is_free_provider = FREE_PROVIDER_SUFFIXES
            .iter()
            .any(|suffix| address.ends_with(suffix));
        let locally_disposable = DISPOSABLE_DOMAINS
            .iter()
            .any(|domain| address.contains(domain));

        let mut score = 0u32;
        if check.disposable {
            score += DISPOSABLE_PENALTY;
        }
        if !check.mx {
            score += MISSING_MX_PENALTY;
        }
        if !check.format {
            score += BAD_FORMAT_PENALTY;
        }
        if is_free_provider {
            score += FREE_PROVIDER_PENALTY;
        }

        Self {
            address: address.to_string(),
            domain: address.split('@').nth(1).unwrap_or_default().to_string(),
            has_valid_format: check.format,
            has_valid_mx: check.mx,
            smtp_reachable: check.smtp_check,
            is_disposable: check.disposable || locally_disposable,
            is_free_provider,
            risk_score: score.min(100) as u8,
        }
    }
}

/// Display tiers for each email field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTiers {
    pub domain: SignalTier,
    pub mx: SignalTier,
    pub disposable: SignalTier,
    pub smtp: SignalTier,
    pub risk: SignalTier,
}

impl EmailTiers {
    pub fn from_reputation(reputation: &EmailReputation) -> Self {
        let disposable = if reputation.is_disposable {
            SignalTier::Danger
        } else {
            SignalTier::Safe
        };
        let failed_check = if reputation.is_disposable {
            SignalTier::Danger
        } else {
            SignalTier::Warning
        };

        Self {
            domain: disposable,
            mx: if reputation.has_valid_mx {
                SignalTier::Safe
            } else {
                failed_check
            },
            disposable,
            smtp: if reputation.smtp_reachable {
                SignalTier::Safe
            } else {
                failed_check
            },
            risk: match reputation.risk_score {
                s if s > 70 => SignalTier::Danger,
                s if s > 30 => SignalTier::Warning,
                _ => SignalTier::Safe,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clean_check() -> MailboxCheck {
        MailboxCheck {
            format: true,
            mx: true,
            smtp_check: true,
            disposable: false,
        }
    }

    #[test]
    fn test_validate_address() {
        assert_eq!(validate_address("  user@example.com \n").unwrap(), "user@example.com");
        assert!(matches!(validate_address("   "), Err(AnalysisError::Validation(_))));
    }

    #[test]
    fn test_clean_corporate_address() {
        let rep = EmailReputation::assess("jane@example.com", &clean_check());
        assert_eq!(rep.domain, "example.com");
        assert_eq!(rep.risk_score, 0);
        assert!(!rep.is_free_provider);
        assert!(!rep.is_disposable);
    }

    #[test]
    fn test_free_provider_penalty() {
        let rep = EmailReputation::assess("jane@gmail.com", &clean_check());
        assert!(rep.is_free_provider);
        assert_eq!(rep.risk_score, 10);
    }

    #[test]
    fn test_score_is_capped() {
        let check = MailboxCheck {
            format: false,
            mx: false,
            smtp_check: false,
            disposable: true,
        };
        let rep = EmailReputation::assess("x@yahoo.com", &check);
        assert_eq!(rep.risk_score, 100);
    }

    #[test]
    fn test_local_disposable_list() {
        let rep = EmailReputation::assess("bot@mailinator.com", &clean_check());
        assert!(rep.is_disposable);
        // Local detection does not change the score
        assert_eq!(rep.risk_score, 0);
    }

    #[test]
    fn test_missing_domain() {
        let rep = EmailReputation::assess("no-at-sign", &clean_check());
        assert_eq!(rep.domain, "");
    }

    #[test]
    fn test_tiers_for_disposable() {
        let check = MailboxCheck {
            format: true,
            mx: false,
            smtp_check: false,
            disposable: true,
        };
        let rep = EmailReputation::assess("a@temp-mail.org", &check);
        let tiers = EmailTiers::from_reputation(&rep);

        assert_eq!(
            tiers,
            EmailTiers {
                domain: SignalTier::Danger,
                mx: SignalTier::Danger,
                disposable: SignalTier::Danger,
                smtp: SignalTier::Danger,
                risk: SignalTier::Danger,
            }
        );
    }

    #[test]
    fn test_tiers_for_unreachable_mailbox() {
        let check = MailboxCheck {
            smtp_check: false,
            ..clean_check()
        };
        let rep = EmailReputation::assess("a@gmail.com", &check);
        let tiers = EmailTiers::from_reputation(&rep);

        assert_eq!(tiers.smtp, SignalTier::Warning);
        assert_eq!(tiers.mx, SignalTier::Safe);
        assert_eq!(tiers.risk, SignalTier::Safe);
    }

    #[test]
    fn test_risk_tier_boundaries() {
        let mut rep = EmailReputation::assess("a@example.com", &clean_check());
        rep.risk_score = 30;
        assert_eq!(EmailTiers::from_reputation(&rep).risk, SignalTier::Safe);
        rep.risk_score = 31;
        assert_eq!(EmailTiers::from_reputation(&rep).risk, SignalTier::Warning);
        rep.risk_score = 71;
        assert_eq!(EmailTiers::from_reputation(&rep).risk, SignalTier::Danger);
    }
}
