//! Engine configuration.
//!
//! Defaults match the limits the front desk has always worked with. Each
//! value can be overridden through the environment:
//!
//! | Variable                         | Default |
//! |----------------------------------|---------|
//! | `RECON_MAX_LOCAL_AMOUNT`         | 20000   |
//! | `RECON_MIN_CORRECTED_AMOUNT`     | 50      |
//! | `RECON_MAX_BASE_EQUIVALENT`      | 200     |
//! | `RECON_MIN_CORRECTED_EQUIVALENT` | 5       |
//! | `RECON_SETTLEMENT_EPSILON`       | 0.01    |
//! | `RECON_MIN_TOTAL`                | 0.01    |
//! | `RECON_CODE_ATTEMPTS`            | 2       |

use crate::corrector::CorrectionLimits;
use crate::decimal::Money;
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub limits: CorrectionLimits,

    /// A remaining balance no larger than this counts as fully paid.
    pub settlement_epsilon: Money,

    /// Totals below this, zero and negatives included, are raised to it on
    /// creation.
    pub min_total: Money,

    /// Code generation attempts per create, including the first.
    pub code_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            limits: CorrectionLimits::default(),
            settlement_epsilon: Money::CENT,
            min_total: Money::CENT,
            code_attempts: 2,
        }
    }
}

impl EngineConfig {
    /// Loads overrides from `RECON_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads overrides through `lookup`; missing or invalid values keep
    /// their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();
        let money = |key: &str, default: Money| -> Money {
            match lookup(key) {
                Some(raw) => match Money::from_str(&raw) {
                    Ok(value) if value.is_positive() => value,
                    _ => {
                        warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
                        default
                    }
                },
                None => default,
            }
        };

        let limits = CorrectionLimits {
            max_local_amount: money("RECON_MAX_LOCAL_AMOUNT", defaults.limits.max_local_amount),
            min_corrected_amount: money(
                "RECON_MIN_CORRECTED_AMOUNT",
                defaults.limits.min_corrected_amount,
            ),
            max_base_equivalent: money(
                "RECON_MAX_BASE_EQUIVALENT",
                defaults.limits.max_base_equivalent,
            ),
            min_corrected_equivalent: money(
                "RECON_MIN_CORRECTED_EQUIVALENT",
                defaults.limits.min_corrected_equivalent,
            ),
        };

        let code_attempts = match lookup("RECON_CODE_ATTEMPTS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!("Ignoring invalid RECON_CODE_ATTEMPTS={:?}", raw);
                    defaults.code_attempts
                }
            },
            None => defaults.code_attempts,
        };

        EngineConfig {
            limits,
            settlement_epsilon: money("RECON_SETTLEMENT_EPSILON", defaults.settlement_epsilon),
            min_total: money("RECON_MIN_TOTAL", defaults.min_total),
            code_attempts,
        }
    }
}
