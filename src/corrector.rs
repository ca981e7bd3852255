//! Recovery of local-currency amounts that lost their decimal point.
//!
//! A point-of-sale slip reading `5.606,39` is sometimes typed as `560639`,
//! leaving the amount a hundred times too large. Two independent checks look
//! for that: an absolute ceiling on local amounts, and a ceiling on what the
//! amount is worth in base currency. Either one only rescales when the
//! rescaled value lands back inside its plausible range, so amounts a person
//! could have meant are never touched.

use crate::decimal::Money;
use crate::payment::PaymentMethod;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounds on what a single lab line item can plausibly cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionLimits {
    /// Local amounts above this are suspected of a missing decimal point.
    pub max_local_amount: Money,
    /// A rescaled local amount must be at least this much.
    pub min_corrected_amount: Money,
    /// Base-currency equivalents above this are suspected.
    pub max_base_equivalent: Money,
    /// A rescaled base-currency equivalent must be at least this much.
    pub min_corrected_equivalent: Money,
}

impl Default for CorrectionLimits {
    fn default() -> Self {
        CorrectionLimits {
            max_local_amount: Money::from_units(20_000),
            min_corrected_amount: Money::from_units(50),
            max_base_equivalent: Money::from_units(200),
            min_corrected_equivalent: Money::from_units(5),
        }
    }
}

/// Why [`correct`] did or did not rescale an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionReason {
    /// Base-currency channels are never corrected.
    BaseCurrency,
    /// No check fired.
    Plausible,
    /// The local amount exceeded its ceiling and was divided by 100.
    MissingDecimalPoint,
    /// The base-currency equivalent exceeded its ceiling and the amount was
    /// divided by 100.
    EquivalentTooHigh,
    /// A check fired but the rescaled value was itself implausible.
    CandidateOutOfRange,
}

impl fmt::Display for CorrectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CorrectionReason::BaseCurrency => "base-currency channel",
            CorrectionReason::Plausible => "amount within plausible range",
            CorrectionReason::MissingDecimalPoint => "local amount above ceiling, divided by 100",
            CorrectionReason::EquivalentTooHigh => {
                "base-currency equivalent above ceiling, divided by 100"
            }
            CorrectionReason::CandidateOutOfRange => {
                "rescaled amount implausible, left unchanged"
            }
        };
        f.write_str(text)
    }
}

/// Outcome of running an amount through the corrector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub amount: Money,
    pub was_corrected: bool,
    pub reason: CorrectionReason,
}

impl Correction {
    fn unchanged(amount: Money, reason: CorrectionReason) -> Self {
        Correction {
            amount,
            was_corrected: false,
            reason,
        }
    }

    fn rescaled(amount: Money, reason: CorrectionReason) -> Self {
        Correction {
            amount,
            was_corrected: true,
            reason,
        }
    }
}

/// Corrects `amount` with the default [`CorrectionLimits`].
pub fn correct(amount: Money, method: PaymentMethod, exchange_rate: Option<Decimal>) -> Correction {
    correct_with(&CorrectionLimits::default(), amount, method, exchange_rate)
}

/// Corrects `amount` against explicit limits.
///
/// The exchange-rate check only runs when the ceiling check did not already
/// rescale the amount, so an amount is divided by 100 at most once.
pub fn correct_with(
    limits: &CorrectionLimits,
    amount: Money,
    method: PaymentMethod,
    exchange_rate: Option<Decimal>,
) -> Correction {
    if !method.is_local() {
        return Correction::unchanged(amount, CorrectionReason::BaseCurrency);
    }

    let mut reason = CorrectionReason::Plausible;

    if amount > limits.max_local_amount {
        if let Some(candidate) = amount.checked_div(Decimal::ONE_HUNDRED) {
            if candidate >= limits.min_corrected_amount && candidate <= limits.max_local_amount {
                debug!(
                    "{}: {} looks like a missing decimal point, using {}",
                    method, amount, candidate
                );
                return Correction::rescaled(candidate, CorrectionReason::MissingDecimalPoint);
            }
        }
        reason = CorrectionReason::CandidateOutOfRange;
    }

    let rate = match exchange_rate {
        Some(rate) if rate > Decimal::ZERO => rate,
        _ => return Correction::unchanged(amount, reason),
    };

    let equivalent = match amount.checked_div(rate) {
        Some(equivalent) => equivalent,
        None => return Correction::unchanged(amount, reason),
    };

    if equivalent > limits.max_base_equivalent {
        let rescaled = amount
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|candidate| candidate.checked_div(rate).map(|eq| (candidate, eq)));

        if let Some((candidate, candidate_equivalent)) = rescaled {
            if candidate_equivalent >= limits.min_corrected_equivalent
                && candidate_equivalent <= limits.max_base_equivalent
            {
                debug!(
                    "{}: {} is worth {} at rate {}, using {}",
                    method, amount, equivalent, rate, candidate
                );
                return Correction::rescaled(candidate, CorrectionReason::EquivalentTooHigh);
            }
        }
        reason = CorrectionReason::CandidateOutOfRange;
    }

    Correction::unchanged(amount, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn test_missing_decimal_point_is_rescaled() {
        let c = correct(dec("560639"), PaymentMethod::PointOfSale, None);
        assert_eq!(c.amount, dec("5606.39"));
        assert!(c.was_corrected);
        assert_eq!(c.reason, CorrectionReason::MissingDecimalPoint);
    }

    #[test]
    fn test_implausible_candidate_is_refused() {
        let c = correct(dec("25000000"), PaymentMethod::PointOfSale, None);
        assert_eq!(c.amount, dec("25000000"));
        assert!(!c.was_corrected);
        assert_eq!(c.reason, CorrectionReason::CandidateOutOfRange);
    }

    #[test]
    fn test_candidate_below_floor_is_refused() {
        // 20001 / 100 = 200.01, below a raised floor of 500.
        let limits = CorrectionLimits {
            min_corrected_amount: Money::from_units(500),
            ..CorrectionLimits::default()
        };
        let c = correct_with(&limits, dec("20001"), PaymentMethod::MobilePayment, None);
        assert!(!c.was_corrected);
        assert_eq!(c.amount, dec("20001"));
    }

    #[test]
    fn test_base_currency_passes_through() {
        let c = correct(dec("560639"), PaymentMethod::Zelle, Some(Decimal::new(36, 0)));
        assert_eq!(c.amount, dec("560639"));
        assert!(!c.was_corrected);
        assert_eq!(c.reason, CorrectionReason::BaseCurrency);
    }

    #[test]
    fn test_equivalent_ceiling_rescales() {
        // 15000 at 36 per unit is 416.67, 150 is 4.17: refused.
        let c = correct(dec("15000"), PaymentMethod::PointOfSale, Some(Decimal::new(36, 0)));
        assert!(!c.was_corrected);

        // 9000 at 11.2 per unit is 803.57, 90 is 8.04: accepted.
        let c = correct(dec("9000"), PaymentMethod::PointOfSale, Some(Decimal::new(112, 1)));
        assert!(c.was_corrected);
        assert_eq!(c.amount, dec("90"));
        assert_eq!(c.reason, CorrectionReason::EquivalentTooHigh);
    }

    #[test]
    fn test_plausible_local_amount_with_rate_untouched() {
        let c = correct(dec("1120"), PaymentMethod::PointOfSale, Some(Decimal::new(112, 1)));
        assert_eq!(c.amount, dec("1120"));
        assert!(!c.was_corrected);
        assert_eq!(c.reason, CorrectionReason::Plausible);
    }

    #[test]
    fn test_non_positive_rate_skips_equivalent_check() {
        let c = correct(dec("9000"), PaymentMethod::CashLocal, Some(Decimal::ZERO));
        assert!(!c.was_corrected);
        let c = correct(dec("9000"), PaymentMethod::CashLocal, Some(Decimal::new(-5, 0)));
        assert!(!c.was_corrected);
    }
}
