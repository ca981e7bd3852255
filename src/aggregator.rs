//! Settlement of a record's payment slots.
//!
//! Each filled slot is normalized, corrected when it is a local-currency
//! channel, converted to base currency and summed. The sum decides the
//! remaining balance and, unless the record is cancelled, the status.

use crate::corrector::{correct_with, CorrectionLimits};
use crate::decimal::Money;
use crate::payment::{Currency, PaymentEntry, PaymentStatus, PAYMENT_SLOTS};
use log::{debug, warn};
use rust_decimal::Decimal;

/// What one payment slot contributed to a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotContribution {
    /// Zero-based slot index.
    pub slot: usize,
    /// Normalized (and possibly corrected) amount in the slot's own currency.
    pub amount: Money,
    /// Amount converted to base currency.
    pub base_amount: Money,
    pub was_corrected: bool,
}

/// Derived payment fields of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub paid_total: Money,
    pub remaining: Money,
    pub status: PaymentStatus,
    /// One entry per non-empty slot.
    pub contributions: Vec<SlotContribution>,
}

impl Settlement {
    /// Returns `true` if any slot amount was rescaled by the corrector.
    pub fn any_corrected(&self) -> bool {
        self.contributions.iter().any(|c| c.was_corrected)
    }
}

/// Settles `entries` with the default correction limits and a one-cent
/// epsilon.
pub fn aggregate(
    total_amount: Money,
    exchange_rate: Option<Decimal>,
    entries: &[PaymentEntry],
    current_status: PaymentStatus,
) -> Settlement {
    aggregate_with(
        &CorrectionLimits::default(),
        Money::CENT,
        total_amount,
        exchange_rate,
        entries,
        current_status,
    )
}

/// Settles `entries` with explicit limits and epsilon.
///
/// Only the first [`PAYMENT_SLOTS`] entries are considered. A remaining
/// balance no larger than `epsilon` counts as fully paid. `Cancelado` is
/// returned unchanged as the status.
pub fn aggregate_with(
    limits: &CorrectionLimits,
    epsilon: Money,
    total_amount: Money,
    exchange_rate: Option<Decimal>,
    entries: &[PaymentEntry],
    current_status: PaymentStatus,
) -> Settlement {
    let mut contributions: Vec<SlotContribution> = entries
        .iter()
        .take(PAYMENT_SLOTS)
        .enumerate()
        .filter_map(|(slot, entry)| contribution(limits, slot, entry, exchange_rate))
        .collect();

    let mut paid_total = Money::ZERO;
    for c in contributions.iter_mut() {
        match paid_total.checked_add(c.base_amount) {
            Some(sum) => paid_total = sum,
            None => {
                warn!(
                    "Slot {} amount {} overflows the paid total, counting it as zero",
                    c.slot + 1,
                    c.base_amount
                );
                c.base_amount = Money::ZERO;
            }
        }
    }

    let remaining = match total_amount.checked_sub(paid_total) {
        Some(remaining) => remaining.max(Money::ZERO),
        None => {
            warn!(
                "Paid total {} overflows against total {}, ignoring payments",
                paid_total, total_amount
            );
            total_amount.max(Money::ZERO)
        }
    };

    let status = match current_status {
        PaymentStatus::Cancelado => PaymentStatus::Cancelado,
        _ => derive_status(paid_total, remaining, epsilon),
    };

    debug!(
        "Settled total {} with {} slot(s): paid {}, remaining {}, status {}",
        total_amount,
        contributions.len(),
        paid_total,
        remaining,
        status
    );

    Settlement {
        paid_total,
        remaining,
        status,
        contributions,
    }
}

fn contribution(
    limits: &CorrectionLimits,
    slot: usize,
    entry: &PaymentEntry,
    exchange_rate: Option<Decimal>,
) -> Option<SlotContribution> {
    let method = entry.method?;
    let raw = entry
        .amount
        .as_ref()
        .map(|amount| amount.to_money())
        .unwrap_or(Money::ZERO);

    let (amount, base_amount, was_corrected) = match method.currency() {
        Currency::Base => (raw, raw, false),
        Currency::Local => {
            let correction = correct_with(limits, raw, method, exchange_rate);
            let base = match exchange_rate {
                Some(rate) if rate > Decimal::ZERO => {
                    correction.amount.checked_div(rate).unwrap_or(Money::ZERO)
                }
                _ => Money::ZERO,
            };
            (correction.amount, base, correction.was_corrected)
        }
    };

    Some(SlotContribution {
        slot,
        amount,
        base_amount,
        was_corrected,
    })
}

fn derive_status(paid_total: Money, remaining: Money, epsilon: Money) -> PaymentStatus {
    if remaining <= epsilon {
        PaymentStatus::Completado
    } else if paid_total.is_positive() {
        PaymentStatus::Incompleto
    } else {
        PaymentStatus::Pendiente
    }
}
