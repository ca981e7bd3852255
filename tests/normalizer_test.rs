//! Edge cases for amount parsing and missing-decimal correction.

mod common;

use common::dec;
use reconciliation_engine::{
    correct, is_valid_number, parse_amount, CorrectionReason, Money, PaymentMethod, RawAmount,
};
use rust_decimal::Decimal;

// ==================== PARSING ====================

#[test]
fn test_format_agnostic_round_trip() {
    let expected = dec("5606.39");
    for input in ["5606.39", "5606,39", "5.606,39", "5,606.39"] {
        assert_eq!(parse_amount(input), expected, "input {:?}", input);
    }
}

#[test]
fn test_empty_input_is_zero_and_valid() {
    assert_eq!(parse_amount(""), Money::ZERO);
    assert!(is_valid_number(""));
    assert!(is_valid_number("  "));
}

#[test]
fn test_unparseable_input_degrades_to_zero() {
    for input in ["abc", "$100", "12abc", "1,2,3.4.5"] {
        assert_eq!(parse_amount(input), Money::ZERO, "input {:?}", input);
        assert!(!is_valid_number(input), "input {:?}", input);
    }
}

#[test]
fn test_ambiguous_dotted_groups_collapse_to_integer() {
    // Repeated dots are always grouping, never a fractional part.
    assert_eq!(parse_amount("12.34.56"), dec("123456"));
    assert!(is_valid_number("12.34.56"));
}

#[test]
fn test_single_comma_is_always_decimal() {
    // Even when it looks like a thousands group.
    assert_eq!(parse_amount("1,234"), dec("1.234"));
}

#[test]
fn test_negative_amounts_parse() {
    assert_eq!(parse_amount("-1.234,5"), dec("-1234.5"));
}

#[test]
fn test_numeric_input_passes_through() {
    let raw = RawAmount::Number(Decimal::new(123456789, 4));
    assert_eq!(raw.to_money(), dec("12345.6789"));
}

// ==================== CORRECTION ====================

#[test]
fn test_amounts_at_or_below_ceiling_never_corrected_without_rate() {
    for amount in ["0", "0.01", "50", "5606.39", "19999.99", "20000"] {
        let c = correct(dec(amount), PaymentMethod::PointOfSale, None);
        assert_eq!(c.amount, dec(amount));
        assert!(!c.was_corrected, "amount {}", amount);
    }
}

#[test]
fn test_classic_missing_decimal_case() {
    let method: PaymentMethod = "Punto de venta".parse().unwrap();
    let c = correct(dec("560639"), method, None);
    assert_eq!(c.amount, dec("5606.39"));
    assert!(c.was_corrected);
    assert_eq!(c.reason, CorrectionReason::MissingDecimalPoint);
}

#[test]
fn test_correction_refuses_implausible_result() {
    let c = correct(dec("25000000"), PaymentMethod::PointOfSale, None);
    assert_eq!(c.amount, dec("25000000"));
    assert!(!c.was_corrected);
    assert_eq!(c.reason, CorrectionReason::CandidateOutOfRange);
}

#[test]
fn test_correction_bounds_are_inclusive() {
    // 2000000 / 100 = 20000, the ceiling itself.
    let c = correct(dec("2000000"), PaymentMethod::MobilePayment, None);
    assert!(c.was_corrected);
    assert_eq!(c.amount, dec("20000"));

    // 2000000.01 / 100 is just past it.
    let c = correct(dec("2000000.01"), PaymentMethod::MobilePayment, None);
    assert!(!c.was_corrected);
}

#[test]
fn test_only_one_rescale_per_amount() {
    // 2000000 -> 20000 by the ceiling check; at rate 1 the equivalent check
    // would divide again, but it does not run after a correction.
    let c = correct(dec("2000000"), PaymentMethod::CashLocal, Some(Decimal::ONE));
    assert_eq!(c.amount, dec("20000"));
    assert_eq!(c.reason, CorrectionReason::MissingDecimalPoint);
}

#[test]
fn test_every_base_channel_passes_through() {
    for method in PaymentMethod::ALL.into_iter().filter(|m| !m.is_local()) {
        let c = correct(dec("560639"), method, Some(Decimal::new(36, 0)));
        assert_eq!(c.amount, dec("560639"));
        assert_eq!(c.reason, CorrectionReason::BaseCurrency);
    }
}
