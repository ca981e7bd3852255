//! Payment channels, statuses and the embedded payment slot model.

use crate::normalizer::RawAmount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of payment slots carried by every record.
pub const PAYMENT_SLOTS: usize = 4;

/// Which currency a payment channel settles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// The currency `total_amount` is denominated in.
    Base,
    /// The secondary currency, converted through the record's exchange rate.
    Local,
}

/// Closed set of payment channels.
///
/// Serialized with the labels the front desk uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Efectivo $")]
    CashBase,
    #[serde(rename = "Zelle")]
    Zelle,
    #[serde(rename = "Binance")]
    Binance,
    #[serde(rename = "Transferencia $")]
    TransferBase,
    #[serde(rename = "Punto de venta")]
    PointOfSale,
    #[serde(rename = "Pago movil")]
    MobilePayment,
    #[serde(rename = "Transferencia Bs")]
    TransferLocal,
    #[serde(rename = "Efectivo Bs")]
    CashLocal,
}

impl PaymentMethod {
    /// Every channel, base-currency ones first.
    pub const ALL: [PaymentMethod; 8] = [
        PaymentMethod::CashBase,
        PaymentMethod::Zelle,
        PaymentMethod::Binance,
        PaymentMethod::TransferBase,
        PaymentMethod::PointOfSale,
        PaymentMethod::MobilePayment,
        PaymentMethod::TransferLocal,
        PaymentMethod::CashLocal,
    ];

    /// The currency this channel settles in.
    pub fn currency(self) -> Currency {
        match self {
            PaymentMethod::CashBase
            | PaymentMethod::Zelle
            | PaymentMethod::Binance
            | PaymentMethod::TransferBase => Currency::Base,
            PaymentMethod::PointOfSale
            | PaymentMethod::MobilePayment
            | PaymentMethod::TransferLocal
            | PaymentMethod::CashLocal => Currency::Local,
        }
    }

    /// Returns `true` for local-currency channels.
    pub fn is_local(self) -> bool {
        self.currency() == Currency::Local
    }

    /// Display label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::CashBase => "Efectivo $",
            PaymentMethod::Zelle => "Zelle",
            PaymentMethod::Binance => "Binance",
            PaymentMethod::TransferBase => "Transferencia $",
            PaymentMethod::PointOfSale => "Punto de venta",
            PaymentMethod::MobilePayment => "Pago movil",
            PaymentMethod::TransferLocal => "Transferencia Bs",
            PaymentMethod::CashLocal => "Efectivo Bs",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string names no known payment channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

/// Payment status of a record.
///
/// `Cancelado` is sticky: it is only ever set or cleared explicitly and is
/// never produced or replaced by settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pendiente,
    Incompleto,
    Completado,
    Cancelado,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pendiente => "Pendiente",
            PaymentStatus::Incompleto => "Incompleto",
            PaymentStatus::Completado => "Completado",
            PaymentStatus::Cancelado => "Cancelado",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the payment slots embedded in a record.
///
/// A slot without a method is empty and contributes nothing to settlement,
/// whatever its other fields hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub method: Option<PaymentMethod>,

    /// Amount as captured, before normalization and correction.
    pub amount: Option<RawAmount>,

    pub reference: Option<String>,

    /// Display-only rate for local-currency slots. Settlement always uses
    /// the record's exchange rate instead.
    pub conversion: Option<Decimal>,
}

impl PaymentEntry {
    /// Creates a filled slot.
    pub fn new(method: PaymentMethod, amount: impl Into<RawAmount>) -> Self {
        PaymentEntry {
            method: Some(method),
            amount: Some(amount.into()),
            reference: None,
            conversion: None,
        }
    }

    /// Returns `true` if no method is set.
    pub fn is_empty(&self) -> bool {
        self.method.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_partition() {
        let local: Vec<_> = PaymentMethod::ALL
            .into_iter()
            .filter(|m| m.is_local())
            .collect();
        assert_eq!(
            local,
            vec![
                PaymentMethod::PointOfSale,
                PaymentMethod::MobilePayment,
                PaymentMethod::TransferLocal,
                PaymentMethod::CashLocal,
            ]
        );
        assert_eq!(PaymentMethod::Zelle.currency(), Currency::Base);
    }

    #[test]
    fn test_parse_method_from_label() {
        assert_eq!(
            "Punto de venta".parse::<PaymentMethod>(),
            Ok(PaymentMethod::PointOfSale)
        );
        assert_eq!(
            "  efectivo bs ".parse::<PaymentMethod>(),
            Ok(PaymentMethod::CashLocal)
        );
        assert!("Cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_empty_slot() {
        assert!(PaymentEntry::default().is_empty());
        let mut entry = PaymentEntry::new(PaymentMethod::Zelle, "10");
        assert!(!entry.is_empty());
        entry.method = None;
        assert!(entry.is_empty());
    }

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pendiente);
        assert_eq!(PaymentStatus::Cancelado.to_string(), "Cancelado");
    }
}
