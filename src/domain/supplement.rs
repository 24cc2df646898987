use super::household::CorrelationKey;
use crate::error::SupplementError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

/// A non-negative monetary amount.
///
/// Wraps `rust_decimal::Decimal` so sums stay exact. On the wire it is a JSON
/// number (`60.0`), matching what downstream consumers already parse.
/// Decoding goes through `TryFrom<Decimal>`, so a negative amount is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Amount(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, SupplementError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(SupplementError::Computation(format!(
                "amount must not be negative, got {value}"
            )))
        }
    }

    /// Whole currency units; infallible since `u32` is never negative.
    pub fn whole(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = SupplementError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

/// Scales a per-unit amount by a count (e.g. the per-child rate).
impl Mul<u32> for Amount {
    type Output = Self;
    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

/// Outcome of the eligibility engine for one household.
///
/// `supplement_amount` is always `base_amount + children_amount`, and an
/// ineligible household carries zero in all three amounts. Decoded results
/// are held to the same rules.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase", try_from = "ResultFields")]
pub struct SupplementResult {
    #[serde(rename = "id")]
    pub correlation_key: CorrelationKey,
    pub is_eligible: bool,
    pub base_amount: Amount,
    pub children_amount: Amount,
    pub supplement_amount: Amount,
}

impl SupplementResult {
    pub fn ineligible(correlation_key: CorrelationKey) -> Self {
        Self {
            correlation_key,
            is_eligible: false,
            base_amount: Amount::ZERO,
            children_amount: Amount::ZERO,
            supplement_amount: Amount::ZERO,
        }
    }

    pub fn eligible(correlation_key: CorrelationKey, base: Amount, children: Amount) -> Self {
        Self {
            correlation_key,
            is_eligible: true,
            base_amount: base,
            children_amount: children,
            supplement_amount: base + children,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultFields {
    id: CorrelationKey,
    is_eligible: bool,
    base_amount: Amount,
    children_amount: Amount,
    supplement_amount: Amount,
}

impl TryFrom<ResultFields> for SupplementResult {
    type Error = SupplementError;

    fn try_from(fields: ResultFields) -> Result<Self, Self::Error> {
        let result = if fields.is_eligible {
            Self::eligible(fields.id, fields.base_amount, fields.children_amount)
        } else {
            Self::ineligible(fields.id)
        };
        if (
            result.base_amount,
            result.children_amount,
            result.supplement_amount,
        ) != (
            fields.base_amount,
            fields.children_amount,
            fields.supplement_amount,
        ) {
            return Err(SupplementError::Computation(format!(
                "inconsistent amounts for `{}`",
                result.correlation_key
            )));
        }
        Ok(result)
    }
}
