use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Caller-chosen identifier linking a submitted household to its result.
///
/// Always non-empty and free of topic separators, so it can be used as the
/// last level of a topic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CorrelationKey(String);

impl CorrelationKey {
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::MissingKey);
        }
        if value.contains(['/', '+', '#']) {
            return Err(ValidationError::InvalidKey);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CorrelationKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CorrelationKey> for String {
    fn from(key: CorrelationKey) -> Self {
        key.0
    }
}

impl Borrow<str> for CorrelationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum FamilyComposition {
    Single,
    Couple,
}

impl FamilyComposition {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "single" => Some(Self::Single),
            "couple" => Some(Self::Couple),
            _ => None,
        }
    }
}

/// A household that passed validation and may be handed to the engine.
///
/// Serializes to the canonical wire form published on the input topic.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdRequest {
    #[serde(rename = "id")]
    pub correlation_key: CorrelationKey,
    pub family_composition: FamilyComposition,
    pub number_of_children: u32,
    #[serde(rename = "familyUnitInPayForDecember")]
    pub in_pay_for_december: bool,
}
