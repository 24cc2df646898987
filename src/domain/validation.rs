use super::household::{CorrelationKey, FamilyComposition, HouseholdRequest};
use crate::error::ValidationError;
use serde_json::{Map, Value};

const KEY_FIELDS: [&str; 2] = ["id", "correlationKey"];
const COMPOSITION_FIELD: &str = "familyComposition";
const CHILDREN_FIELD: &str = "numberOfChildren";
const IN_PAY_FIELDS: [&str; 2] = ["familyUnitInPayForDecember", "decemberPayInPayUnit"];

/// Checks a raw submission and turns it into a [`HouseholdRequest`].
///
/// Fields are checked in a fixed order (key, composition, children, in-pay
/// flag) and the first problem found is reported. Nothing is mutated.
pub fn validate(raw: &Value) -> Result<HouseholdRequest, ValidationError> {
    let fields = raw.as_object().ok_or(ValidationError::MissingKey)?;

    let correlation_key = match field(fields, &KEY_FIELDS) {
        Some(Value::String(key)) => CorrelationKey::parse(key.as_str())?,
        _ => return Err(ValidationError::MissingKey),
    };

    let family_composition = fields
        .get(COMPOSITION_FIELD)
        .and_then(Value::as_str)
        .and_then(FamilyComposition::from_wire)
        .ok_or(ValidationError::InvalidComposition)?;

    // `as_u64` is `None` for floats, negatives and non-numbers alike.
    let number_of_children = fields
        .get(CHILDREN_FIELD)
        .and_then(Value::as_u64)
        .and_then(|count| u32::try_from(count).ok())
        .ok_or(ValidationError::InvalidChildCount)?;

    let in_pay_for_december = field(fields, &IN_PAY_FIELDS)
        .and_then(Value::as_bool)
        .ok_or(ValidationError::InvalidEligibilityFlag)?;

    Ok(HouseholdRequest {
        correlation_key,
        family_composition,
        number_of_children,
        in_pay_for_december,
    })
}

fn field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}
