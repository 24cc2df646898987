use super::supplement::SupplementResult;
use serde::{Serialize, Serializer};

/// Per-key state held by the correlation store.
///
/// Starts as `Pending` and moves at most once to `Complete` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultSlot {
    #[default]
    Pending,
    Complete(SupplementResult),
    Failed { reason: String },
}

impl ResultSlot {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResultSlot::Pending)
    }

    pub fn status(&self) -> &'static str {
        match self {
            ResultSlot::Pending => "pending",
            ResultSlot::Complete(_) => "complete",
            ResultSlot::Failed { .. } => "failed",
        }
    }
}

/// Whether a terminal write changed the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    AlreadyTerminal,
}

#[derive(Serialize)]
#[serde(untagged)]
enum SlotBody<'a> {
    Complete(&'a SupplementResult),
    Status {
        status: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<&'a str>,
    },
}

// A complete slot is the bare result object; the other states are
// `{"status": ...}` envelopes.
impl Serialize for ResultSlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let body = match self {
            ResultSlot::Complete(result) => SlotBody::Complete(result),
            ResultSlot::Pending => SlotBody::Status {
                status: self.status(),
                reason: None,
            },
            ResultSlot::Failed { reason } => SlotBody::Status {
                status: self.status(),
                reason: Some(reason),
            },
        };
        body.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::household::CorrelationKey;
    use crate::domain::supplement::Amount;
    use serde_json::json;

    #[test]
    fn test_pending_serialization() {
        let json = serde_json::to_value(ResultSlot::Pending).unwrap();
        assert_eq!(json, json!({"status": "pending"}));
    }

    #[test]
    fn test_failed_serialization() {
        let slot = ResultSlot::Failed {
            reason: "Invalid numberOfChildren".to_string(),
        };
        let json = serde_json::to_value(slot).unwrap();
        assert_eq!(
            json,
            json!({"status": "failed", "reason": "Invalid numberOfChildren"})
        );
    }

    #[test]
    fn test_complete_serializes_as_bare_result() {
        let result = SupplementResult::eligible(
            CorrelationKey::parse("t1").unwrap(),
            Amount::whole(60),
            Amount::ZERO,
        );
        let json = serde_json::to_value(ResultSlot::Complete(result)).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "t1",
                "isEligible": true,
                "baseAmount": 60.0,
                "childrenAmount": 0.0,
                "supplementAmount": 60.0
            })
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ResultSlot::Pending.is_terminal());
        assert!(
            ResultSlot::Failed {
                reason: String::new()
            }
            .is_terminal()
        );
        assert_eq!(ResultSlot::default(), ResultSlot::Pending);
    }
}
