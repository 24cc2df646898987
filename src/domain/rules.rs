//! Winter supplement eligibility rules.
//!
//! 1. A household not in pay for December is ineligible and receives nothing.
//! 2. A childless single person receives a base of 60.
//! 3. A childless couple receives a base of 120.
//! 4. A household with children receives 20 per child on top of its base.
//!
//! Two readings of the base for a household with children exist, so the
//! reading is an explicit [`BasePolicy`] rather than a hidden branch.

use super::household::{FamilyComposition, HouseholdRequest};
use super::supplement::{Amount, SupplementResult};
use serde::{Deserialize, Serialize};

/// How the base amount is chosen once a household has children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BasePolicy {
    /// Any child moves the household to the with-children base, whatever
    /// the composition. A single parent with one child gets 120 + 20.
    #[default]
    ChildrenAtCoupleRate,
    /// The base depends on composition only and children are a flat add-on.
    /// A single parent with one child gets 60 + 20.
    CompositionOnly,
}

/// Rates applied by the eligibility engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSchedule {
    pub single_base: Amount,
    pub couple_base: Amount,
    pub with_children_base: Amount,
    pub per_child: Amount,
    pub policy: BasePolicy,
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self::with_policy(BasePolicy::default())
    }
}

impl RateSchedule {
    pub fn with_policy(policy: BasePolicy) -> Self {
        Self {
            single_base: Amount::whole(60),
            couple_base: Amount::whole(120),
            with_children_base: Amount::whole(120),
            per_child: Amount::whole(20),
            policy,
        }
    }

    /// Computes the supplement for a validated household.
    ///
    /// Pure and total: the same request always yields an identical result.
    pub fn compute(&self, request: &HouseholdRequest) -> SupplementResult {
        let key = request.correlation_key.clone();
        if !request.in_pay_for_december {
            return SupplementResult::ineligible(key);
        }

        let base = self.base_amount(request.family_composition, request.number_of_children);
        let children = self.per_child * request.number_of_children;
        SupplementResult::eligible(key, base, children)
    }

    fn base_amount(&self, composition: FamilyComposition, children: u32) -> Amount {
        let composition_base = match composition {
            FamilyComposition::Single => self.single_base,
            FamilyComposition::Couple => self.couple_base,
        };
        match self.policy {
            BasePolicy::ChildrenAtCoupleRate if children > 0 => self.with_children_base,
            BasePolicy::ChildrenAtCoupleRate | BasePolicy::CompositionOnly => composition_base,
        }
    }
}

/// Computes with the default schedule.
pub fn compute(request: &HouseholdRequest) -> SupplementResult {
    RateSchedule::default().compute(request)
}
