// Change Domain Model - templates and per-run descriptors

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};
use super::target::{Category, ChangeTarget};
use super::value::{ConfigValue, Observed};

/// Descriptor ID (stable target key, e.g. `tcp/ecncapability`)
pub type DescriptorId = String;

/// Static description of one change inside a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSpec {
    pub id: DescriptorId,
    pub category: Category,
    pub target: ChangeTarget,
    pub desired: ConfigValue,
    pub order: u32,
}

impl ChangeSpec {
    /// Create a change, rejecting values whose kind does not fit the target
    pub fn new(target: ChangeTarget, desired: ConfigValue, order: u32) -> Result<Self> {
        let expected = target.value_kind();
        if desired.kind() != expected {
            return Err(DomainError::ValueKindMismatch {
                target: target.key(),
                expected: expected.to_string(),
                found: desired.kind().to_string(),
            });
        }

        Ok(Self {
            id: target.key(),
            category: target.category(),
            target,
            desired,
            order,
        })
    }

    pub(crate) fn with_order(&self, order: u32) -> Self {
        Self {
            order,
            ..self.clone()
        }
    }
}

/// One atomic change prepared for a run
///
/// Built fresh per orchestration run, after the verification probe captured
/// the value the target holds before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDescriptor {
    pub id: DescriptorId,
    pub category: Category,
    pub target: ChangeTarget,
    pub desired: ConfigValue,
    pub previous: Observed,
    pub order: u32,
}

impl ChangeDescriptor {
    pub fn capture(spec: &ChangeSpec, previous: Observed) -> Self {
        Self {
            id: spec.id.clone(),
            category: spec.category,
            target: spec.target.clone(),
            desired: spec.desired.clone(),
            previous,
            order: spec.order,
        }
    }

    /// Target already holds the desired value
    pub fn is_already_applied(&self) -> bool {
        self.previous.matches(&self.desired)
    }

    /// A cache flush took effect even though entries remain
    ///
    /// Resolvers keep pinned entries (hosts file) and refill from background
    /// lookups, so an emptied cache rarely reads exactly zero. The flush
    /// counts when the entry count did not grow past the count before it.
    pub fn is_flush_confirmed_by(&self, observed: &Observed) -> bool {
        if !matches!(self.target, ChangeTarget::Cache { .. }) {
            return false;
        }
        match (self.previous.value(), observed.value()) {
            (Some(ConfigValue::Number(before)), Some(ConfigValue::Number(after))) => {
                after <= before
            }
            _ => false,
        }
    }
}
