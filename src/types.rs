// src/types.rs
//
// Small closed enumerations shared across the simulation: the defender's
// action set, the attacker's target layer and attack intensity.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Defender action for a single timestep.
///
/// Discriminants double as Q-table column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Preventive hardening (identify + protect).
    Passive = 0,
    /// Detection / response boost.
    Active = 1,
    /// Remediation.
    Recover = 2,
}

impl Action {
    /// Number of defender actions.
    pub const COUNT: usize = 3;

    /// All actions in index order.
    pub const ALL: [Action; Action::COUNT] = [Action::Passive, Action::Active, Action::Recover];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Map a table column / random draw back to an action.
    pub fn from_index(index: usize) -> Result<Action, SimError> {
        match index {
            0 => Ok(Action::Passive),
            1 => Ok(Action::Active),
            2 => Ok(Action::Recover),
            _ => Err(SimError::InvalidAction { index }),
        }
    }

    /// Stable uppercase name (used in logs and summaries).
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Passive => "PASSIVE",
            Action::Active => "ACTIVE",
            Action::Recover => "RECOVER",
        }
    }
}

/// Infrastructure layer an attack is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackTarget {
    None = 0,
    It = 1,
    Ot = 2,
}

impl AttackTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackTarget::None => "NONE",
            AttackTarget::It => "IT",
            AttackTarget::Ot => "OT",
        }
    }
}

/// Severity of an attack. `None` only accompanies `AttackTarget::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intensity {
    None = 0,
    Low = 1,
    High = 2,
}

impl Intensity {
    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::None => "NONE",
            Intensity::Low => "LOW",
            Intensity::High => "HIGH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_index_roundtrip_covers_all_variants() {
        for a in Action::ALL {
            assert_eq!(Action::from_index(a.index()).unwrap(), a);
        }
    }

    #[test]
    fn out_of_range_action_index_is_rejected() {
        let err = Action::from_index(3).unwrap_err();
        assert!(matches!(err, SimError::InvalidAction { index: 3 }));
    }

    #[test]
    fn enums_serialize_as_uppercase_names() {
        assert_eq!(serde_json::to_string(&Action::Recover).unwrap(), "\"RECOVER\"");
        assert_eq!(serde_json::to_string(&AttackTarget::Ot).unwrap(), "\"OT\"");
        assert_eq!(serde_json::to_string(&Intensity::High).unwrap(), "\"HIGH\"");
    }
}
