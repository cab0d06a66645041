//! Shared primitive types used across the decision engine.

use serde::{Deserialize, Serialize};

/// Number of actions in the recommendation action space.
pub const NUM_ACTIONS: usize = 4;

/// The recommendation action space, in fixed index order.
/// Index order matters: ties in action values resolve toward the lowest
/// index, so REJECT is the conservative default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Reject,
    ApproveLow,
    ApproveMedium,
    ApproveHigh,
}

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [
        Action::Reject,
        Action::ApproveLow,
        Action::ApproveMedium,
        Action::ApproveHigh,
    ];

    pub fn index(self) -> usize {
        match self {
            Action::Reject => 0,
            Action::ApproveLow => 1,
            Action::ApproveMedium => 2,
            Action::ApproveHigh => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Reject => "REJECT",
            Action::ApproveLow => "APPROVE_LOW",
            Action::ApproveMedium => "APPROVE_MEDIUM",
            Action::ApproveHigh => "APPROVE_HIGH",
        }
    }
}

/// Ordered risk classification labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

impl RiskLabel {
    pub const ALL: [RiskLabel; 3] = [RiskLabel::Low, RiskLabel::Medium, RiskLabel::High];

    pub fn from_index(index: usize) -> Option<RiskLabel> {
        RiskLabel::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            RiskLabel::Low => "LOW",
            RiskLabel::Medium => "MEDIUM",
            RiskLabel::High => "HIGH",
        }
    }
}
