pub mod config;
pub mod decision;
pub mod run;

pub use config::{ConfigSettings, CopyTradingConfig};
pub use decision::{CopyTradeDecision, NewDecision};
pub use run::{JobRun, RunStats, RunStatus, SCANNER_JOB_NAME};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A stored enum column held a value outside its vocabulary.
#[derive(Debug, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Direction of the mirrored trade. Stored and serialized as `Buy` / `Sell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl FromStr for Side {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" | "0" => Ok(Side::Buy),
            "SELL" | "1" => Ok(Side::Sell),
            _ => Err(UnknownVariant::new("side", s)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RiskPreference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskPreference {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskPreference::Conservative => "conservative",
            RiskPreference::Moderate => "moderate",
            RiskPreference::Aggressive => "aggressive",
        }
    }
}

impl FromStr for RiskPreference {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(RiskPreference::Conservative),
            "moderate" => Ok(RiskPreference::Moderate),
            "aggressive" => Ok(RiskPreference::Aggressive),
            _ => Err(UnknownVariant::new("risk_preference", s)),
        }
    }
}

impl fmt::Display for RiskPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DecisionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Copy,
    Skip,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Copy => "copy",
            DecisionKind::Skip => "skip",
        }
    }
}

impl FromStr for DecisionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" => Ok(DecisionKind::Copy),
            "skip" => Ok(DecisionKind::Skip),
            _ => Err(UnknownVariant::new("decision", s)),
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DecisionStatus: state machine
// ---------------------------------------------------------------------------

/// Lifecycle of a decision.
///
/// ```text
/// pending  --execute-->  executed  --close-->  stopped
/// pending  --expire-->   expired
/// executed --expire-->   expired
/// skipped  (terminal on creation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Pending,
    Executed,
    Stopped,
    Expired,
    Skipped,
}

/// The write operations that move a decision between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Execute,
    Close,
    Expire,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transition::Execute => "execute",
            Transition::Close => "close",
            Transition::Expire => "expire",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {transition} a decision in status {from}")]
pub struct TransitionError {
    pub from: DecisionStatus,
    pub transition: Transition,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Pending => "pending",
            DecisionStatus::Executed => "executed",
            DecisionStatus::Stopped => "stopped",
            DecisionStatus::Expired => "expired",
            DecisionStatus::Skipped => "skipped",
        }
    }

    /// Transition table. Every legal edge is listed here and nowhere else.
    pub fn apply(self, transition: Transition) -> Result<DecisionStatus, TransitionError> {
        use DecisionStatus::*;
        match (self, transition) {
            (Pending, Transition::Execute) => Ok(Executed),
            (Executed, Transition::Close) => Ok(Stopped),
            (Pending, Transition::Expire) | (Executed, Transition::Expire) => Ok(Expired),
            (from, transition) => Err(TransitionError { from, transition }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DecisionStatus::Stopped | DecisionStatus::Expired | DecisionStatus::Skipped
        )
    }
}

impl FromStr for DecisionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DecisionStatus::Pending),
            "executed" => Ok(DecisionStatus::Executed),
            "stopped" => Ok(DecisionStatus::Stopped),
            "expired" => Ok(DecisionStatus::Expired),
            "skipped" => Ok(DecisionStatus::Skipped),
            _ => Err(UnknownVariant::new("status", s)),
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [DecisionStatus; 5] = [
        DecisionStatus::Pending,
        DecisionStatus::Executed,
        DecisionStatus::Stopped,
        DecisionStatus::Expired,
        DecisionStatus::Skipped,
    ];

    const ALL_TRANSITIONS: [Transition; 3] =
        [Transition::Execute, Transition::Close, Transition::Expire];

    fn rank(s: DecisionStatus) -> u8 {
        match s {
            DecisionStatus::Pending => 0,
            DecisionStatus::Executed => 1,
            DecisionStatus::Stopped | DecisionStatus::Expired | DecisionStatus::Skipped => 2,
        }
    }

    #[test]
    fn test_legal_edges() {
        assert_eq!(
            DecisionStatus::Pending.apply(Transition::Execute),
            Ok(DecisionStatus::Executed)
        );
        assert_eq!(
            DecisionStatus::Executed.apply(Transition::Close),
            Ok(DecisionStatus::Stopped)
        );
        assert_eq!(
            DecisionStatus::Pending.apply(Transition::Expire),
            Ok(DecisionStatus::Expired)
        );
        assert_eq!(
            DecisionStatus::Executed.apply(Transition::Expire),
            Ok(DecisionStatus::Expired)
        );
    }

    #[test]
    fn test_transitions_only_move_forward() {
        for from in ALL_STATUSES {
            for t in ALL_TRANSITIONS {
                if let Ok(to) = from.apply(t) {
                    assert!(rank(to) > rank(from), "{from} -> {to} via {t}");
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for from in ALL_STATUSES.into_iter().filter(|s| s.is_terminal()) {
            for t in ALL_TRANSITIONS {
                let err = from.apply(t).unwrap_err();
                assert_eq!(err.from, from);
                assert_eq!(err.transition, t);
            }
        }
    }

    #[test]
    fn test_close_pending_rejected() {
        assert!(DecisionStatus::Pending.apply(Transition::Close).is_err());
        assert!(DecisionStatus::Executed.apply(Transition::Execute).is_err());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for s in ALL_STATUSES {
            assert_eq!(s.as_str().parse::<DecisionStatus>().unwrap(), s);
        }
        assert!("closed".parse::<DecisionStatus>().is_err());
    }

    #[test]
    fn test_risk_preference_parse() {
        assert_eq!(
            " Aggressive ".parse::<RiskPreference>().unwrap(),
            RiskPreference::Aggressive
        );
        assert!("yolo".parse::<RiskPreference>().is_err());
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("1".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
    }
}
