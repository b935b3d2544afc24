//! Voting value objects

use serde::{Deserialize, Serialize};

/// Action a vote decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Skip,
    Stop,
    Clear,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Skip => "skip",
            VoteType::Stop => "stop",
            VoteType::Clear => "clear",
        }
    }
}

impl std::fmt::Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(VoteType::Skip),
            "stop" => Ok(VoteType::Stop),
            "clear" => Ok(VoteType::Clear),
            other => Err(format!(
                "Unknown vote type: {}. Valid: skip, stop, clear",
                other
            )),
        }
    }
}

/// A voter's ballot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Approve,
    Deny,
}

impl VoteChoice {
    pub fn is_approve(&self) -> bool {
        matches!(self, VoteChoice::Approve)
    }
}

impl std::str::FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" | "yes" | "y" => Ok(VoteChoice::Approve),
            "deny" | "no" | "n" => Ok(VoteChoice::Deny),
            other => Err(format!("Unknown vote choice: {}. Valid: approve, deny", other)),
        }
    }
}

/// Lifecycle of a vote
///
/// Only `Open` accepts ballots; the other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    #[default]
    Open,
    Approved,
    Rejected,
    Expired,
}

impl VoteStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VoteStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteStatus::Open => "open",
            VoteStatus::Approved => "approved",
            VoteStatus::Rejected => "rejected",
            VoteStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
