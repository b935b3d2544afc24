//! Vote threshold and rejection rules
//!
//! These decide how many approvals a vote needs, and whether a vote that can
//! no longer pass is rejected early or left to expire.

use serde::{Deserialize, Serialize};

/// Rule for the number of approvals a vote needs
///
/// - `Majority`: more than half of the eligible voters (default)
/// - `Unanimous`: every eligible voter
/// - `AtLeast(n)`: a fixed number of approvals
/// - `Percentage(p)`: at least p% of the eligible voters
///
/// The required count is never below one, even with no eligible voters.
///
/// # Example
///
/// ```
/// use jukebox_domain::voting::ThresholdPolicy;
///
/// let rule = ThresholdPolicy::Majority;
/// assert_eq!(rule.required(5), 3);
/// assert_eq!(rule.required(4), 3);
/// assert_eq!(rule.required(0), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPolicy {
    /// n/2 + 1
    #[default]
    Majority,

    Unanimous,

    AtLeast(usize),

    /// 0-100
    Percentage(u8),
}

impl ThresholdPolicy {
    pub const MINIMUM_REQUIRED: usize = 1;

    /// Approvals needed out of `eligible` voters
    pub fn required(&self, eligible: usize) -> usize {
        let raw = match self {
            ThresholdPolicy::Majority => eligible / 2 + 1,
            ThresholdPolicy::Unanimous => eligible,
            ThresholdPolicy::AtLeast(n) => *n,
            ThresholdPolicy::Percentage(p) => {
                (eligible as f64 * (*p as f64 / 100.0)).ceil() as usize
            }
        };
        raw.max(Self::MINIMUM_REQUIRED)
    }

    pub fn is_satisfied(&self, approvals: usize, eligible: usize) -> bool {
        approvals >= self.required(eligible)
    }

    pub fn description(&self) -> String {
        match self {
            ThresholdPolicy::Majority => "majority (more than half)".to_string(),
            ThresholdPolicy::Unanimous => "unanimous (every listener)".to_string(),
            ThresholdPolicy::AtLeast(n) => format!("at least {} approvals", n),
            ThresholdPolicy::Percentage(p) => format!("at least {}% approval", p),
        }
    }
}

impl std::fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::str::FromStr for ThresholdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "majority" => Ok(ThresholdPolicy::Majority),
            "unanimous" => Ok(ThresholdPolicy::Unanimous),
            s if s.starts_with("atleast:") || s.starts_with("at_least:") => {
                let n: usize = s
                    .split(':')
                    .nth(1)
                    .ok_or("Missing number after atleast:")?
                    .parse()
                    .map_err(|_| "Invalid number for atleast")?;
                Ok(ThresholdPolicy::AtLeast(n))
            }
            s if s.starts_with("percentage:") || s.ends_with('%') => {
                let num_str = s.trim_start_matches("percentage:").trim_end_matches('%');
                let p: u8 = num_str.parse().map_err(|_| "Invalid percentage")?;
                if p > 100 {
                    return Err(format!("Percentage must be 0-100, got {}", p));
                }
                Ok(ThresholdPolicy::Percentage(p))
            }
            _ => Err(format!(
                "Unknown vote rule: {}. Valid: majority, unanimous, atleast:N, percentage:N or N%",
                s
            )),
        }
    }
}

/// What happens to a vote that can no longer reach its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicy {
    /// Stay open until the TTL runs out
    #[default]
    WaitForExpiry,
    /// Reject as soon as the outstanding voters cannot make up the difference
    EarlyExit,
}

impl RejectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionPolicy::WaitForExpiry => "wait_for_expiry",
            RejectionPolicy::EarlyExit => "early_exit",
        }
    }
}

impl std::fmt::Display for RejectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RejectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "wait_for_expiry" | "wait" => Ok(RejectionPolicy::WaitForExpiry),
            "early_exit" | "early" => Ok(RejectionPolicy::EarlyExit),
            other => Err(format!(
                "Unknown rejection policy: {}. Valid: wait_for_expiry, early_exit",
                other
            )),
        }
    }
}
