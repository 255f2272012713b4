//! Quorum rules.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest group size that ever counts as agreement.
pub const MIN_QUORUM: usize = 2;

/// How many identical responses make a quorum group.
///
/// Whatever the rule, a quorum is never smaller than two: a single engine
/// cannot agree with itself.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// At least n identical responses
    AtLeast(usize),
    /// At least this fraction (0-1] of the dispatched engines
    Fraction(f64),
}

impl Default for QuorumRule {
    fn default() -> Self {
        QuorumRule::AtLeast(MIN_QUORUM)
    }
}

impl QuorumRule {
    /// Group size required when `dispatched` engines were asked.
    pub fn required(&self, dispatched: usize) -> usize {
        let raw = match self {
            QuorumRule::AtLeast(n) => *n,
            QuorumRule::Fraction(f) => (dispatched as f64 * f).ceil() as usize,
        };
        raw.max(MIN_QUORUM)
    }

    /// Whether a group of `size` meets the rule.
    pub fn is_satisfied(&self, size: usize, dispatched: usize) -> bool {
        size >= self.required(dispatched)
    }

    /// Human-readable description.
    pub fn description(&self) -> String {
        match self {
            QuorumRule::AtLeast(n) => format!("at least {} agreeing engines", n.max(&MIN_QUORUM)),
            QuorumRule::Fraction(f) => format!("at least {:.0}% of engines agreeing", f * 100.0),
        }
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        match self {
            QuorumRule::AtLeast(_) => Ok(()),
            QuorumRule::Fraction(f) if *f > 0.0 && *f <= 1.0 => Ok(()),
            QuorumRule::Fraction(f) => Err(Error::InvalidConfig(format!(
                "quorum fraction must be in (0, 1], got {}",
                f
            ))),
        }
    }
}

impl fmt::Display for QuorumRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl FromStr for QuorumRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        if let Some(n) = lowered
            .strip_prefix("at_least:")
            .or_else(|| lowered.strip_prefix("atleast:"))
        {
            let n: usize = n
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("invalid quorum count: {}", n)))?;
            return Ok(QuorumRule::AtLeast(n));
        }
        if let Some(f) = lowered.strip_prefix("fraction:") {
            let f: f64 = f
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("invalid quorum fraction: {}", f)))?;
            let rule = QuorumRule::Fraction(f);
            rule.validate()?;
            return Ok(rule);
        }
        Err(Error::InvalidConfig(format!(
            "unknown quorum rule: {}. Valid: at_least:N, fraction:F",
            s
        )))
    }
}
