//! Deterministic engine priority.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default engine order, highest priority first.
pub const DEFAULT_PRIORITY: &[&str] = &["engine_a", "engine_b", "engine_c", "tiebreaker"];

/// Ordered engine priority list.
///
/// Engines not on the list rank after every listed engine; equal ranks are
/// broken by engine id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnginePriority {
    order: Vec<String>,
}

impl EnginePriority {
    /// Create from an ordered list.
    pub fn new<S: AsRef<str>>(order: &[S]) -> Self {
        Self {
            order: order.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Rank of an engine (0 = highest).
    pub fn rank(&self, engine: &str) -> usize {
        self.order
            .iter()
            .position(|e| e == engine)
            .unwrap_or(self.order.len())
    }

    /// Order two engines by rank, then id.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.rank(a).cmp(&self.rank(b)).then_with(|| a.cmp(b))
    }

    /// Highest-priority engine among `engines`.
    pub fn highest<'a, I>(&self, engines: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        engines.into_iter().min_by(|a, b| self.compare(a, b))
    }

    /// The configured order.
    pub fn order(&self) -> &[String] {
        &self.order
    }
}

impl Default for EnginePriority {
    fn default() -> Self {
        Self::new(DEFAULT_PRIORITY)
    }
}
