//! Questioning strategies.

use inquest_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One questioning stance. Strategies are visited in a fixed cyclic order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    BroadOverview,
    DeepDive,
    FactCheck,
    Timeline,
}

impl Strategy {
    /// The fixed cycle order.
    pub const ORDER: [Strategy; 4] = [
        Strategy::BroadOverview,
        Strategy::DeepDive,
        Strategy::FactCheck,
        Strategy::Timeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::BroadOverview => "broad-overview",
            Strategy::DeepDive => "deep-dive",
            Strategy::FactCheck => "fact-check",
            Strategy::Timeline => "timeline",
        }
    }

    /// Cyclic successor; the last strategy wraps to the first.
    pub fn next(self) -> Strategy {
        let index = Self::ORDER.iter().position(|s| *s == self).unwrap_or(0);
        Self::ORDER[(index + 1) % Self::ORDER.len()]
    }

    /// One full cycle starting at `start`.
    pub fn cycle_from(start: Strategy) -> impl Iterator<Item = Strategy> {
        std::iter::successors(Some(start), |s| Some(s.next())).take(Self::ORDER.len())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == s.trim())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Unknown strategy: {}. Supported: {}",
                    s,
                    Self::ORDER.map(|s| s.as_str()).join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps() {
        assert_eq!(Strategy::BroadOverview.next(), Strategy::DeepDive);
        assert_eq!(Strategy::Timeline.next(), Strategy::BroadOverview);
    }

    #[test]
    fn test_cycle_from_visits_each_once() {
        let cycle: Vec<Strategy> = Strategy::cycle_from(Strategy::FactCheck).collect();
        assert_eq!(
            cycle,
            vec![
                Strategy::FactCheck,
                Strategy::Timeline,
                Strategy::BroadOverview,
                Strategy::DeepDive
            ]
        );
    }

    #[test]
    fn test_names_round_trip_through_serde_and_parse() {
        for strategy in Strategy::ORDER {
            assert_eq!(strategy.as_str().parse::<Strategy>().unwrap(), strategy);
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{}\"", strategy.as_str()));
        }
        assert!(matches!("brainstorm".parse::<Strategy>(), Err(AppError::Config(_))));
    }
}
