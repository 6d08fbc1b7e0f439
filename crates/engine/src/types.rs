//! Run data model.

use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};

/// One question/answer exchange. Created once per iteration and never changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    /// Strategy active when the question was asked
    pub strategy: Strategy,
    pub findings: Vec<String>,
    pub follow_ups: Vec<String>,
}

/// How a run ended, or that it is still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Running,
    /// The strategy cycle wrapped to the initial strategy
    Completed,
    /// The iteration budget ran out first
    LimitReached,
    /// Stopped at an iteration boundary
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::LimitReached => "limit-reached",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `interrogate` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterrogationOutcome {
    /// Every finding in discovery order, duplicates kept
    pub findings: Vec<String>,
    pub turns: Vec<ConversationTurn>,
    pub final_strategy: Strategy,
    pub status: RunStatus,
    /// Number of completed iterations (equals `turns.len()`)
    pub iterations: usize,
}

/// Emitted after every iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// 1-based iteration index
    pub iteration: usize,
    pub max_iterations: usize,
    pub strategy: Strategy,
    pub question: String,
    pub answer: String,
    /// Cumulative findings so far
    pub findings: Vec<String>,
    /// `running` unless this iteration ended the run
    pub status: RunStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_json_shape() {
        let event = ProgressEvent {
            iteration: 2,
            max_iterations: 10,
            strategy: Strategy::FactCheck,
            question: "Q?".to_string(),
            answer: "A.".to_string(),
            findings: vec!["F".to_string()],
            status: RunStatus::LimitReached,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["maxIterations"], 10);
        assert_eq!(json["strategy"], "fact-check");
        assert_eq!(json["status"], "limit-reached");
    }
}
