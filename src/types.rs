use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a submitted task.
///
/// `Running` is the only non-terminal state. A task never re-enters
/// `Running` once it has been moved to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Running,
    Completed,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Running => "RUNNING",
            Status::Completed => "COMPLETED",
            Status::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" => Ok(Status::Running),
            "completed" => Ok(Status::Completed),
            "failed" => Ok(Status::Failed),
            other => Err(format!(
                "invalid status: {other} (expected \"running\", \"completed\" or \"failed\")"
            )),
        }
    }
}

/// Which parameter set a submission uses.
///
/// - `Default`: every tunable prediction parameter is cleared before the
///   command is built, so the pipeline falls back to its own defaults.
/// - `Customized`: caller-supplied values are passed through (subject to
///   default elision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    #[default]
    Default,
    Customized,
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(ActionType::Default),
            "customized" => Ok(ActionType::Customized),
            other => Err(format!(
                "invalid action type: {other} (expected \"default\" or \"customized\")"
            )),
        }
    }
}

/// Backing store for task records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// One JSON document per task under `[store].path`.
    #[default]
    File,
    /// Process-local only (lost on restart).
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Running".parse::<Status>(), Ok(Status::Running));
        assert_eq!(" FAILED ".parse::<Status>(), Ok(Status::Failed));
        assert!("pending".parse::<Status>().is_err());
    }

    #[test]
    fn status_is_stored_uppercase() {
        assert_eq!(serde_json::to_string(&Status::Completed).unwrap(), "\"COMPLETED\"");
        assert_eq!(Status::Running.to_string(), "RUNNING");
    }

    #[test]
    fn action_type_round_trips_through_from_str() {
        assert_eq!("DEFAULT".parse::<ActionType>(), Ok(ActionType::Default));
        assert_eq!("customized".parse::<ActionType>(), Ok(ActionType::Customized));
        assert!("fast".parse::<ActionType>().is_err());
    }
}
