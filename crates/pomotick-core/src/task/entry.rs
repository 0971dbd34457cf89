use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a ledger entry.
///
/// ```text
/// Ongoing ──> Completed      (focus interval ran to zero)
///    └──────> Interrupted    (paused, reset, switched, or superseded)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Ongoing,
    Completed,
    Interrupted,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Ongoing => write!(f, "ongoing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ongoing" => Ok(TaskStatus::Ongoing),
            "completed" => Ok(TaskStatus::Completed),
            "interrupted" => Ok(TaskStatus::Interrupted),
            other => Err(format!(
                "unknown status '{other}' (expected ongoing, completed or interrupted)"
            )),
        }
    }
}

/// One row of the task history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    /// Local wall-clock time the task was set, `HH:MM`.
    pub time: String,
    #[serde(alias = "task")]
    pub description: String,
    pub status: TaskStatus,
}

impl fmt::Display for TaskEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.time, self.description, self.status)
    }
}

/// History view selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Ongoing,
    Interrupted,
}

impl StatusFilter {
    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => status == TaskStatus::Completed,
            StatusFilter::Ongoing => status == TaskStatus::Ongoing,
            StatusFilter::Interrupted => status == TaskStatus::Interrupted,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            other => other
                .parse::<TaskStatus>()
                .map(|status| match status {
                    TaskStatus::Ongoing => StatusFilter::Ongoing,
                    TaskStatus::Completed => StatusFilter::Completed,
                    TaskStatus::Interrupted => StatusFilter::Interrupted,
                })
                .map_err(|_| format!("unknown filter '{other}' (expected all, completed, ongoing or interrupted)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_reads_legacy_task_key() {
        let entry: TaskEntry = serde_json::from_value(json!({
            "time": "09:15",
            "task": "review PR",
            "status": "interrupted"
        }))
        .unwrap();
        assert_eq!(entry.description, "review PR");
        assert_eq!(entry.status, TaskStatus::Interrupted);
        assert_eq!(entry.to_string(), "09:15 - review PR (interrupted)");
    }

    #[test]
    fn entry_writes_description_key() {
        let entry = TaskEntry {
            time: "10:00".into(),
            description: "plan".into(),
            status: TaskStatus::Ongoing,
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"time": "10:00", "description": "plan", "status": "ongoing"})
        );
    }

    #[test]
    fn filters_parse_case_insensitively() {
        assert_eq!("All".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "INTERRUPTED".parse::<StatusFilter>().unwrap(),
            StatusFilter::Interrupted
        );
        assert!("done".parse::<StatusFilter>().is_err());
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn filter_matching() {
        assert!(StatusFilter::All.matches(TaskStatus::Ongoing));
        assert!(StatusFilter::Completed.matches(TaskStatus::Completed));
        assert!(!StatusFilter::Completed.matches(TaskStatus::Interrupted));
    }
}
