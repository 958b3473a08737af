//! Filter mode applied to the task collection.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Subset criterion for the visible task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Every task.
    #[default]
    All,
    /// Tasks that are not completed.
    Active,
    /// Completed tasks only.
    Completed,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 3] =
        [FilterMode::All, FilterMode::Active, FilterMode::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Returns whether a task with the given completion flag is visible.
    pub fn matches(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Active => !completed,
            Self::Completed => completed,
        }
    }
}

impl Display for FilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no filter mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilterMode(pub String);

impl Display for UnknownFilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown filter mode `{}`; expected all|active|completed",
            self.0
        )
    }
}

impl std::error::Error for UnknownFilterMode {}

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownFilterMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FilterMode;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" Active ".parse::<FilterMode>(), Ok(FilterMode::Active));
        assert!("done".parse::<FilterMode>().is_err());
    }

    #[test]
    fn predicate_matches_mode() {
        assert!(FilterMode::All.matches(true));
        assert!(FilterMode::Active.matches(false));
        assert!(!FilterMode::Active.matches(true));
        assert!(FilterMode::Completed.matches(true));
    }
}
