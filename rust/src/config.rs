//! Configuration types for dependency analysis.

use std::str::FromStr;

use crate::error::ScheduleError;

/// How the CPM backward pass resolves a node reachable along several paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LatestFinishPolicy {
    /// Minimum over every successor-derived candidate.
    #[default]
    Minimum,
    /// Depth-first from each sink; the first assignment a node receives sticks.
    FirstVisit,
}

impl FromStr for LatestFinishPolicy {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimum" => Ok(Self::Minimum),
            "first-visit" => Ok(Self::FirstVisit),
            other => Err(ScheduleError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Which dependency types get date-order checking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateCheckScope {
    /// Every type compares its own endpoint pair.
    #[default]
    AllTypes,
    /// Only finish-to-start edges are checked.
    FinishToStartOnly,
}

impl FromStr for DateCheckScope {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all-types" => Ok(Self::AllTypes),
            "finish-to-start-only" => Ok(Self::FinishToStartOnly),
            other => Err(ScheduleError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Configuration for conflict detection and critical path analysis.
#[derive(Clone, Debug, Default)]
pub struct AnalysisConfig {
    /// Verbosity level: 0=silent, 1=summary, 2=detail, 3=trace.
    pub verbosity: u8,
    pub latest_finish_policy: LatestFinishPolicy,
    pub date_check_scope: DateCheckScope,
}

impl AnalysisConfig {
    /// Build a config from the string forms used by the Python bindings.
    ///
    /// `None` keeps the default for that field.
    pub fn from_names(
        verbosity: u8,
        latest_finish_policy: Option<&str>,
        date_check_scope: Option<&str>,
    ) -> Result<Self, ScheduleError> {
        Ok(Self {
            verbosity,
            latest_finish_policy: latest_finish_policy
                .map(str::parse)
                .transpose()?
                .unwrap_or_default(),
            date_check_scope: date_check_scope
                .map(str::parse)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}
