use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Which saved games the list screen shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListScope {
    /// Only the signed-in account's games.
    #[default]
    Owner,
    /// Every account's games, newest first.
    Global,
}

/// Who may delete a saved game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    #[default]
    Owner,
    Anyone,
}

impl FromStr for ListScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" | "private" => Ok(ListScope::Owner),
            "global" | "shared" => Ok(ListScope::Global),
            other => Err(format!("Unknown list scope '{other}'")),
        }
    }
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(DeletePolicy::Owner),
            "anyone" | "open" => Ok(DeletePolicy::Anyone),
            other => Err(format!("Unknown delete policy '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecorderConfig {
    pub list_scope: ListScope,
    pub delete_policy: DeletePolicy,
    /// Session timer period. `None` means the caller ticks the timer.
    pub tick_period: Option<Duration>,
}

impl RecorderConfig {
    /// Private games and a caller-driven timer.
    pub fn manual() -> Self {
        Self {
            tick_period: None,
            ..Self::default()
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            list_scope: ListScope::Owner,
            delete_policy: DeletePolicy::Owner,
            tick_period: Some(Duration::from_secs(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("owner".parse::<ListScope>(), Ok(ListScope::Owner));
        assert_eq!("Global".parse::<ListScope>(), Ok(ListScope::Global));
        assert_eq!("anyone".parse::<DeletePolicy>(), Ok(DeletePolicy::Anyone));
        assert!("everyone".parse::<ListScope>().is_err());
    }
}
