use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context};
use recorder::{DeletePolicy, ListScope, RecorderConfig};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub host: String,
    pub port: u16,
    pub list_scope: ListScope,
    pub delete_policy: DeletePolicy,
    /// Session timer period; 0 leaves the timer to manual ticks.
    pub timer_tick_ms: u64,
    /// Recorder sessions untouched this long are evicted.
    pub session_idle_minutes: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET_KEY")
                .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string()),
            jwt_expire_hours: env::var("JWT_EXPIRE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(168), // 7 days
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            list_scope: parse_var("RECORDING_LIST_SCOPE")?.unwrap_or_default(),
            delete_policy: parse_var("RECORDING_DELETE_POLICY")?.unwrap_or_default(),
            timer_tick_ms: env::var("TIMER_TICK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            session_idle_minutes: env::var("SESSION_IDLE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&m| m > 0)
                .unwrap_or(120),
        })
    }

    pub fn recorder(&self) -> RecorderConfig {
        RecorderConfig {
            list_scope: self.list_scope,
            delete_policy: self.delete_policy,
            tick_period: (self.timer_tick_ms > 0).then(|| Duration::from_millis(self.timer_tick_ms)),
        }
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }
}

/// Unset is `None`; a set but unparseable value is an error.
fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{name}: {e}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_config_from_tick() {
        let mut config = Config {
            database_url: String::new(),
            jwt_secret: "s".into(),
            jwt_expire_hours: 1,
            host: "127.0.0.1".into(),
            port: 8000,
            list_scope: ListScope::Global,
            delete_policy: DeletePolicy::Owner,
            timer_tick_ms: 250,
            session_idle_minutes: 30,
        };
        let rc = config.recorder();
        assert_eq!(rc.list_scope, ListScope::Global);
        assert_eq!(rc.tick_period, Some(Duration::from_millis(250)));

        config.timer_tick_ms = 0;
        assert_eq!(config.recorder().tick_period, None);
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(1800));
    }
}
