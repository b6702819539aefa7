//! Session timing configuration

use std::time::Duration;

use serde::Deserialize;

use super::error::SessionError;

/// Timing settings for a session, in seconds
///
/// Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity allowed before the session expires
    pub idle_timeout_secs: u64,
    /// Hard cap on session length regardless of activity
    pub max_lifetime_secs: u64,
    /// How long before expiry the warning is sent
    pub warning_lead_secs: u64,
    pub check_interval_secs: u64,
    pub lifetime_check_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 30 * 60,
            max_lifetime_secs: 8 * 60 * 60,
            warning_lead_secs: 5 * 60,
            check_interval_secs: 60,
            lifetime_check_interval_secs: 60 * 60,
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn warning_lead(&self) -> Duration {
        Duration::from_secs(self.warning_lead_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn lifetime_check_interval(&self) -> Duration {
        Duration::from_secs(self.lifetime_check_interval_secs)
    }

    /// Reject zero durations and a warning lead that leaves no session time
    pub fn validate(&self) -> Result<(), SessionError> {
        let durations = [
            ("idle_timeout_secs", self.idle_timeout_secs),
            ("max_lifetime_secs", self.max_lifetime_secs),
            ("warning_lead_secs", self.warning_lead_secs),
            ("check_interval_secs", self.check_interval_secs),
            ("lifetime_check_interval_secs", self.lifetime_check_interval_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
            return Err(SessionError::InvalidConfig(format!("{} must be greater than zero", name)));
        }

        let shortest = self.idle_timeout_secs.min(self.max_lifetime_secs);
        if self.warning_lead_secs >= shortest {
            return Err(SessionError::InvalidConfig(format!(
                "warning_lead_secs ({}) must be shorter than the session ({})",
                self.warning_lead_secs, shortest
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout(), Duration::from_secs(1800));
        assert_eq!(config.max_lifetime(), Duration::from_secs(28800));
        assert_eq!(config.warning_lead(), Duration::from_secs(300));
        assert_eq!(config.check_interval(), Duration::from_secs(60));
        assert_eq!(config.lifetime_check_interval(), Duration::from_secs(3600));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"idle_timeout_secs": 600}"#).unwrap();
        assert_eq!(config.idle_timeout_secs, 600);
        assert_eq!(config.warning_lead_secs, 300);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = SessionConfig {
            check_interval_secs: 0,
            ..SessionConfig::default()
        };
        assert_matches!(
            config.validate(),
            Err(SessionError::InvalidConfig(message)) if message.contains("check_interval_secs")
        );
    }

    #[test]
    fn test_warning_lead_must_fit() {
        let config = SessionConfig {
            idle_timeout_secs: 300,
            warning_lead_secs: 300,
            ..SessionConfig::default()
        };
        assert_matches!(config.validate(), Err(SessionError::InvalidConfig(_)));
    }
}
