//! Schedule configuration and next-run computation.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("interval_hours must be at least 1")]
    InvalidInterval,

    #[error("custom schedule needs at least one time")]
    NoTimes,

    #[error("profile_id is required")]
    MissingProfileId,
}

/// When the scheduler fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    /// Once a day at `time`.
    #[default]
    Daily,
    /// Every hour, counted from the previous run.
    Hourly,
    /// Every `interval_hours`, counted from the previous run.
    EveryNHours,
    /// Once a day at each of `times`.
    Custom,
}

/// Configuration for the built-in scheduler. Times are UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Profile label attached to scheduled jobs.
    #[serde(default = "default_profile_id")]
    pub profile_id: String,

    #[serde(default, alias = "type")]
    pub kind: ScheduleKind,

    /// `HH:MM` for daily schedules.
    #[serde(default = "default_time")]
    pub time: String,

    #[serde(default = "default_interval_hours")]
    pub interval_hours: u32,

    /// `HH:MM` entries for custom schedules.
    #[serde(default = "default_times")]
    pub times: Vec<String>,

    /// Trigger one job as soon as the scheduler starts.
    #[serde(default)]
    pub run_on_start: bool,
}

fn default_profile_id() -> String {
    "scheduler".to_string()
}

fn default_time() -> String {
    "09:00".to_string()
}

fn default_interval_hours() -> u32 {
    4
}

fn default_times() -> Vec<String> {
    vec!["09:00".into(), "15:00".into(), "21:00".into()]
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            profile_id: default_profile_id(),
            kind: ScheduleKind::Daily,
            time: default_time(),
            interval_hours: default_interval_hours(),
            times: default_times(),
            run_on_start: false,
        }
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ScheduleError::InvalidTime(value.to_string()))
}

/// Next occurrence of `time` strictly after `now`.
fn next_daily(now: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

impl SchedulerConfig {
    /// Check the fields used by the configured kind.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.profile_id.trim().is_empty() {
            return Err(ScheduleError::MissingProfileId);
        }
        match self.kind {
            ScheduleKind::Daily => parse_time(&self.time).map(|_| ()),
            ScheduleKind::Hourly => Ok(()),
            ScheduleKind::EveryNHours => {
                if self.interval_hours == 0 {
                    Err(ScheduleError::InvalidInterval)
                } else {
                    Ok(())
                }
            }
            ScheduleKind::Custom => {
                if self.times.is_empty() {
                    return Err(ScheduleError::NoTimes);
                }
                self.times.iter().try_for_each(|t| parse_time(t).map(|_| ()))
            }
        }
    }

    /// When the next run is due, strictly after `now`.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        match self.kind {
            ScheduleKind::Daily => Ok(next_daily(now, parse_time(&self.time)?)),
            ScheduleKind::Hourly => Ok(now + Duration::hours(1)),
            ScheduleKind::EveryNHours => {
                if self.interval_hours == 0 {
                    return Err(ScheduleError::InvalidInterval);
                }
                Ok(now + Duration::hours(i64::from(self.interval_hours)))
            }
            ScheduleKind::Custom => {
                let mut next: Option<DateTime<Utc>> = None;
                for time in &self.times {
                    let candidate = next_daily(now, parse_time(time)?);
                    next = Some(next.map_or(candidate, |n| n.min(candidate)));
                }
                next.ok_or(ScheduleError::NoTimes)
            }
        }
    }

    /// Human-readable description for logs.
    pub fn describe(&self) -> String {
        match self.kind {
            ScheduleKind::Daily => format!("daily at {}", self.time),
            ScheduleKind::Hourly => "every hour".to_string(),
            ScheduleKind::EveryNHours => format!("every {} hours", self.interval_hours),
            ScheduleKind::Custom => format!("daily at {}", self.times.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.kind, ScheduleKind::Daily);
        assert_eq!(config.time, "09:00");
        assert_eq!(config.interval_hours, 4);
        assert_eq!(config.times.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_daily_later_today() {
        let config = SchedulerConfig::default();
        assert_eq!(config.next_run_after(at(7, 30)).unwrap(), at(9, 0));
    }

    #[test]
    fn test_daily_rolls_to_tomorrow() {
        let config = SchedulerConfig::default();
        let next = config.next_run_after(at(9, 0)).unwrap();
        assert_eq!(next, at(9, 0) + Duration::days(1));
    }

    #[test]
    fn test_hourly_and_every_n_hours() {
        let mut config = SchedulerConfig {
            kind: ScheduleKind::Hourly,
            ..Default::default()
        };
        assert_eq!(config.next_run_after(at(10, 15)).unwrap(), at(11, 15));

        config.kind = ScheduleKind::EveryNHours;
        config.interval_hours = 6;
        assert_eq!(config.next_run_after(at(10, 15)).unwrap(), at(16, 15));

        config.interval_hours = 0;
        assert_eq!(config.validate(), Err(ScheduleError::InvalidInterval));
    }

    #[test]
    fn test_custom_picks_earliest_upcoming() {
        let config = SchedulerConfig {
            kind: ScheduleKind::Custom,
            ..Default::default()
        };
        assert_eq!(config.next_run_after(at(10, 0)).unwrap(), at(15, 0));
        assert_eq!(config.next_run_after(at(21, 30)).unwrap(), at(9, 0) + Duration::days(1));
    }

    #[test]
    fn test_invalid_times() {
        let config = SchedulerConfig {
            time: "25:99".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ScheduleError::InvalidTime("25:99".to_string()))
        );

        let config = SchedulerConfig {
            kind: ScheduleKind::Custom,
            times: vec![],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ScheduleError::NoTimes));
    }

    #[test]
    fn test_deserialize_type_alias() {
        let toml = r#"
            enabled = true
            type = "every_n_hours"
            interval_hours = 2
            run_on_start = true
        "#;
        let config: SchedulerConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.kind, ScheduleKind::EveryNHours);
        assert_eq!(config.interval_hours, 2);
        assert!(config.run_on_start);
        assert_eq!(config.describe(), "every 2 hours");
    }
}
