//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the job orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Platforms every product is published to, unless a run overrides them.
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,

    /// How often to ask the video provider for render status (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub video_poll_interval_ms: u64,

    /// Ceiling on a single render (seconds). Exceeding it fails that product
    /// with a timeout.
    #[serde(default = "default_max_wait")]
    pub video_max_wait_secs: u64,

    /// Pause between consecutive products of one job (milliseconds).
    #[serde(default = "default_delay_between_products")]
    pub delay_between_products_ms: u64,

    /// Platform name used to tailor the script prompt.
    #[serde(default = "default_script_platform")]
    pub script_platform: String,
}

fn default_platforms() -> Vec<String> {
    ["youtube", "instagram", "pinterest", "twitter"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_poll_interval() -> u64 {
    10_000 // 10 seconds
}

fn default_max_wait() -> u64 {
    600 // 10 minutes
}

fn default_delay_between_products() -> u64 {
    60_000 // 1 minute
}

fn default_script_platform() -> String {
    "general".to_string()
}

impl OrchestratorConfig {
    /// Drop default platforms that have no publisher, returning the dropped
    /// names. Runs that name a platform explicitly are unaffected.
    pub fn retain_platforms(&mut self, available: &[&str]) -> Vec<String> {
        let (kept, dropped): (Vec<String>, Vec<String>) = self
            .platforms
            .drain(..)
            .partition(|p| available.iter().any(|a| a.eq_ignore_ascii_case(p)));
        self.platforms = kept;
        dropped
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            video_poll_interval_ms: default_poll_interval(),
            video_max_wait_secs: default_max_wait(),
            delay_between_products_ms: default_delay_between_products(),
            script_platform: default_script_platform(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(
            config.platforms,
            vec!["youtube", "instagram", "pinterest", "twitter"]
        );
        assert_eq!(config.video_poll_interval_ms, 10_000);
        assert_eq!(config.video_max_wait_secs, 600);
        assert_eq!(config.delay_between_products_ms, 60_000);
        assert_eq!(config.script_platform, "general");
    }

    #[test]
    fn test_retain_platforms() {
        let mut config = OrchestratorConfig::default();
        let dropped = config.retain_platforms(&["pinterest", "YouTube"]);
        assert_eq!(config.platforms, vec!["youtube", "pinterest"]);
        assert_eq!(dropped, vec!["instagram", "twitter"]);

        let dropped = config.retain_platforms(&[]);
        assert!(config.platforms.is_empty());
        assert_eq!(dropped, vec!["youtube", "pinterest"]);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            platforms = ["instagram"]
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.platforms, vec!["instagram"]);
        assert_eq!(config.video_max_wait_secs, 600);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            platforms = ["pinterest", "twitter"]
            video_poll_interval_ms = 500
            video_max_wait_secs = 30
            delay_between_products_ms = 0
            script_platform = "instagram"
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.video_poll_interval_ms, 500);
        assert_eq!(config.video_max_wait_secs, 30);
        assert_eq!(config.delay_between_products_ms, 0);
        assert_eq!(config.script_platform, "instagram");
    }
}
