//! Per-run configuration and its resolution from a start request.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RunDefaults;

use super::config::OrchestratorConfig;
use super::types::{ValidationError, ValidationKind};
use super::{MAX_PRODUCTS_PER_RUN, MIN_PRODUCTS_PER_RUN};

/// Fully resolved parameters of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub project_id: String,
    pub data_source_id: String,
    pub products_per_run: u32,
    pub platforms: Vec<String>,
}

/// Where a start request takes its configuration from, highest precedence first.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// YAML (or JSON) text supplied inline.
    Text(String),
    /// An already structured document supplied inline.
    Structured(serde_json::Value),
    /// A YAML file on the server's filesystem.
    Path(PathBuf),
    /// Nothing supplied: use the configured defaults.
    Defaults,
}

impl ConfigSource {
    /// Pick the source from the optional `config` and `config_path` request
    /// fields. An inline config wins over a path; a null config is absent.
    pub fn from_request(config: Option<serde_json::Value>, config_path: Option<String>) -> Self {
        match config {
            Some(serde_json::Value::String(text)) => return ConfigSource::Text(text),
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return ConfigSource::Structured(other),
        }

        match config_path {
            Some(path) if !path.trim().is_empty() => ConfigSource::Path(PathBuf::from(path)),
            _ => ConfigSource::Defaults,
        }
    }
}

/// Keys a caller may set. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawRunConfig {
    #[serde(default, alias = "gcp_project_id")]
    project_id: Option<String>,
    #[serde(default, alias = "spreadsheet_id")]
    data_source_id: Option<String>,
    #[serde(default)]
    products_per_run: Option<i64>,
    #[serde(default)]
    platforms: Option<Vec<String>>,
}

fn parse_yaml(text: &str) -> Result<RawRunConfig, ValidationError> {
    if text.trim().is_empty() {
        return Ok(RawRunConfig::default());
    }
    serde_yaml::from_str::<Option<RawRunConfig>>(text)
        .map(Option::unwrap_or_default)
        .map_err(|e| {
            ValidationError::new(
                ValidationKind::MalformedConfig,
                format!("Invalid YAML config: {}", e),
            )
        })
}

async fn read_raw(source: ConfigSource) -> Result<RawRunConfig, ValidationError> {
    match source {
        ConfigSource::Text(text) => parse_yaml(&text),
        ConfigSource::Structured(value) => serde_json::from_value(value).map_err(|e| {
            ValidationError::new(
                ValidationKind::MalformedConfig,
                format!("Invalid config: {}", e),
            )
        }),
        ConfigSource::Path(path) => {
            let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    ValidationError::new(
                        ValidationKind::ConfigFileNotFound,
                        format!("Config file not found: {}", path.display()),
                    )
                } else {
                    ValidationError::new(
                        ValidationKind::ConfigFileUnreadable,
                        format!("Failed to read config file {}: {}", path.display(), e),
                    )
                }
            })?;
            debug!("Loaded run config from {}", path.display());
            parse_yaml(&text)
        }
        ConfigSource::Defaults => Ok(RawRunConfig::default()),
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn normalize_platforms(platforms: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(platforms.len());
    for platform in platforms {
        let platform = platform.trim().to_ascii_lowercase();
        if !platform.is_empty() && !seen.contains(&platform) {
            seen.push(platform);
        }
    }
    seen
}

impl RunConfig {
    /// Resolve a run configuration, filling absent identifiers from
    /// `defaults` and the platform list from `orchestrator`.
    pub async fn resolve(
        source: ConfigSource,
        defaults: &RunDefaults,
        orchestrator: &OrchestratorConfig,
    ) -> Result<Self, ValidationError> {
        let raw = read_raw(source).await?;

        let per_run = raw
            .products_per_run
            .unwrap_or(i64::from(defaults.products_per_run));
        let range = i64::from(MIN_PRODUCTS_PER_RUN)..=i64::from(MAX_PRODUCTS_PER_RUN);
        if !range.contains(&per_run) {
            return Err(ValidationError::new(
                ValidationKind::ProductsPerRunOutOfRange,
                format!(
                    "products_per_run must be between {} and {} (got {})",
                    MIN_PRODUCTS_PER_RUN, MAX_PRODUCTS_PER_RUN, per_run
                ),
            ));
        }

        let project_id = non_empty(raw.project_id.as_ref())
            .or_else(|| non_empty(defaults.project_id.as_ref()))
            .ok_or_else(|| missing_identifier("project_id"))?;
        let data_source_id = non_empty(raw.data_source_id.as_ref())
            .or_else(|| non_empty(defaults.data_source_id.as_ref()))
            .ok_or_else(|| missing_identifier("data_source_id"))?;

        let platforms = normalize_platforms(
            raw.platforms
                .unwrap_or_else(|| orchestrator.platforms.clone()),
        );

        Ok(Self {
            project_id,
            data_source_id,
            products_per_run: per_run as u32,
            platforms,
        })
    }
}

fn missing_identifier(name: &str) -> ValidationError {
    ValidationError::new(
        ValidationKind::MissingIdentifier,
        format!("{} is not configured and no default is set", name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn defaults() -> RunDefaults {
        RunDefaults {
            project_id: Some("default-project".to_string()),
            data_source_id: Some("default-sheet".to_string()),
            products_per_run: 1,
        }
    }

    async fn resolve(source: ConfigSource) -> Result<RunConfig, ValidationError> {
        RunConfig::resolve(source, &defaults(), &OrchestratorConfig::default()).await
    }

    #[test]
    fn test_source_precedence() {
        assert_eq!(
            ConfigSource::from_request(Some(json!("products_per_run: 2")), Some("x.yaml".into())),
            ConfigSource::Text("products_per_run: 2".to_string())
        );
        assert_eq!(
            ConfigSource::from_request(Some(json!({"products_per_run": 2})), None),
            ConfigSource::Structured(json!({"products_per_run": 2}))
        );
        assert_eq!(
            ConfigSource::from_request(Some(serde_json::Value::Null), Some("x.yaml".into())),
            ConfigSource::Path(PathBuf::from("x.yaml"))
        );
        assert_eq!(
            ConfigSource::from_request(None, Some("  ".into())),
            ConfigSource::Defaults
        );
    }

    #[tokio::test]
    async fn test_defaults_fill_everything() {
        let config = resolve(ConfigSource::Defaults).await.unwrap();
        assert_eq!(config.project_id, "default-project");
        assert_eq!(config.data_source_id, "default-sheet");
        assert_eq!(config.products_per_run, 1);
        assert_eq!(config.platforms.len(), 4);
    }

    #[tokio::test]
    async fn test_yaml_text_with_aliases() {
        let yaml = "gcp_project_id: my-proj\nspreadsheet_id: sheet-9\nproducts_per_run: 3\n";
        let config = resolve(ConfigSource::Text(yaml.to_string())).await.unwrap();
        assert_eq!(config.project_id, "my-proj");
        assert_eq!(config.data_source_id, "sheet-9");
        assert_eq!(config.products_per_run, 3);
    }

    #[tokio::test]
    async fn test_yaml_accepts_json_text() {
        let text = r#"{"products_per_run": 5, "platforms": ["Instagram", "pinterest", "instagram"]}"#;
        let config = resolve(ConfigSource::Text(text.to_string())).await.unwrap();
        assert_eq!(config.products_per_run, 5);
        assert_eq!(config.platforms, vec!["instagram", "pinterest"]);
    }

    #[tokio::test]
    async fn test_empty_text_uses_defaults() {
        let config = resolve(ConfigSource::Text("   ".to_string())).await.unwrap();
        assert_eq!(config.products_per_run, 1);
    }

    #[tokio::test]
    async fn test_malformed_yaml() {
        let err = resolve(ConfigSource::Text("products_per_run: [1, 2".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ValidationKind::MalformedConfig);
        assert!(err.message.starts_with("Invalid YAML config"));
    }

    #[tokio::test]
    async fn test_structured_wrong_type() {
        let err = resolve(ConfigSource::Structured(json!({"products_per_run": "many"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ValidationKind::MalformedConfig);
    }

    #[tokio::test]
    async fn test_products_per_run_boundaries() {
        for value in [0, 11, -1] {
            let err = resolve(ConfigSource::Structured(json!({ "products_per_run": value })))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ValidationKind::ProductsPerRunOutOfRange);
            assert!(err.message.contains("products_per_run"));
        }
        for value in [1, 10] {
            let config = resolve(ConfigSource::Structured(json!({ "products_per_run": value })))
                .await
                .unwrap();
            assert_eq!(config.products_per_run, value);
        }
    }

    #[tokio::test]
    async fn test_missing_identifier_without_default() {
        let err = RunConfig::resolve(
            ConfigSource::Defaults,
            &RunDefaults::default(),
            &OrchestratorConfig::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, ValidationKind::MissingIdentifier);
        assert!(err.message.contains("project_id"));
    }

    #[tokio::test]
    async fn test_request_identifiers_override_missing_defaults() {
        let config = RunConfig::resolve(
            ConfigSource::Structured(json!({"project_id": "p", "data_source_id": "d"})),
            &RunDefaults::default(),
            &OrchestratorConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(config.project_id, "p");
        assert_eq!(config.data_source_id, "d");
    }

    #[tokio::test]
    async fn test_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "products_per_run: 4").unwrap();
        writeln!(file, "platforms: [pinterest]").unwrap();

        let config = resolve(ConfigSource::Path(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(config.products_per_run, 4);
        assert_eq!(config.platforms, vec!["pinterest"]);
    }

    #[tokio::test]
    async fn test_config_file_not_found() {
        let err = resolve(ConfigSource::Path(PathBuf::from("/nonexistent/run.yaml")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ValidationKind::ConfigFileNotFound);
        assert!(err.message.contains("/nonexistent/run.yaml"));
    }
}
