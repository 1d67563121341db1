use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::scheduler::SchedulerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub products: ProductsConfig,
    #[serde(default)]
    pub defaults: RunDefaults,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub publishers: PublishersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Where the run state pointer is persisted
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from("automation_state.json")
}

/// Product data source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductsConfig {
    /// JSON file holding the ordered product list
    #[serde(default = "default_products_path")]
    pub path: PathBuf,
    /// Data source identifier the file stands for; falls back to
    /// `defaults.data_source_id`
    #[serde(default)]
    pub id: Option<String>,
}

impl Default for ProductsConfig {
    fn default() -> Self {
        Self {
            path: default_products_path(),
            id: None,
        }
    }
}

fn default_products_path() -> PathBuf {
    PathBuf::from("products.json")
}

/// Fallback run parameters used when a start request carries no configuration,
/// or carries one that omits an identifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunDefaults {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub data_source_id: Option<String>,
    #[serde(default = "default_products_per_run")]
    pub products_per_run: u32,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            project_id: None,
            data_source_id: None,
            products_per_run: default_products_per_run(),
        }
    }
}

fn default_products_per_run() -> u32 {
    1
}

/// External generation providers
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub script: ScriptProviderConfig,
    #[serde(default)]
    pub video: VideoProviderConfig,
}

/// Chat-completion script provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptProviderConfig {
    /// API base URL (e.g., "https://api.openai.com/v1")
    #[serde(default = "default_script_url")]
    pub base_url: String,
    #[serde(default = "default_script_model")]
    pub model: String,
    /// Name of the secret holding the API key
    #[serde(default = "default_script_secret")]
    pub api_key_secret: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u32,
}

impl Default for ScriptProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_script_url(),
            model: default_script_model(),
            api_key_secret: default_script_secret(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_script_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_script_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_script_secret() -> String {
    "openai_api_key".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_request_timeout() -> u32 {
    60
}

/// Avatar video provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoProviderConfig {
    #[serde(default = "default_video_url")]
    pub base_url: String,
    #[serde(default = "default_video_secret")]
    pub api_key_secret: String,
    #[serde(default = "default_avatar_id")]
    pub avatar_id: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u32,
}

impl Default for VideoProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_video_url(),
            api_key_secret: default_video_secret(),
            avatar_id: default_avatar_id(),
            voice_id: default_voice_id(),
            background_color: default_background(),
            width: default_width(),
            height: default_height(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_video_url() -> String {
    "https://api.heygen.com".to_string()
}

fn default_video_secret() -> String {
    "heygen_api_key".to_string()
}

fn default_avatar_id() -> String {
    "default_avatar".to_string()
}

fn default_voice_id() -> String {
    "en-US-JennyNeural".to_string()
}

fn default_background() -> String {
    "#FFFFFF".to_string()
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

/// Social platform publisher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishersConfig {
    /// Instagram Graph API base URL
    #[serde(default = "default_graph_url")]
    pub instagram_base_url: String,
    /// Seconds to wait between creating a reel container and publishing it
    #[serde(default = "default_instagram_processing_wait")]
    pub instagram_processing_wait_secs: u64,
    #[serde(default = "default_pinterest_url")]
    pub pinterest_base_url: String,
    /// YouTube Data API resumable upload endpoint
    #[serde(default = "default_youtube_upload_url")]
    pub youtube_upload_base_url: String,
    /// Twitter v1.1 media upload endpoint
    #[serde(default = "default_twitter_upload_url")]
    pub twitter_upload_base_url: String,
    /// Twitter v2 API, used to create the tweet
    #[serde(default = "default_twitter_api_url")]
    pub twitter_api_base_url: String,
    /// Ceiling on Twitter's server-side video processing
    #[serde(default = "default_twitter_processing_max_wait")]
    pub twitter_processing_max_wait_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u32,
}

impl Default for PublishersConfig {
    fn default() -> Self {
        Self {
            instagram_base_url: default_graph_url(),
            instagram_processing_wait_secs: default_instagram_processing_wait(),
            pinterest_base_url: default_pinterest_url(),
            youtube_upload_base_url: default_youtube_upload_url(),
            twitter_upload_base_url: default_twitter_upload_url(),
            twitter_api_base_url: default_twitter_api_url(),
            twitter_processing_max_wait_secs: default_twitter_processing_max_wait(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_graph_url() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

fn default_instagram_processing_wait() -> u64 {
    30
}

fn default_pinterest_url() -> String {
    "https://api.pinterest.com/v5".to_string()
}

fn default_youtube_upload_url() -> String {
    "https://www.googleapis.com/upload/youtube/v3".to_string()
}

fn default_twitter_upload_url() -> String {
    "https://upload.twitter.com/1.1".to_string()
}

fn default_twitter_api_url() -> String {
    "https://api.twitter.com/2".to_string()
}

fn default_twitter_processing_max_wait() -> u64 {
    120
}

/// Sanitized config for API responses (secret names only, never values)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub state_path: PathBuf,
    pub products_path: PathBuf,
    pub default_project_configured: bool,
    pub default_data_source_configured: bool,
    pub products_per_run: u32,
    pub platforms: Vec<String>,
    pub scheduler_enabled: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            state_path: config.state.path.clone(),
            products_path: config.products.path.clone(),
            default_project_configured: config.defaults.project_id.is_some(),
            default_data_source_configured: config.defaults.data_source_id.is_some(),
            products_per_run: config.defaults.products_per_run,
            platforms: config.orchestrator.platforms.clone(),
            scheduler_enabled: config.scheduler.enabled,
        }
    }
}
