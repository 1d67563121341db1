pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod products;
pub mod providers;
pub mod publisher;
pub mod scheduler;
pub mod secrets;
pub mod state;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, PublishersConfig, RunDefaults, SanitizedConfig, ScriptProviderConfig,
    VideoProviderConfig,
};
pub use orchestrator::{
    ConfigSource, Job, JobCounts, JobHandle, JobOrchestrator, JobResult, JobStatus,
    OrchestratorConfig, OrchestratorError, PlatformOutcome, ProductErrorKind, ProductOutcome,
    ProductStatus, RunConfig, ValidationError, ValidationKind,
};
pub use products::{JsonFileProductSource, ProductRecord, ProductSource, ProductSourceError};
pub use providers::{
    GenerationError, HeyGenVideoProvider, OpenAiScriptProvider, ScriptProvider, VideoHandle,
    VideoProvider, VideoStatus,
};
pub use publisher::{
    InstagramClient, PinterestClient, PublishError, PublishMetadata, Publisher, SocialPublisher,
    TwitterClient, TwitterCredentials, YouTubeClient, YouTubeCredentials,
};
pub use scheduler::{ScheduleError, ScheduleKind, Scheduler, SchedulerConfig};
pub use secrets::{EnvSecretStore, SecretError, SecretStore, StaticSecretStore};
pub use state::{JsonFileStateStore, RunState, RunStateStore, RunStateTracker, StateError};
