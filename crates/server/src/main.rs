use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelforge_core::{
    load_config, load_config_from_env, validate_config, Config, EnvSecretStore,
    HeyGenVideoProvider, InstagramClient, JobOrchestrator, JsonFileProductSource,
    JsonFileStateStore, OpenAiScriptProvider, PinterestClient, ProductSource, Publisher,
    RunStateStore, RunStateTracker, Scheduler, ScriptProvider, SecretStore, SocialPublisher,
    TwitterClient, TwitterCredentials, VideoProvider, YouTubeClient, YouTubeCredentials,
};
use reelforge_server::api::create_router;
use reelforge_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTAGRAM_TOKEN_SECRET: &str = "instagram_access_token";
const INSTAGRAM_ACCOUNT_SECRET: &str = "instagram_account_id";
const PINTEREST_TOKEN_SECRET: &str = "pinterest_access_token";
const PINTEREST_BOARD_SECRET: &str = "pinterest_board_id";
const YOUTUBE_CREDENTIALS_SECRET: &str = "youtube_credentials";
const TWITTER_API_KEY_SECRET: &str = "twitter_api_key";
const TWITTER_API_SECRET_SECRET: &str = "twitter_api_secret";
const TWITTER_ACCESS_TOKEN_SECRET: &str = "twitter_access_token";
const TWITTER_ACCESS_SECRET_SECRET: &str = "twitter_access_secret";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("reelforge v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("REELFORGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration; the file is optional
    let mut config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!(
            "No config file at {:?}, using defaults and environment",
            config_path
        );
        load_config_from_env().context("Failed to load config from environment")?
    };

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("State file: {:?}", config.state.path);
    info!("Product list: {:?}", config.products.path);

    // Run state
    let store: Arc<dyn RunStateStore> = Arc::new(JsonFileStateStore::new(&config.state.path));
    let mut product_file = JsonFileProductSource::new(&config.products.path);
    let source_id = config
        .products
        .id
        .clone()
        .or_else(|| config.defaults.data_source_id.clone());
    match source_id {
        Some(id) => {
            info!("Product list serves data source '{}'", id);
            product_file = product_file.with_source_id(id);
        }
        None => warn!("No data source id configured; accepting any data_source_id"),
    }
    let products: Arc<dyn ProductSource> = Arc::new(product_file);
    let tracker = Arc::new(
        RunStateTracker::open(store, products).context("Failed to load run state")?,
    );

    // Providers and publishers
    let secrets = EnvSecretStore::new();
    let script = create_script_provider(&config, &secrets)?;
    let video = create_video_provider(&config, &secrets)?;
    let publisher = create_publisher(&config, &secrets)?;
    let dropped = config
        .orchestrator
        .retain_platforms(&publisher.configured_platforms());
    if !dropped.is_empty() {
        warn!(
            "No publisher configured for {:?}; removed from default platforms",
            dropped
        );
    }
    let publisher: Arc<dyn Publisher> = Arc::new(publisher);

    let orchestrator = Arc::new(JobOrchestrator::new(
        config.orchestrator.clone(),
        config.defaults.clone(),
        tracker,
        script,
        video,
        publisher,
    ));

    // Scheduler
    let scheduler = if config.scheduler.enabled {
        let scheduler = Scheduler::new(config.scheduler.clone(), Arc::clone(&orchestrator));
        scheduler.start().context("Failed to start scheduler")?;
        Some(scheduler)
    } else {
        info!("Scheduler disabled");
        None
    };

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, orchestrator));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(scheduler) = scheduler {
        scheduler.stop();
    }

    info!("Server shut down");
    Ok(())
}

/// Look up a secret, logging instead of failing when it is absent.
fn optional_secret(secrets: &dyn SecretStore, name: &str) -> Option<String> {
    match secrets.get(name) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                "{} (set {})",
                e,
                EnvSecretStore::variable_name(name)
            );
            None
        }
    }
}

fn create_script_provider(
    config: &Config,
    secrets: &dyn SecretStore,
) -> Result<Arc<dyn ScriptProvider>> {
    let script_config = config.providers.script.clone();
    let api_key = optional_secret(secrets, &script_config.api_key_secret).unwrap_or_default();
    let provider = OpenAiScriptProvider::new(script_config, api_key)
        .context("Failed to create script provider")?;
    info!("Using script provider: {}", provider.name());
    Ok(Arc::new(provider))
}

fn create_video_provider(
    config: &Config,
    secrets: &dyn SecretStore,
) -> Result<Arc<dyn VideoProvider>> {
    let video_config = config.providers.video.clone();
    let api_key = optional_secret(secrets, &video_config.api_key_secret).unwrap_or_default();
    let provider = HeyGenVideoProvider::new(video_config, api_key)
        .context("Failed to create video provider")?;
    info!("Using video provider: {}", provider.name());
    Ok(Arc::new(provider))
}

fn create_publisher(config: &Config, secrets: &dyn SecretStore) -> Result<SocialPublisher> {
    let mut publisher = SocialPublisher::new();

    if let Some(json) = optional_secret(secrets, YOUTUBE_CREDENTIALS_SECRET) {
        let credentials = YouTubeCredentials::from_json(&json)
            .with_context(|| format!("Secret {} is not valid", YOUTUBE_CREDENTIALS_SECRET))?;
        let client = YouTubeClient::new(&config.publishers, credentials)
            .context("Failed to create YouTube client")?;
        publisher = publisher.with_youtube(client);
    }

    if let (Some(account_id), Some(token)) = (
        optional_secret(secrets, INSTAGRAM_ACCOUNT_SECRET),
        optional_secret(secrets, INSTAGRAM_TOKEN_SECRET),
    ) {
        let client = InstagramClient::new(&config.publishers, account_id, token)
            .context("Failed to create Instagram client")?;
        publisher = publisher.with_instagram(client);
    }

    if let (Some(token), Some(board_id)) = (
        optional_secret(secrets, PINTEREST_TOKEN_SECRET),
        optional_secret(secrets, PINTEREST_BOARD_SECRET),
    ) {
        let client = PinterestClient::new(&config.publishers, token, board_id)
            .context("Failed to create Pinterest client")?;
        publisher = publisher.with_pinterest(client);
    }

    if let (Some(api_key), Some(api_secret), Some(access_token), Some(access_secret)) = (
        optional_secret(secrets, TWITTER_API_KEY_SECRET),
        optional_secret(secrets, TWITTER_API_SECRET_SECRET),
        optional_secret(secrets, TWITTER_ACCESS_TOKEN_SECRET),
        optional_secret(secrets, TWITTER_ACCESS_SECRET_SECRET),
    ) {
        let credentials = TwitterCredentials {
            api_key,
            api_secret,
            access_token,
            access_secret,
        };
        let client = TwitterClient::new(&config.publishers, credentials)
            .context("Failed to create Twitter client")?;
        publisher = publisher.with_twitter(client);
    }

    info!(
        "Publishing enabled for: {:?}",
        publisher.configured_platforms()
    );
    Ok(publisher)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
