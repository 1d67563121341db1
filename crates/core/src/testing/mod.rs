//! Testing utilities and mock implementations of the collaborator traits.
//!
//! Every external system the orchestrator talks to has a mock here, so the
//! full job lifecycle can run in tests without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelforge_core::orchestrator::ConfigSource;
//! use reelforge_core::testing::{fixtures, VideoBehavior};
//!
//! let harness = fixtures::orchestrator(fixtures::products(3));
//! harness.video.set_behavior("Product 2", VideoBehavior::NeverReady).await;
//!
//! let handle = harness.orchestrator.start_job("daily", ConfigSource::Defaults).await?;
//! let job = fixtures::wait_for_terminal(&harness.orchestrator, &handle.job_id).await;
//! ```

mod mock_products;
mod mock_providers;
mod mock_publisher;
mod mock_state;

pub use mock_products::MockProductSource;
pub use mock_providers::{MockScriptProvider, MockVideoProvider, VideoBehavior};
pub use mock_publisher::{MockPublisher, RecordedPublish};
pub use mock_state::MemoryStateStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::RunDefaults;
    use crate::orchestrator::{Job, JobOrchestrator, OrchestratorConfig};
    use crate::products::{ProductRecord, ProductSource};
    use crate::providers::{ScriptProvider, VideoProvider};
    use crate::publisher::Publisher;
    use crate::state::{RunStateStore, RunStateTracker};

    use super::{
        MemoryStateStore, MockProductSource, MockPublisher, MockScriptProvider, MockVideoProvider,
    };

    /// Create a product with a description, price and tags.
    pub fn product(name: &str) -> ProductRecord {
        let mut product = ProductRecord::named(name);
        product.description = format!("The {} you always wanted.", name.to_lowercase());
        product.price = "19.99".to_string();
        product.tags = vec!["gadget".to_string(), "home".to_string()];
        product
    }

    /// Products named "Product 1" through "Product n".
    pub fn products(n: usize) -> Vec<ProductRecord> {
        (1..=n).map(|i| product(&format!("Product {}", i))).collect()
    }

    /// Defaults with both identifiers set.
    pub fn run_defaults() -> RunDefaults {
        RunDefaults {
            project_id: Some("test-project".to_string()),
            data_source_id: Some("test-products".to_string()),
            products_per_run: 1,
        }
    }

    /// Orchestrator settings with fast polling, a one second render ceiling
    /// and no pause between products.
    pub fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            video_poll_interval_ms: 5,
            video_max_wait_secs: 1,
            delay_between_products_ms: 0,
            ..Default::default()
        }
    }

    /// An orchestrator wired to mocks, with handles to every mock.
    pub struct TestOrchestrator {
        pub orchestrator: JobOrchestrator,
        pub tracker: Arc<RunStateTracker>,
        pub store: Arc<MemoryStateStore>,
        pub products: Arc<MockProductSource>,
        pub script: Arc<MockScriptProvider>,
        pub video: Arc<MockVideoProvider>,
        pub publisher: Arc<MockPublisher>,
    }

    /// Build a [`TestOrchestrator`] over `products` starting at index 0.
    pub fn orchestrator(products: Vec<ProductRecord>) -> TestOrchestrator {
        orchestrator_with(products, MemoryStateStore::new(), fast_config(), run_defaults())
    }

    pub fn orchestrator_with(
        products: Vec<ProductRecord>,
        store: MemoryStateStore,
        config: OrchestratorConfig,
        defaults: RunDefaults,
    ) -> TestOrchestrator {
        let store = Arc::new(store);
        let mut products = MockProductSource::with_products(products);
        if let Some(id) = &defaults.data_source_id {
            products = products.with_source_id(id.clone());
        }
        let products = Arc::new(products);
        let script = Arc::new(MockScriptProvider::new());
        let video = Arc::new(MockVideoProvider::new());
        let publisher = Arc::new(MockPublisher::new());

        let tracker = match RunStateTracker::open(
            Arc::clone(&store) as Arc<dyn RunStateStore>,
            Arc::clone(&products) as Arc<dyn ProductSource>,
        ) {
            Ok(tracker) => Arc::new(tracker),
            Err(e) => panic!("memory store failed to load: {}", e),
        };

        let orchestrator = JobOrchestrator::new(
            config,
            defaults,
            Arc::clone(&tracker),
            Arc::clone(&script) as Arc<dyn ScriptProvider>,
            Arc::clone(&video) as Arc<dyn VideoProvider>,
            Arc::clone(&publisher) as Arc<dyn Publisher>,
        );

        TestOrchestrator {
            orchestrator,
            tracker,
            store,
            products,
            script,
            video,
            publisher,
        }
    }

    /// Poll until the job is completed or failed. Panics after ten seconds.
    pub async fn wait_for_terminal(orchestrator: &JobOrchestrator, job_id: &str) -> Job {
        for _ in 0..1000 {
            if let Ok(job) = orchestrator.get_status(job_id).await {
                if job.status.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish in time", job_id);
    }
}
