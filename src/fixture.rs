use std::sync::Arc;

use crate::{ImagesBehaviors, ImagesClient, ResourcePool, SmokeConfig};

/// Shared state handed to every suite: client, behaviors and configuration.
#[derive(Clone)]
pub struct Fixture {
    pub client: Arc<dyn ImagesClient>,
    pub behaviors: ImagesBehaviors,
    pub config: Arc<SmokeConfig>,
}

impl Fixture {
    pub fn new(config: SmokeConfig, client: Arc<dyn ImagesClient>) -> Self {
        let config = Arc::new(config);
        Self {
            behaviors: ImagesBehaviors::new(client.clone(), config.clone()),
            client,
            config,
        }
    }

    /// Builds a fixture backed by the HTTP client for `config.client`.
    pub fn connect(config: SmokeConfig) -> Result<Self, crate::ImagesError> {
        let client = crate::HttpImagesClient::new(&config.client)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn resource_pool(&self) -> ResourcePool {
        ResourcePool::new(self.client.clone())
    }

    pub fn tenant_id(&self) -> &str {
        &self.config.client.tenant_id
    }
}
