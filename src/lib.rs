pub mod behaviors;
pub mod check;
pub mod config;
pub mod error;
pub mod fixture;
pub mod gate;
pub mod resources;
pub mod runner;
pub mod suites;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
mod http;

pub use behaviors::ImagesBehaviors;
pub use check::CheckFailure;
pub use config::{ImagesClientConfig, SmokeConfig};
pub use error::ImagesError;
pub use fixture::Fixture;
pub use gate::{Capabilities, Capability, Gate};
pub use http::HttpImagesClient;
pub use resources::{Cleanup, RegisteredImages, ResourcePool};
pub use types::*;

use async_trait::async_trait;

/// Trait implemented by clients that can talk to an images v2 endpoint.
///
/// Every operation resolves to an [`ApiResponse`] whatever the status code;
/// only transport and decoding problems surface as [`ImagesError`].
#[async_trait]
pub trait ImagesClient: Send + Sync {
    async fn register_image(
        &self,
        req: RegisterImageRequest,
    ) -> Result<ApiResponse<Image>, ImagesError>;

    async fn delete_image(&self, image_id: &str) -> Result<ApiResponse<()>, ImagesError>;

    async fn store_image_file(
        &self,
        image_id: &str,
        data: Vec<u8>,
    ) -> Result<ApiResponse<()>, ImagesError>;

    async fn get_image_file(&self, image_id: &str) -> Result<ApiResponse<Vec<u8>>, ImagesError>;

    async fn create_task(
        &self,
        input: TaskInput,
        kind: TaskType,
    ) -> Result<ApiResponse<Task>, ImagesError>;

    async fn get_task(&self, task_id: &str) -> Result<ApiResponse<Task>, ImagesError>;
}
