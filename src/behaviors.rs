use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::check::field_error;
use crate::{Cleanup, Image, ImagesClient, ImagesError, ResourcePool, SmokeConfig, Task};

pub const TASK_SCHEMA: &str = "/v2/schemas/task";

/// Multi-step helpers shared by the suites.
#[derive(Clone)]
pub struct ImagesBehaviors {
    client: Arc<dyn ImagesClient>,
    config: Arc<SmokeConfig>,
}

impl ImagesBehaviors {
    pub fn new(client: Arc<dyn ImagesClient>, config: Arc<SmokeConfig>) -> Self {
        Self { client, config }
    }

    /// Registers one image with the configured formats.
    pub async fn register_new_image(&self) -> Result<Image, ImagesError> {
        let name = format!("smoke-image-{}", Uuid::new_v4().simple());
        let resp = self
            .client
            .register_image(self.config.default_image_request(name))
            .await?;
        if resp.status != 201 {
            return Err(ImagesError::UnexpectedStatus {
                operation: "register_image",
                expected: 201,
                actual: resp.status,
            });
        }
        let image = resp.entity.ok_or_else(|| {
            ImagesError::InvalidResponse("register_image returned no image".into())
        })?;
        debug!(image_id = %image.id, "registered image");
        Ok(image)
    }

    /// Registers `count` images, adding each to `resources` as soon as it
    /// exists so a later failure still leaves the earlier ones for cleanup.
    pub async fn register_new_images(
        &self,
        count: usize,
        resources: &mut ResourcePool,
    ) -> Result<Vec<Image>, ImagesError> {
        let mut images = Vec::with_capacity(count);
        for _ in 0..count {
            let image = self.register_new_image().await?;
            resources.add(image.id.clone(), Cleanup::DeleteImage);
            images.push(image);
        }
        Ok(images)
    }

    pub fn read_data_file(&self, path: &Path) -> Result<Vec<u8>, ImagesError> {
        Ok(std::fs::read(path)?)
    }

    /// Structural checks every task returned by the API must pass.
    pub fn validate_task(&self, task: &Task) -> Vec<String> {
        let mut errors = Vec::new();

        if Uuid::parse_str(&task.id).is_err() {
            errors.push(field_error("id", "a uuid", format!("{:?}", task.id)));
        }
        if task.created_at.is_none() {
            errors.push(field_error("created_at", "a timestamp", "None"));
        }
        if task.updated_at.is_none() {
            errors.push(field_error("updated_at", "a timestamp", "None"));
        }
        if task.status.is_none() {
            errors.push(field_error("status", "a status", "None"));
        }
        if task.kind.is_none() {
            errors.push(field_error("type", "a task type", "None"));
        }
        let input = task.input.as_ref();
        if input.and_then(|i| i.import_from.as_ref()).is_none() {
            errors.push(field_error("import_from", "a location", "None"));
        }
        if input.and_then(|i| i.import_from_format.as_ref()).is_none() {
            errors.push(field_error("import_from_format", "a format", "None"));
        }
        if task.schema.as_deref() != Some(TASK_SCHEMA) {
            errors.push(field_error("schema", TASK_SCHEMA, display_opt(&task.schema)));
        }
        let expected_self = format!("/v2/tasks/{}", task.id);
        if task.self_link.as_deref() != Some(expected_self.as_str()) {
            errors.push(field_error(
                "self",
                &expected_self,
                display_opt(&task.self_link),
            ));
        }

        errors
    }

    /// Seconds between `reference_secs` and `timestamp`, as an absolute value.
    pub fn get_creation_delta(reference_secs: i64, timestamp: &DateTime<Utc>) -> i64 {
        (timestamp.timestamp() - reference_secs).abs()
    }
}

pub(crate) fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn creation_delta_is_absolute_seconds() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap();
        let reference = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
            .timestamp();
        assert_eq!(ImagesBehaviors::get_creation_delta(reference, &ts), 60);
        assert_eq!(ImagesBehaviors::get_creation_delta(reference + 120, &ts), 60);
        assert_eq!(ImagesBehaviors::get_creation_delta(ts.timestamp(), &ts), 0);
    }
}
