use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use image_api_smoke::{
    ApiResponse, Image, ImagesClient, ImagesError, RegisterImageRequest, Task, TaskInput,
    TaskStatus, TaskType,
};
use uuid::Uuid;

/// Knobs for [`InMemoryImagesService`].
#[derive(Clone, Debug)]
pub struct DevConfig {
    pub tenant_id: String,
    /// Return the first task again when an identical import is submitted.
    pub deduplicate_tasks: bool,
    /// Status reported by newly created tasks.
    pub task_status: TaskStatus,
    /// Owner reported on tasks instead of `tenant_id`.
    pub owner: Option<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        DevConfig {
            tenant_id: "dev-tenant".into(),
            deduplicate_tasks: false,
            task_status: TaskStatus::Pending,
            owner: None,
        }
    }
}

/// Number of calls received per operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub register_image: usize,
    pub delete_image: usize,
    pub store_image_file: usize,
    pub get_image_file: usize,
    pub create_task: usize,
    pub get_task: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.register_image
            + self.delete_image
            + self.store_image_file
            + self.get_image_file
            + self.create_task
            + self.get_task
    }
}

#[derive(Default)]
struct State {
    images: HashMap<String, StoredImage>,
    tasks: Vec<Task>,
    deleted: Vec<String>,
    calls: CallCounts,
}

struct StoredImage {
    image: Image,
    data: Option<Vec<u8>>,
}

/// Serves the images v2 operations from process memory.
pub struct InMemoryImagesService {
    cfg: DevConfig,
    state: Mutex<State>,
}

impl InMemoryImagesService {
    pub fn new(cfg: DevConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(State::default()),
        }
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub fn image_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().images.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Ids passed to successful deletes, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    pub fn image_data(&self, image_id: &str) -> Option<Vec<u8>> {
        self.lock()
            .images
            .get(image_id)
            .and_then(|stored| stored.data.clone())
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ImagesClient for InMemoryImagesService {
    async fn register_image(
        &self,
        req: RegisterImageRequest,
    ) -> Result<ApiResponse<Image>, ImagesError> {
        let mut state = self.lock();
        state.calls.register_image += 1;
        let now = Utc::now();
        let image = Image {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            status: Some("queued".into()),
            visibility: Some(req.visibility.unwrap_or_else(|| "private".into())),
            container_format: req.container_format,
            disk_format: req.disk_format,
            owner: Some(self.cfg.tenant_id.clone()),
            tags: req.tags,
            created_at: Some(now),
            updated_at: Some(now),
            ..Default::default()
        };
        state.images.insert(
            image.id.clone(),
            StoredImage {
                image: image.clone(),
                data: None,
            },
        );
        Ok(ApiResponse::new(201, Some(image)))
    }

    async fn delete_image(&self, image_id: &str) -> Result<ApiResponse<()>, ImagesError> {
        let mut state = self.lock();
        state.calls.delete_image += 1;
        if state.images.remove(image_id).is_none() {
            return Ok(ApiResponse::status_only(404));
        }
        state.deleted.push(image_id.to_string());
        Ok(ApiResponse::status_only(204))
    }

    async fn store_image_file(
        &self,
        image_id: &str,
        data: Vec<u8>,
    ) -> Result<ApiResponse<()>, ImagesError> {
        let mut state = self.lock();
        state.calls.store_image_file += 1;
        let Some(stored) = state.images.get_mut(image_id) else {
            return Ok(ApiResponse::status_only(404));
        };
        if stored.data.is_some() {
            return Ok(ApiResponse::status_only(409));
        }
        stored.image.size = Some(data.len() as u64);
        stored.image.status = Some("active".into());
        stored.data = Some(data);
        Ok(ApiResponse::status_only(204))
    }

    async fn get_image_file(&self, image_id: &str) -> Result<ApiResponse<Vec<u8>>, ImagesError> {
        let mut state = self.lock();
        state.calls.get_image_file += 1;
        match state.images.get(image_id) {
            None => Ok(ApiResponse::status_only(404)),
            Some(StoredImage { data: None, .. }) => Ok(ApiResponse::status_only(204)),
            Some(StoredImage {
                data: Some(data), ..
            }) => Ok(ApiResponse::new(200, Some(data.clone()))),
        }
    }

    async fn create_task(
        &self,
        input: TaskInput,
        kind: TaskType,
    ) -> Result<ApiResponse<Task>, ImagesError> {
        let mut state = self.lock();
        state.calls.create_task += 1;
        if input.import_from.is_none() || input.import_from_format.is_none() {
            return Ok(ApiResponse::status_only(400));
        }
        if self.cfg.deduplicate_tasks
            && let Some(existing) = state
                .tasks
                .iter()
                .find(|t| t.kind == Some(kind) && t.input.as_ref() == Some(&input))
        {
            return Ok(ApiResponse::new(201, Some(existing.clone())));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let task = Task {
            self_link: Some(format!("/v2/tasks/{id}")),
            id,
            kind: Some(kind),
            status: Some(self.cfg.task_status),
            input: Some(input),
            result: None,
            owner: Some(
                self.cfg
                    .owner
                    .clone()
                    .unwrap_or_else(|| self.cfg.tenant_id.clone()),
            ),
            message: Some(String::new()),
            expires_at: None,
            created_at: Some(now),
            updated_at: Some(now),
            schema: Some("/v2/schemas/task".into()),
        };
        state.tasks.push(task.clone());
        Ok(ApiResponse::new(201, Some(task)))
    }

    async fn get_task(&self, task_id: &str) -> Result<ApiResponse<Task>, ImagesError> {
        let mut state = self.lock();
        state.calls.get_task += 1;
        match state.tasks.iter().find(|t| t.id == task_id) {
            Some(task) => Ok(ApiResponse::new(200, Some(task.clone()))),
            None => Ok(ApiResponse::status_only(404)),
        }
    }
}
