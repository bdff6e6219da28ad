use std::sync::Arc;

use tracing::{debug, warn};

use crate::{CheckFailure, Image, ImagesClient};

/// How a tracked resource is removed at teardown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cleanup {
    DeleteImage,
}

/// Resources created during a case (or suite set-up) that must be deleted
/// afterwards. Release is best-effort and runs newest first.
pub struct ResourcePool {
    client: Arc<dyn ImagesClient>,
    entries: Vec<(String, Cleanup)>,
}

impl ResourcePool {
    pub fn new(client: Arc<dyn ImagesClient>) -> Self {
        Self {
            client,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, id: impl Into<String>, cleanup: Cleanup) {
        self.entries.push((id.into(), cleanup));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(tracked, _)| tracked == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attempts every cleanup and returns how many of them failed.
    pub async fn release(&mut self) -> usize {
        let mut failures = 0;
        while let Some((id, cleanup)) = self.entries.pop() {
            match cleanup {
                Cleanup::DeleteImage => match self.client.delete_image(&id).await {
                    Ok(resp) if resp.is_success() || resp.status == 404 => {
                        debug!(image_id = %id, status = resp.status, "deleted image");
                    }
                    Ok(resp) => {
                        failures += 1;
                        warn!(image_id = %id, status = resp.status, "image cleanup rejected");
                    }
                    Err(err) => {
                        failures += 1;
                        warn!(image_id = %id, error = %err, "image cleanup failed");
                    }
                },
            }
        }
        failures
    }
}

/// Images registered during suite set-up, handed out one per case.
#[derive(Clone, Debug, Default)]
pub struct RegisteredImages {
    images: Vec<Image>,
}

impl RegisteredImages {
    pub fn new(images: Vec<Image>) -> Self {
        Self { images }
    }

    /// Takes the most recently registered unused image.
    pub fn pop(&mut self) -> Result<Image, CheckFailure> {
        self.images.pop().ok_or_else(|| {
            CheckFailure::Precondition("no registered images left in the pool".into())
        })
    }

    pub fn remaining(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str) -> Image {
        Image {
            id: id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn registered_images_pop_last_in_first_out() {
        let mut pool = RegisteredImages::new(vec![image("first"), image("second")]);
        assert_eq!(pool.pop().unwrap().id, "second");
        assert_eq!(pool.pop().unwrap().id, "first");
        assert!(matches!(pool.pop(), Err(CheckFailure::Precondition(_))));
        assert_eq!(pool.remaining(), 0);
    }
}
