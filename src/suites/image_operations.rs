//! Image registration and file round trips, gated on the endpoint's
//! image capabilities.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::check::{CheckFailure, expect_status, take_entity};
use crate::runner::{CaseDef, Suite};
use crate::{Capability, Cleanup, Fixture, Gate, RegisteredImages, ResourcePool};

pub const SUITE_NAME: &str = "image-operations";
pub const SUITE_GATE: Gate = Gate::Requires(&[Capability::PostImages]);

/// Images registered in set-up, one per file case.
const PREREGISTERED_IMAGES: usize = 2;

pub const REGISTER_IMAGE: &str = "test_register_image";
pub const STORE_IMAGE_FILE: &str = "test_store_image_file";
pub const GET_IMAGE_FILE: &str = "test_get_image_file";

pub const CASES: &[CaseDef] = &[
    CaseDef {
        name: REGISTER_IMAGE,
        tags: &["smoke"],
        gate: Gate::Always,
    },
    CaseDef {
        name: STORE_IMAGE_FILE,
        tags: &["smoke"],
        gate: Gate::Requires(&[Capability::PutImageFile]),
    },
    CaseDef {
        name: GET_IMAGE_FILE,
        tags: &["smoke"],
        gate: Gate::Requires(&[Capability::PutImageFile, Capability::GetImageFile]),
    },
];

pub struct ImageOperationsSmoke {
    fixture: Fixture,
    registered: RegisteredImages,
}

impl ImageOperationsSmoke {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            registered: RegisteredImages::default(),
        }
    }

    pub fn registered(&self) -> &RegisteredImages {
        &self.registered
    }

    pub async fn test_register_image(
        &mut self,
        resources: &mut ResourcePool,
    ) -> Result<(), CheckFailure> {
        let req = self
            .fixture
            .config
            .default_image_request("smoke-register-image");
        let resp = self.fixture.client.register_image(req).await?;
        expect_status(&resp, 201)?;
        let image = take_entity(resp, "image")?;
        resources.add(image.id, Cleanup::DeleteImage);
        Ok(())
    }

    pub async fn test_store_image_file(&mut self) -> Result<(), CheckFailure> {
        let image = self.registered.pop()?;
        let data = self
            .fixture
            .behaviors
            .read_data_file(&self.fixture.config.test_file)?;

        let resp = self
            .fixture
            .client
            .store_image_file(&image.id, data)
            .await?;
        expect_status(&resp, 204)
    }

    pub async fn test_get_image_file(&mut self) -> Result<(), CheckFailure> {
        let image = self.registered.pop()?;
        let data = self
            .fixture
            .behaviors
            .read_data_file(&self.fixture.config.test_file)?;

        let resp = self
            .fixture
            .client
            .store_image_file(&image.id, data.clone())
            .await?;
        expect_status(&resp, 204)?;

        let resp = self.fixture.client.get_image_file(&image.id).await?;
        expect_status(&resp, 200)?;
        let fetched = take_entity(resp, "image data")?;

        let stored_digest = digest_for(&data);
        let fetched_digest = digest_for(&fetched);
        debug!(image_id = %image.id, digest = %fetched_digest, "fetched image data");
        if stored_digest != fetched_digest {
            return Err(CheckFailure::Assertion(format!(
                "image data changed in round trip: stored {stored_digest} ({} bytes), fetched {fetched_digest} ({} bytes)",
                data.len(),
                fetched.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Suite for ImageOperationsSmoke {
    fn name(&self) -> &'static str {
        SUITE_NAME
    }

    fn gate(&self) -> Gate {
        SUITE_GATE
    }

    fn cases(&self) -> &'static [CaseDef] {
        CASES
    }

    fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    async fn set_up(&mut self, resources: &mut ResourcePool) -> Result<(), CheckFailure> {
        let images = self
            .fixture
            .behaviors
            .register_new_images(PREREGISTERED_IMAGES, resources)
            .await?;
        self.registered = RegisteredImages::new(images);
        Ok(())
    }

    async fn run_case(
        &mut self,
        case: &str,
        resources: &mut ResourcePool,
    ) -> Result<(), CheckFailure> {
        match case {
            REGISTER_IMAGE => self.test_register_image(resources).await,
            STORE_IMAGE_FILE => self.test_store_image_file().await,
            GET_IMAGE_FILE => self.test_get_image_file().await,
            other => Err(CheckFailure::Precondition(format!(
                "unknown case `{other}` in {SUITE_NAME}"
            ))),
        }
    }
}

fn digest_for(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}
