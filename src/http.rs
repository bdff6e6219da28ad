use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    ApiResponse, CreateTaskRequest, Image, ImagesClient, ImagesClientConfig, ImagesError,
    RegisterImageRequest, Task, TaskInput, TaskType,
};

const AUTH_TOKEN_HEADER: &str = "x-auth-token";
const TENANT_HEADER: &str = "x-tenant-id";

/// [`ImagesClient`] speaking the v2 REST API over reqwest.
#[derive(Clone)]
pub struct HttpImagesClient {
    http: Client,
    base_url: String,
}

impl HttpImagesClient {
    pub fn new(config: &ImagesClientConfig) -> Result<Self, ImagesError> {
        let mut builder = Client::builder()
            .no_proxy()
            .default_headers(default_headers(config)?);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "images api request");
        self.http.request(method, url)
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<ApiResponse<T>, ImagesError> {
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            debug!(status = status.as_u16(), body = %String::from_utf8_lossy(&body), "non-success response");
            return Ok(ApiResponse::status_only(status.as_u16()));
        }
        if body.is_empty() {
            return Ok(ApiResponse::status_only(status.as_u16()));
        }
        let entity = serde_json::from_slice(&body).map_err(|e| {
            ImagesError::InvalidResponse(format!("undecodable {status} body: {e}"))
        })?;
        Ok(ApiResponse::new(status.as_u16(), Some(entity)))
    }

    async fn status_of(resp: Response) -> ApiResponse<()> {
        let status = resp.status().as_u16();
        if let Ok(body) = resp.text().await
            && !body.is_empty()
        {
            debug!(status, %body, "response body ignored");
        }
        ApiResponse::status_only(status)
    }
}

#[async_trait]
impl ImagesClient for HttpImagesClient {
    async fn register_image(
        &self,
        req: RegisterImageRequest,
    ) -> Result<ApiResponse<Image>, ImagesError> {
        let resp = self
            .request(Method::POST, "/v2/images")
            .json(&req)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn delete_image(&self, image_id: &str) -> Result<ApiResponse<()>, ImagesError> {
        let resp = self
            .request(Method::DELETE, &format!("/v2/images/{image_id}"))
            .send()
            .await?;
        Ok(Self::status_of(resp).await)
    }

    async fn store_image_file(
        &self,
        image_id: &str,
        data: Vec<u8>,
    ) -> Result<ApiResponse<()>, ImagesError> {
        let resp = self
            .request(Method::PUT, &format!("/v2/images/{image_id}/file"))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;
        Ok(Self::status_of(resp).await)
    }

    async fn get_image_file(&self, image_id: &str) -> Result<ApiResponse<Vec<u8>>, ImagesError> {
        let resp = self
            .request(Method::GET, &format!("/v2/images/{image_id}/file"))
            .send()
            .await?;
        let status = resp.status();
        if status == reqwest::StatusCode::OK {
            let bytes = resp.bytes().await?;
            Ok(ApiResponse::new(status.as_u16(), Some(bytes.to_vec())))
        } else {
            let status = Self::status_of(resp).await.status;
            Ok(ApiResponse::status_only(status))
        }
    }

    async fn create_task(
        &self,
        input: TaskInput,
        kind: TaskType,
    ) -> Result<ApiResponse<Task>, ImagesError> {
        let resp = self
            .request(Method::POST, "/v2/tasks")
            .json(&CreateTaskRequest { kind, input })
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn get_task(&self, task_id: &str) -> Result<ApiResponse<Task>, ImagesError> {
        let resp = self
            .request(Method::GET, &format!("/v2/tasks/{task_id}"))
            .send()
            .await?;
        Self::decode(resp).await
    }
}

fn default_headers(config: &ImagesClientConfig) -> Result<HeaderMap, ImagesError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &config.auth_token {
        headers.insert(AUTH_TOKEN_HEADER, header_value(token)?);
    }
    headers.insert(TENANT_HEADER, header_value(&config.tenant_id)?);
    if let Some(extra) = &config.extra_headers {
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ImagesError::Config(format!("invalid header name `{name}`: {e}")))?;
            headers.insert(name, header_value(value)?);
        }
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, ImagesError> {
    HeaderValue::from_str(value)
        .map_err(|e| ImagesError::Config(format!("invalid header value: {e}")))
}
