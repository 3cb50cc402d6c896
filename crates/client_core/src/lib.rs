use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        HumanBeing, HumanBeingCreateRequest, HumanBeingId, HumanBeingUpdateRequest, WeaponType,
    },
    error::BackendErrorBody,
    protocol::{ListQuery, PageResponse, SoundtrackGroups},
};
use tracing::{debug, warn};
use url::Url;

pub mod error;
pub mod form;
pub mod operations;
pub mod pagination;
pub mod session;

pub use error::{ClientError, ClientResult};
pub use form::{FieldError, FormController, FormDraft, FormField, SubmitOutcome};
pub use operations::{BulkOrchestrator, OperationId, OperationReport, RunState};
pub use pagination::{page_window, ListController, LoadOutcome, PaginationState};
pub use session::{AdminSession, Notice, NoticeKind};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The backend calls the admin surface is built on. Each call is one HTTP
/// request; nothing is retried.
#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn list(&self, query: &ListQuery) -> ClientResult<PageResponse<HumanBeing>>;
    async fn get(&self, id: HumanBeingId) -> ClientResult<HumanBeing>;
    async fn create(&self, request: &HumanBeingCreateRequest) -> ClientResult<HumanBeing>;
    async fn update(
        &self,
        id: HumanBeingId,
        request: &HumanBeingUpdateRequest,
    ) -> ClientResult<HumanBeing>;
    async fn delete(&self, id: HumanBeingId) -> ClientResult<()>;
    async fn delete_all_by_weapon_type(&self, weapon_type: WeaponType) -> ClientResult<()>;
    async fn delete_one_by_weapon_type(&self, weapon_type: WeaponType) -> ClientResult<()>;
    async fn group_by_soundtrack(&self) -> ClientResult<SoundtrackGroups>;
    async fn update_all_moods_to_sadness(&self) -> ClientResult<()>;
    async fn assign_car_to_heroes_without_car(&self) -> ClientResult<()>;
}

#[derive(Debug, Clone)]
pub struct HumanBeingClient {
    http: Client,
    base_url: String,
}

impl HumanBeingClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let parsed = Url::parse(base_url).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "backend request");
        self.http.request(method, format!("{}/human-beings{path}", self.base_url))
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await.inspect_err(|err| {
            warn!(error = %err, "backend request failed to complete");
        })?;
        ensure_success(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        Ok(self.send(builder).await?.json().await?)
    }
}

async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = backend_message(status, &body);
    warn!(status = status.as_u16(), %message, "backend rejected request");
    Err(ClientError::Backend { status, message })
}

/// Resolves the message for a failed response: structured body fields first,
/// then plain text, then a generic status line.
pub(crate) fn backend_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<BackendErrorBody>(body) {
        if let Some(message) = parsed.best_message() {
            return message.to_string();
        }
    }
    let text = body.trim();
    if !text.is_empty() && !text.starts_with('{') && !text.starts_with('<') {
        return text.to_string();
    }
    format!("Request failed with status code {}", status.as_u16())
}

#[async_trait]
impl RecordApi for HumanBeingClient {
    async fn list(&self, query: &ListQuery) -> ClientResult<PageResponse<HumanBeing>> {
        self.send_json(self.request(Method::GET, "").query(query)).await
    }

    async fn get(&self, id: HumanBeingId) -> ClientResult<HumanBeing> {
        self.send_json(self.request(Method::GET, &format!("/{id}"))).await
    }

    async fn create(&self, request: &HumanBeingCreateRequest) -> ClientResult<HumanBeing> {
        self.send_json(self.request(Method::POST, "").json(request)).await
    }

    async fn update(
        &self,
        id: HumanBeingId,
        request: &HumanBeingUpdateRequest,
    ) -> ClientResult<HumanBeing> {
        self.send_json(self.request(Method::PUT, &format!("/{id}")).json(request)).await
    }

    async fn delete(&self, id: HumanBeingId) -> ClientResult<()> {
        self.send(self.request(Method::DELETE, &format!("/{id}"))).await?;
        Ok(())
    }

    async fn delete_all_by_weapon_type(&self, weapon_type: WeaponType) -> ClientResult<()> {
        self.send(self.request(Method::DELETE, &format!("/weapon-type/{weapon_type}/all"))).await?;
        Ok(())
    }

    async fn delete_one_by_weapon_type(&self, weapon_type: WeaponType) -> ClientResult<()> {
        self.send(self.request(Method::DELETE, &format!("/weapon-type/{weapon_type}/one"))).await?;
        Ok(())
    }

    async fn group_by_soundtrack(&self) -> ClientResult<SoundtrackGroups> {
        self.send_json(self.request(Method::GET, "/group/soundtrack")).await
    }

    async fn update_all_moods_to_sadness(&self) -> ClientResult<()> {
        self.send(self.request(Method::PATCH, "/mood/sadness")).await?;
        Ok(())
    }

    async fn assign_car_to_heroes_without_car(&self) -> ClientResult<()> {
        self.send(self.request(Method::PATCH, "/car/assign")).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
