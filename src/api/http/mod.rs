use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::model::{
    AgentModelConfig, CronSettings, GoogleDriveConfig, LlmProvider, PlatformCredential,
    TestOutcome,
};

use super::{ApiError, ApiResult, SettingsApi};

mod models;

/// `SettingsApi` 的 HTTP 實作，對應 ClawtBot 後端的 `/api/settings` 路由。
pub struct HttpSettingsApi {
    /// `reqwest` 的非同步 HTTP 客戶端，內部已共用連線池。
    client: Client,
    /// 後端根網址，例如 `http://localhost:8000`。
    base_url: Url,
}

impl HttpSettingsApi {
    /// 建立客戶端。`token` 存在時，每個請求都會附上 Bearer 授權標頭。
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ApiError::Rejected(format!("無效的後端網址 {base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Rejected(format!("無效的後端網址: {base_url}")));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|err| ApiError::Rejected(format!("無效的 API token: {err}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// 由路徑片段組出完整網址；片段會自動進行百分比編碼。
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(["api", "settings"]);
            path.extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// 將非 2xx 回應轉換為 `ApiError::Status`，優先使用後端的 `detail` 訊息。
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<models::ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message())
        .or_else(|| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(|reason| format!("{} {}", status.as_u16(), reason))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SettingsApi for HttpSettingsApi {
    async fn get_cron_settings(&self) -> ApiResult<CronSettings> {
        self.send_json(self.request(Method::GET, &["cron"])).await
    }

    async fn update_cron_settings(&self, settings: CronSettings) -> ApiResult<CronSettings> {
        let request = self.request(Method::PUT, &["cron"]).json(&settings);
        self.send_json(request).await
    }

    async fn list_platform_credentials(&self) -> ApiResult<Vec<PlatformCredential>> {
        self.send_json(self.request(Method::GET, &["platforms"])).await
    }

    async fn save_platform_credential(
        &self,
        platform: &str,
        fields: BTreeMap<String, String>,
    ) -> ApiResult<()> {
        let payload = models::PlatformCredentialPayload {
            credentials: &fields,
        };
        let request = self
            .request(Method::PUT, &["platforms", platform])
            .json(&payload);
        self.send_empty(request).await
    }

    async fn delete_platform_credential(&self, platform: &str) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &["platforms", platform]))
            .await
    }

    async fn test_platform_credential(&self, platform: &str) -> ApiResult<TestOutcome> {
        self.send_json(self.request(Method::POST, &["platforms", platform, "test"]))
            .await
    }

    async fn get_google_drive_config(&self) -> ApiResult<GoogleDriveConfig> {
        self.send_json(self.request(Method::GET, &["google-drive"])).await
    }

    async fn update_google_drive_config(&self, folder_url: &str) -> ApiResult<GoogleDriveConfig> {
        let payload = models::DriveFolderPayload { folder_url };
        let request = self.request(Method::PUT, &["google-drive"]).json(&payload);
        self.send_json(request).await
    }

    async fn disconnect_google_drive(&self) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &["google-drive"]))
            .await
    }

    async fn list_llm_providers(&self) -> ApiResult<Vec<LlmProvider>> {
        self.send_json(self.request(Method::GET, &["llm-providers"])).await
    }

    async fn save_llm_provider_key(&self, provider: &str, key: &str) -> ApiResult<()> {
        let payload = models::ProviderKeyPayload { api_key: key };
        let request = self
            .request(Method::PUT, &["llm-providers", provider])
            .json(&payload);
        self.send_empty(request).await
    }

    async fn delete_llm_provider_key(&self, provider: &str) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &["llm-providers", provider]))
            .await
    }

    async fn test_llm_provider(&self, provider: &str) -> ApiResult<TestOutcome> {
        self.send_json(self.request(Method::POST, &["llm-providers", provider, "test"]))
            .await
    }

    async fn list_agent_model_configs(&self) -> ApiResult<Vec<AgentModelConfig>> {
        self.send_json(self.request(Method::GET, &["agent-models"])).await
    }

    async fn assign_agent_model(
        &self,
        agent_id: &str,
        provider: &str,
        model: &str,
    ) -> ApiResult<()> {
        let payload = models::AgentAssignmentPayload { provider, model };
        let request = self
            .request(Method::PUT, &["agent-models", agent_id])
            .json(&payload);
        self.send_empty(request).await
    }

    async fn reset_agent_model(&self, agent_id: &str) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &["agent-models", agent_id]))
            .await
    }
}
