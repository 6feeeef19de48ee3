//! `api` 模組定義設定介面與後端之間的協作契約。
//!
//! 所有持久化、驗證與憑證測試都在後端完成；此處只描述呼叫介面，
//! 具體實作分別位於 `http`（真實後端）與 `memory`（離線模式與測試）。

/// `http` 模組：透過 REST API 與 ClawtBot 後端通訊的實作。
pub mod http;
/// `memory` 模組：在行程內模擬後端行為的實作。
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::model::{
    AgentModelConfig, CronSettings, GoogleDriveConfig, LlmProvider, PlatformCredential,
    TestOutcome,
};

pub use http::HttpSettingsApi;
pub use memory::InMemorySettingsApi;

/// 協作端呼叫失敗時的錯誤類型。
///
/// 介面層只關心「失敗」與一個可選的訊息字串，不解析結構化錯誤碼。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// 後端提供的錯誤訊息（若有）。
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } | ApiError::Rejected(message)
                if !message.trim().is_empty() =>
            {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// 取得可顯示的訊息；沒有內容時使用 `fallback`。
    pub fn message_or(&self, fallback: &str) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            fallback.to_string()
        } else {
            text
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// 設定介面所依賴的後端操作集合。
///
/// 每個方法對應一次後端呼叫。`Send + Sync` 約束讓同一個實例可以被
/// `Arc` 共用並在 tokio 任務之間傳遞。
#[async_trait]
pub trait SettingsApi: Send + Sync {
    async fn get_cron_settings(&self) -> ApiResult<CronSettings>;
    async fn update_cron_settings(&self, settings: CronSettings) -> ApiResult<CronSettings>;

    async fn list_platform_credentials(&self) -> ApiResult<Vec<PlatformCredential>>;
    async fn save_platform_credential(
        &self,
        platform: &str,
        fields: BTreeMap<String, String>,
    ) -> ApiResult<()>;
    async fn delete_platform_credential(&self, platform: &str) -> ApiResult<()>;
    async fn test_platform_credential(&self, platform: &str) -> ApiResult<TestOutcome>;

    async fn get_google_drive_config(&self) -> ApiResult<GoogleDriveConfig>;
    async fn update_google_drive_config(&self, folder_url: &str) -> ApiResult<GoogleDriveConfig>;
    async fn disconnect_google_drive(&self) -> ApiResult<()>;

    async fn list_llm_providers(&self) -> ApiResult<Vec<LlmProvider>>;
    async fn save_llm_provider_key(&self, provider: &str, key: &str) -> ApiResult<()>;
    async fn delete_llm_provider_key(&self, provider: &str) -> ApiResult<()>;
    async fn test_llm_provider(&self, provider: &str) -> ApiResult<TestOutcome>;

    async fn list_agent_model_configs(&self) -> ApiResult<Vec<AgentModelConfig>>;
    async fn assign_agent_model(&self, agent_id: &str, provider: &str, model: &str)
        -> ApiResult<()>;
    async fn reset_agent_model(&self, agent_id: &str) -> ApiResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_only_exposes_server_messages() {
        let status = ApiError::Status {
            status: 400,
            message: "Invalid folder URL".into(),
        };
        assert_eq!(status.detail(), Some("Invalid folder URL"));
        assert_eq!(status.to_string(), "Invalid folder URL");

        let decode = ApiError::Decode("expected object".into());
        assert_eq!(decode.detail(), None);
    }

    #[test]
    fn blank_messages_fall_back() {
        let rejected = ApiError::Rejected(String::new());
        assert_eq!(rejected.message_or("Failed to assign model"), "Failed to assign model");
    }
}
