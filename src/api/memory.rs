//! In-process collaborator with backend-like semantics.
//!
//! Used by `--offline` and by the test suite. Every call is recorded so tests
//! can assert which collaborator operations an action actually issued.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Url;

use crate::catalog;
use crate::model::{
    AgentModelConfig, CronSettings, GoogleDriveConfig, LlmProvider, PlatformCredential,
    STATUS_CONNECTED, STATUS_FAILED, TestOutcome,
};

use super::{ApiError, ApiResult, SettingsApi};

#[derive(Debug, Default)]
struct StoredPlatform {
    values: BTreeMap<String, String>,
    last_tested_at: Option<DateTime<Utc>>,
    test_status: Option<String>,
}

#[derive(Debug, Default)]
struct ProviderState {
    key: Option<String>,
    last_tested_at: Option<DateTime<Utc>>,
    test_status: Option<String>,
}

#[derive(Debug)]
struct Store {
    cron: CronSettings,
    platforms: BTreeMap<String, StoredPlatform>,
    drive: GoogleDriveConfig,
    providers: BTreeMap<String, ProviderState>,
    agents: BTreeMap<String, AgentModelConfig>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            cron: CronSettings::default(),
            platforms: BTreeMap::new(),
            drive: GoogleDriveConfig::default(),
            providers: catalog::PROVIDERS
                .iter()
                .map(|spec| (spec.key.to_string(), ProviderState::default()))
                .collect(),
            agents: catalog::AGENTS
                .iter()
                .map(|spec| (spec.key.to_string(), AgentModelConfig::default_for(spec.key)))
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemorySettingsApi {
    store: Mutex<Store>,
    calls: Mutex<Vec<String>>,
    unavailable: AtomicBool,
}

impl InMemorySettingsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail, as if the backend were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Names of the operations issued so far, with their key argument.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn begin(&self, call: String) -> ApiResult<MutexGuard<'_, Store>> {
        debug!("offline backend: {}", call);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected(String::from("settings backend unavailable")));
        }
        self.store
            .lock()
            .map_err(|_| ApiError::Rejected(String::from("settings store poisoned")))
    }
}

/// Redacted display form of a secret.
pub fn mask_secret(value: &str) -> String {
    if value.chars().count() <= 8 {
        return String::from("****");
    }
    let prefix: String = value.chars().take(4).collect();
    format!("{prefix}****")
}

/// Pulls the folder ID out of `/folders/<id>` or `?id=<id>` Drive links.
pub fn extract_folder_id(folder_url: &str) -> Option<String> {
    let url = Url::parse(folder_url.trim()).ok()?;
    let host = url.host_str()?;
    if host != "google.com" && !host.ends_with(".google.com") {
        return None;
    }
    if let Some(mut segments) = url.path_segments()
        && segments.any(|segment| segment == "folders")
        && let Some(id) = segments.next()
        && !id.is_empty()
    {
        return Some(id.to_string());
    }
    url.query_pairs()
        .find(|(name, value)| name == "id" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn clamp(value: u8, min: u8, max: u8) -> u8 {
    value.clamp(min, max)
}

fn platform_view(key: &str, stored: &StoredPlatform) -> PlatformCredential {
    PlatformCredential {
        platform: key.to_string(),
        is_active: !stored.values.is_empty(),
        credential_keys: stored.values.keys().cloned().collect(),
        masked_credentials: stored
            .values
            .iter()
            .map(|(field, value)| (field.clone(), mask_secret(value)))
            .collect(),
        last_tested_at: stored.last_tested_at,
        test_status: stored.test_status.clone(),
    }
}

#[async_trait]
impl SettingsApi for InMemorySettingsApi {
    async fn get_cron_settings(&self) -> ApiResult<CronSettings> {
        let store = self.begin(String::from("get_cron_settings"))?;
        Ok(store.cron.clone())
    }

    async fn update_cron_settings(&self, settings: CronSettings) -> ApiResult<CronSettings> {
        let mut store = self.begin(String::from("update_cron_settings"))?;
        if !catalog::TIMEZONES.contains(&settings.timezone.as_str()) {
            return Err(ApiError::Rejected(format!(
                "Unknown timezone: {}",
                settings.timezone
            )));
        }
        store.cron = CronSettings {
            scheduler_hour: clamp(settings.scheduler_hour, 0, 23),
            scheduler_minute: clamp(settings.scheduler_minute, 0, 59),
            engagement_delay_hours: clamp(settings.engagement_delay_hours, 1, 48),
            analytics_day_of_week: clamp(settings.analytics_day_of_week, 0, 6),
            analytics_hour: clamp(settings.analytics_hour, 0, 23),
            analytics_minute: clamp(settings.analytics_minute, 0, 59),
            timezone: settings.timezone,
        };
        Ok(store.cron.clone())
    }

    async fn list_platform_credentials(&self) -> ApiResult<Vec<PlatformCredential>> {
        let store = self.begin(String::from("list_platform_credentials"))?;
        Ok(store
            .platforms
            .iter()
            .map(|(key, stored)| platform_view(key, stored))
            .collect())
    }

    async fn save_platform_credential(
        &self,
        platform: &str,
        fields: BTreeMap<String, String>,
    ) -> ApiResult<()> {
        let mut store = self.begin(format!("save_platform_credential:{platform}"))?;
        if catalog::platform(platform).is_none() {
            return Err(ApiError::Rejected(format!("Unknown platform: {platform}")));
        }
        let entry = store.platforms.entry(platform.to_string()).or_default();
        for (field, value) in fields {
            if !value.trim().is_empty() {
                entry.values.insert(field, value);
            }
        }
        entry.test_status = None;
        Ok(())
    }

    async fn delete_platform_credential(&self, platform: &str) -> ApiResult<()> {
        let mut store = self.begin(format!("delete_platform_credential:{platform}"))?;
        store
            .platforms
            .remove(platform)
            .map(|_| ())
            .ok_or_else(|| ApiError::Rejected(format!("No credentials stored for {platform}")))
    }

    async fn test_platform_credential(&self, platform: &str) -> ApiResult<TestOutcome> {
        let mut store = self.begin(format!("test_platform_credential:{platform}"))?;
        let stored = store
            .platforms
            .get_mut(platform)
            .ok_or_else(|| ApiError::Rejected(format!("No credentials stored for {platform}")))?;
        let missing: Vec<&str> = catalog::platform_fields(platform)
            .iter()
            .map(|field| field.key)
            .filter(|key| !stored.values.contains_key(*key))
            .collect();
        let outcome = if missing.is_empty() {
            TestOutcome {
                status: STATUS_CONNECTED.to_string(),
                message: format!("{} connection verified", catalog::platform_label(platform)),
            }
        } else {
            TestOutcome {
                status: STATUS_FAILED.to_string(),
                message: format!("Missing fields: {}", missing.join(", ")),
            }
        };
        stored.test_status = Some(outcome.status.clone());
        stored.last_tested_at = Some(Utc::now());
        Ok(outcome)
    }

    async fn get_google_drive_config(&self) -> ApiResult<GoogleDriveConfig> {
        let store = self.begin(String::from("get_google_drive_config"))?;
        Ok(store.drive.clone())
    }

    async fn update_google_drive_config(&self, folder_url: &str) -> ApiResult<GoogleDriveConfig> {
        let mut store = self.begin(String::from("update_google_drive_config"))?;
        let folder_id = extract_folder_id(folder_url).ok_or_else(|| {
            ApiError::Rejected(String::from("Could not extract folder ID from URL"))
        })?;
        store.drive = GoogleDriveConfig {
            folder_url: Some(folder_url.trim().to_string()),
            folder_id: Some(folder_id),
            is_connected: true,
            last_synced_at: Some(Utc::now()),
        };
        Ok(store.drive.clone())
    }

    async fn disconnect_google_drive(&self) -> ApiResult<()> {
        let mut store = self.begin(String::from("disconnect_google_drive"))?;
        store.drive = GoogleDriveConfig::default();
        Ok(())
    }

    async fn list_llm_providers(&self) -> ApiResult<Vec<LlmProvider>> {
        let store = self.begin(String::from("list_llm_providers"))?;
        Ok(catalog::PROVIDERS
            .iter()
            .map(|spec| {
                let mut provider = LlmProvider::builtin(spec.key);
                if let Some(state) = store.providers.get(spec.key) {
                    if let Some(key) = &state.key {
                        provider.is_configured = true;
                        provider.is_enabled = true;
                        provider.masked_key = Some(mask_secret(key));
                    }
                    provider.test_status = state.test_status.clone();
                    provider.last_tested_at = state.last_tested_at;
                }
                provider
            })
            .collect())
    }

    async fn save_llm_provider_key(&self, provider: &str, key: &str) -> ApiResult<()> {
        let mut store = self.begin(format!("save_llm_provider_key:{provider}"))?;
        if provider == catalog::OLLAMA {
            return Err(ApiError::Rejected(String::from(
                "Ollama runs locally and does not need an API key",
            )));
        }
        let state = store
            .providers
            .get_mut(provider)
            .ok_or_else(|| ApiError::Rejected(format!("Unknown provider: {provider}")))?;
        state.key = Some(key.trim().to_string());
        state.test_status = None;
        Ok(())
    }

    async fn delete_llm_provider_key(&self, provider: &str) -> ApiResult<()> {
        let mut store = self.begin(format!("delete_llm_provider_key:{provider}"))?;
        let state = store
            .providers
            .get_mut(provider)
            .ok_or_else(|| ApiError::Rejected(format!("Unknown provider: {provider}")))?;
        *state = ProviderState::default();
        Ok(())
    }

    async fn test_llm_provider(&self, provider: &str) -> ApiResult<TestOutcome> {
        let mut store = self.begin(format!("test_llm_provider:{provider}"))?;
        let state = store
            .providers
            .get_mut(provider)
            .ok_or_else(|| ApiError::Rejected(format!("Unknown provider: {provider}")))?;
        let label = catalog::provider_label(provider);
        let outcome = if provider == catalog::OLLAMA || state.key.is_some() {
            TestOutcome {
                status: STATUS_CONNECTED.to_string(),
                message: format!("{label} is reachable"),
            }
        } else {
            TestOutcome {
                status: STATUS_FAILED.to_string(),
                message: format!("No API key configured for {label}"),
            }
        };
        state.test_status = Some(outcome.status.clone());
        state.last_tested_at = Some(Utc::now());
        Ok(outcome)
    }

    async fn list_agent_model_configs(&self) -> ApiResult<Vec<AgentModelConfig>> {
        let store = self.begin(String::from("list_agent_model_configs"))?;
        Ok(store.agents.values().cloned().collect())
    }

    async fn assign_agent_model(
        &self,
        agent_id: &str,
        provider: &str,
        model: &str,
    ) -> ApiResult<()> {
        let mut store = self.begin(format!("assign_agent_model:{agent_id}:{provider}:{model}"))?;
        let configured = provider == catalog::OLLAMA
            || store
                .providers
                .get(provider)
                .is_some_and(|state| state.key.is_some());
        if !configured {
            return Err(ApiError::Rejected(format!(
                "{} is not configured",
                catalog::provider_label(provider)
            )));
        }
        if !catalog::default_models(provider).contains(&model) {
            return Err(ApiError::Rejected(format!("Unknown model: {model}")));
        }
        let agent = store
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| ApiError::Rejected(format!("Unknown agent: {agent_id}")))?;
        agent.provider = provider.to_string();
        agent.model = model.to_string();
        agent.is_custom = true;
        Ok(())
    }

    async fn reset_agent_model(&self, agent_id: &str) -> ApiResult<()> {
        let mut store = self.begin(format!("reset_agent_model:{agent_id}"))?;
        let agent = store
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| ApiError::Rejected(format!("Unknown agent: {agent_id}")))?;
        *agent = AgentModelConfig::default_for(agent_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn masks_never_leak_short_secrets() {
        assert_eq!(mask_secret("abc"), "****");
        assert_eq!(mask_secret("sk-1234567890"), "sk-1****");
    }

    #[test]
    fn folder_ids_come_from_path_or_query() {
        assert_eq!(
            extract_folder_id("https://drive.google.com/drive/folders/1ABCdef?usp=sharing").as_deref(),
            Some("1ABCdef")
        );
        assert_eq!(
            extract_folder_id("https://drive.google.com/open?id=XYZ").as_deref(),
            Some("XYZ")
        );
        assert_eq!(extract_folder_id("https://example.com/folders/1ABC"), None);
        assert_eq!(extract_folder_id("https://evilgoogle.com/drive/folders/1ABC"), None);
        assert_eq!(
            extract_folder_id("https://drive.google.com.evil.net/drive/folders/1ABC"),
            None
        );
        assert_eq!(extract_folder_id("not a url"), None);
    }

    #[tokio::test]
    async fn provider_key_toggles_configured() {
        let api = InMemorySettingsApi::new();
        api.save_llm_provider_key("openai", "sk-test-key-123").await.unwrap();
        let providers = api.list_llm_providers().await.unwrap();
        let openai = providers.iter().find(|p| p.provider == "openai").unwrap();
        assert!(openai.is_configured);
        assert_eq!(openai.masked_key.as_deref(), Some("sk-t****"));

        api.delete_llm_provider_key("openai").await.unwrap();
        let providers = api.list_llm_providers().await.unwrap();
        let openai = providers.iter().find(|p| p.provider == "openai").unwrap();
        assert!(!openai.is_configured);
        assert!(providers.iter().any(|p| p.provider == "ollama" && p.is_configured));
    }

    #[tokio::test]
    async fn assignment_requires_configured_provider() {
        let api = InMemorySettingsApi::new();
        let err = api
            .assign_agent_model("review_agent", "openai", "gpt-4o")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "OpenAI is not configured");

        api.save_llm_provider_key("openai", "sk-test-key-123").await.unwrap();
        api.assign_agent_model("review_agent", "openai", "gpt-4o")
            .await
            .unwrap();
        let agents = api.list_agent_model_configs().await.unwrap();
        let review = agents.iter().find(|a| a.agent_id == "review_agent").unwrap();
        assert!(review.is_custom);
        assert_eq!(review.model, "gpt-4o");
    }

    #[tokio::test]
    async fn platform_test_reports_missing_fields() {
        let api = InMemorySettingsApi::new();
        let mut fields = BTreeMap::new();
        fields.insert("api_key".to_string(), "AIzaSyExample".to_string());
        api.save_platform_credential("youtube", fields).await.unwrap();

        let outcome = api.test_platform_credential("youtube").await.unwrap();
        assert_eq!(outcome.status, "failed");
        assert_eq!(outcome.message, "Missing fields: client_id, client_secret, refresh_token");
    }

    #[tokio::test]
    async fn unavailable_backend_rejects_but_records() {
        let api = InMemorySettingsApi::new();
        api.set_unavailable(true);
        assert!(api.get_cron_settings().await.is_err());
        assert_eq!(api.calls(), vec!["get_cron_settings".to_string()]);
    }
}
