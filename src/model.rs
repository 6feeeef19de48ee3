//! Data model shared by the collaborator contract and the panels.
//!
//! Field names follow the backend's JSON (snake_case). Optional fields default
//! when the backend omits them so a partially populated response still decodes.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog;

/// Schedules for the scheduler, engagement and analytics bots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSettings {
    pub scheduler_hour: u8,
    pub scheduler_minute: u8,
    pub engagement_delay_hours: u8,
    /// 0 = Sunday … 6 = Saturday.
    pub analytics_day_of_week: u8,
    pub analytics_hour: u8,
    pub analytics_minute: u8,
    pub timezone: String,
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            scheduler_hour: 9,
            scheduler_minute: 0,
            engagement_delay_hours: 2,
            analytics_day_of_week: 1,
            analytics_hour: 8,
            analytics_minute: 0,
            timezone: catalog::DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// Stored credentials for one social platform, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCredential {
    pub platform: String,
    #[serde(default)]
    pub is_active: bool,
    /// Names of the fields currently stored server-side.
    #[serde(default)]
    pub credential_keys: Vec<String>,
    /// Field name to redacted display value. Never holds raw secrets.
    #[serde(default)]
    pub masked_credentials: BTreeMap<String, String>,
    #[serde(default)]
    pub last_tested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub test_status: Option<String>,
}

impl PlatformCredential {
    /// An unconfigured card for `platform`.
    pub fn blank(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            is_active: false,
            credential_keys: Vec::new(),
            masked_credentials: BTreeMap::new(),
            last_tested_at: None,
            test_status: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.credential_keys.is_empty()
    }

    pub fn tone(&self) -> StatusTone {
        StatusTone::from_status(self.test_status.as_deref())
    }
}

/// Link between the backend and a Google Drive asset folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleDriveConfig {
    #[serde(default)]
    pub folder_url: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// An LLM provider and the models it offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmProvider {
    pub provider: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub is_configured: bool,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub test_status: Option<String>,
    #[serde(default)]
    pub last_tested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub masked_key: Option<String>,
}

impl LlmProvider {
    /// Built-in entry for `provider`: catalog models, and configured only when
    /// it is the local provider.
    pub fn builtin(provider: &str) -> Self {
        let local = provider == catalog::OLLAMA;
        Self {
            provider: provider.to_string(),
            models: catalog::default_models(provider)
                .iter()
                .map(|model| (*model).to_string())
                .collect(),
            is_configured: local,
            is_enabled: local,
            test_status: None,
            last_tested_at: None,
            masked_key: None,
        }
    }

    pub fn is_local(&self) -> bool {
        self.provider == catalog::OLLAMA
    }

    pub fn tone(&self) -> StatusTone {
        StatusTone::from_status(self.test_status.as_deref())
    }
}

/// Which provider/model an agent runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentModelConfig {
    pub agent_id: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub is_custom: bool,
}

impl AgentModelConfig {
    /// The system default assignment: Ollama with its first catalog model.
    pub fn default_for(agent_id: impl Into<String>) -> Self {
        let (provider, model) = catalog::default_assignment();
        Self {
            agent_id: agent_id.into(),
            provider: provider.to_string(),
            model: model.to_string(),
            is_custom: false,
        }
    }
}

/// Result of a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl TestOutcome {
    pub fn is_connected(&self) -> bool {
        self.status == STATUS_CONNECTED
    }
}

pub const STATUS_CONNECTED: &str = "connected";
pub const STATUS_FAILED: &str = "failed";

/// Display colour class for a literal test status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Connected,
    Failed,
    Neutral,
}

impl StatusTone {
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some(STATUS_CONNECTED) => StatusTone::Connected,
            Some(STATUS_FAILED) => StatusTone::Failed,
            _ => StatusTone::Neutral,
        }
    }
}

/// Formats a server timestamp in local time for display.
pub fn display_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn platform_credential_decodes_with_missing_optionals() {
        let raw = r#"{"platform":"twitter","credential_keys":["api_key"],"test_status":"connected"}"#;
        let parsed: PlatformCredential = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.platform, "twitter");
        assert!(parsed.is_configured());
        assert!(!parsed.is_active);
        assert_eq!(parsed.tone(), StatusTone::Connected);
        assert!(parsed.masked_credentials.is_empty());
    }

    #[test]
    fn unknown_status_strings_stay_neutral() {
        assert_eq!(StatusTone::from_status(Some("pending")), StatusTone::Neutral);
        assert_eq!(StatusTone::from_status(Some("failed")), StatusTone::Failed);
        assert_eq!(StatusTone::from_status(None), StatusTone::Neutral);
    }

    #[test]
    fn drive_timestamps_parse_as_rfc3339() {
        let raw = r#"{"folder_url":"https://drive.google.com/drive/folders/abc","folder_id":"abc","is_connected":true,"last_synced_at":"2024-05-01T10:30:00Z"}"#;
        let parsed: GoogleDriveConfig = serde_json::from_str(raw).unwrap();
        assert!(parsed.is_connected);
        assert_eq!(parsed.folder_id.as_deref(), Some("abc"));
        assert!(parsed.last_synced_at.is_some());
    }

    #[test]
    fn default_agent_assignment_is_local_first_model() {
        let agent = AgentModelConfig::default_for("review_agent");
        assert_eq!(agent.provider, "ollama");
        assert_eq!(agent.model, "llama3");
        assert!(!agent.is_custom);
    }
}
