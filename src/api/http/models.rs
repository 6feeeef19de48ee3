//! Request and error bodies exchanged with the settings backend.
//! 後端設定 API 的請求與錯誤結構。

use std::collections::BTreeMap;

// --- Platforms ---
#[derive(serde::Serialize)]
pub struct PlatformCredentialPayload<'a> {
    pub credentials: &'a BTreeMap<String, String>,
}

// --- Google Drive ---
#[derive(serde::Serialize)]
pub struct DriveFolderPayload<'a> {
    pub folder_url: &'a str,
}

// --- LLM providers ---
#[derive(serde::Serialize)]
pub struct ProviderKeyPayload<'a> {
    pub api_key: &'a str,
}

// --- Agents ---
#[derive(serde::Serialize)]
pub struct AgentAssignmentPayload<'a> {
    pub provider: &'a str,
    pub model: &'a str,
}

// --- Errors ---
/// FastAPI style error body: `{"detail": "..."}`.
#[derive(serde::Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Validation errors arrive as a list of objects with a `msg` field.
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::String(text) => Some(text.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            _ => None,
        }
    }
}
