use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 預設設定檔位置（相對於工作目錄）。
pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";
/// 覆寫後端位址的環境變數。
pub const API_URL_ENV: &str = "CLAWT_API_URL";

/// 設定主控台的執行設定，通常從 `config/settings.toml` 載入。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// ClawtBot 後端的根網址，不含 `/api`。
    pub base_url: String,
    /// 直接寫在設定檔中的 API 權杖。
    pub api_token: Option<String>,
    /// 當 `api_token` 未設定時，從這個環境變數讀取權杖。
    pub api_token_env: Option<String>,
    pub request_timeout_secs: u64,
    /// 提示訊息顯示秒數。
    pub toast_seconds: u64,
    pub tick_millis: u64,
    /// TUI 模式下的日誌檔案。
    pub log_file: PathBuf,
    /// 可選的 log4rs YAML 設定；存在時取代內建的檔案輸出。
    pub log_config: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8000"),
            api_token: None,
            api_token_env: None,
            request_timeout_secs: 15,
            toast_seconds: 3,
            tick_millis: 250,
            log_file: PathBuf::from("logs/clawt-settings.log"),
            log_config: None,
        }
    }
}

impl ConsoleConfig {
    /// 讀取設定檔。未指定路徑且預設檔案不存在時使用內建預設值；
    /// 明確指定的路徑不存在則視為錯誤。
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !path.exists() {
            if required {
                anyhow::bail!("找不到設定檔: {}", path.display());
            }
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("讀取設定檔失敗: {}", path.display()))?;
        let parsed: ConsoleConfig = toml::from_str(&raw)
            .with_context(|| format!("解析設定檔失敗: {}", path.display()))?;
        Ok(parsed)
    }

    /// 套用環境變數覆寫。`lookup` 通常是 `std::env::var(..).ok()`。
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.base_url = url;
        }
        if self.api_token.is_none()
            && let Some(name) = self.api_token_env.as_deref()
        {
            self.api_token = lookup(name).filter(|token| !token.trim().is_empty());
        }
    }

    /// 命令列參數優先於設定檔與環境變數。
    pub fn apply_overrides(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url {
            self.base_url = url;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn toast_lifetime(&self) -> Duration {
        Duration::from_secs(self.toast_seconds.max(1))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ConsoleConfig::load(Some(&missing)).unwrap_err();
        assert!(format!("{err}").contains("找不到設定檔"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "base_url = \"https://clawt.example.com\"\ntoast_seconds = 5\napi_token_env = \"CLAWT_TOKEN\"\n",
        )
        .unwrap();

        let config = ConsoleConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "https://clawt.example.com");
        assert_eq!(config.toast_lifetime(), Duration::from_secs(5));
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.log_file, PathBuf::from("logs/clawt-settings.log"));
        assert_eq!(config.api_token_env.as_deref(), Some("CLAWT_TOKEN"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "tick_millis = \"fast\"").unwrap();

        let err = ConsoleConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err}").contains("解析設定檔失敗"));
    }

    #[test]
    fn env_then_flag_override_base_url() {
        let env: HashMap<&str, &str> = HashMap::from([
            (API_URL_ENV, "http://backend:8000"),
            ("CLAWT_TOKEN", "secret-token"),
        ]);
        let mut config = ConsoleConfig {
            api_token_env: Some(String::from("CLAWT_TOKEN")),
            ..ConsoleConfig::default()
        };
        config.apply_env(|name| env.get(name).map(|value| value.to_string()));
        assert_eq!(config.base_url, "http://backend:8000");
        assert_eq!(config.api_token.as_deref(), Some("secret-token"));

        config.apply_overrides(Some(String::from("http://127.0.0.1:9000")));
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn explicit_token_wins_over_env() {
        let mut config = ConsoleConfig {
            api_token: Some(String::from("from-file")),
            api_token_env: Some(String::from("CLAWT_TOKEN")),
            ..ConsoleConfig::default()
        };
        config.apply_env(|_| Some(String::from("from-env")));
        assert_eq!(config.api_token.as_deref(), Some("from-file"));
        assert_eq!(config.base_url, "from-env");
    }
}
