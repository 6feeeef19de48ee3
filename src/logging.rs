//! 日誌初始化。
//!
//! TUI 會佔用整個終端機，因此日誌寫入檔案（log4rs）；
//! 無介面的 `snapshot` 指令則輸出到 stderr（env_logger，遵循 `RUST_LOG`）。

use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::ConsoleConfig;

const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l:<5} {t} - {m}{n}";

/// 為 TUI 模式設定檔案日誌。
pub fn init_file_logging(config: &ConsoleConfig) -> Result<()> {
    if let Some(path) = config.log_config.as_deref()
        && path.exists()
    {
        return log4rs::init_file(path, Default::default())
            .with_context(|| format!("載入 log4rs 設定失敗: {}", path.display()));
    }
    let log4rs_config = file_config(&config.log_file, LevelFilter::Info)?;
    log4rs::init_config(log4rs_config).context("初始化檔案日誌失敗")?;
    Ok(())
}

fn file_config(log_file: &Path, level: LevelFilter) -> Result<Config> {
    let appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(log_file)
        .with_context(|| format!("無法開啟日誌檔案: {}", log_file.display()))?;
    Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(level))
        .context("建立日誌設定失敗")
}

/// 為無介面指令設定 stderr 日誌，預設等級為 `warn`。
pub fn init_stderr_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("logs").join("console.log");
        let config = file_config(&log_file, LevelFilter::Debug).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert!(log_file.exists());
    }
}
