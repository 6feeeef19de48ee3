//! `panels` 模組收錄設定介面的四個面板。
//!
//! 每個面板只管理一種資源：掛載時載入、在本地草稿上編輯、
//! 每個使用者動作發出一次後端呼叫，成功後再整體重新載入。
//! 面板本身不直接執行非同步工作，而是回傳 `Job` 交給控制器排程。

/// `cron` 模組：排程時間（排程器、互動延遲、分析報告）與時區。
pub mod cron;
/// `platforms` 模組：社群平台憑證的儲存、測試與移除。
pub mod platforms;
/// `drive` 模組：Google Drive 素材資料夾的連結與中斷。
pub mod drive;
/// `ai_models` 模組：LLM 供應商金鑰與各代理的模型指派。
pub mod ai_models;

pub use ai_models::{AiModelsEvent, AiModelsPanel};
pub use cron::{CronEvent, CronField, CronPanel};
pub use drive::{DriveEvent, DrivePanel};
pub use platforms::{PlatformsEvent, PlatformsPanel};
