//! `app` 模組是設定主控台的前端核心。
//!
//! 它把 `SettingsController` 包裝成終端機介面需要的狀態：
//! 各分頁的游標、輸入提示視窗與狀態列訊息，並處理鍵盤輸入。

// --- 子模組宣告 ---

/// `init` 模組：負責 `App` 結構的初始化。
mod init;
/// `keyboard` 模組：專門處理所有的鍵盤輸入事件。
mod keyboard;
/// `overlays` 模組：管理輸入提示視窗的狀態與確認邏輯。
mod overlays;
/// `state` 模組：定義 `App` 結構以及分頁列、輸入提示等狀態類型。
mod state;
/// `tick` 模組：處理定時更新，套用背景工作結果並讓提示訊息過期。
mod tick;

// --- 公共 API 重新導出 ---
pub use state::{App, InputPromptState, OverlayState, PendingInputAction, Row};
