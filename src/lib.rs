//! ClawtBot 設定主控台。
//!
//! 以終端機介面管理排程、社群平台憑證、Google Drive 資料夾
//! 與 AI 模型供應商，所有設定都透過後端 API 讀寫。

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod event;
pub mod logging;
pub mod model;
pub mod panels;
pub mod policy;
pub mod sync;
pub mod toast;
pub mod tui;
pub mod ui;
