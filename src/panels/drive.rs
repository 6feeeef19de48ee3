use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{info, warn};

use crate::api::ApiResult;
use crate::model::{GoogleDriveConfig, display_timestamp};
use crate::sync::{Job, LoadState, Refresh, SharedApi};
use crate::toast::ToastChannel;

#[derive(Debug)]
pub enum DriveEvent {
    Loaded(ApiResult<GoogleDriveConfig>),
    Connected(ApiResult<GoogleDriveConfig>),
    Disconnected(ApiResult<()>),
}

/// Google Drive asset folder link.
#[derive(Debug)]
pub struct DrivePanel {
    config: GoogleDriveConfig,
    folder_url: String,
    state: LoadState,
    connecting: bool,
    disconnecting: bool,
}

impl DrivePanel {
    pub fn new() -> Self {
        Self {
            config: GoogleDriveConfig::default(),
            folder_url: String::new(),
            state: LoadState::Idle,
            connecting: false,
            disconnecting: false,
        }
    }

    pub fn config(&self) -> &GoogleDriveConfig {
        &self.config
    }

    pub fn folder_url(&self) -> &str {
        &self.folder_url
    }

    pub fn set_folder_url(&mut self, url: impl Into<String>) {
        self.folder_url = url.into();
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    pub fn is_disconnecting(&self) -> bool {
        self.disconnecting
    }

    pub fn connect_label(&self) -> &'static str {
        if self.connecting {
            "Connecting..."
        } else if self.config.is_connected {
            "Update Folder"
        } else {
            "Connect Folder"
        }
    }

    pub fn last_synced(&self) -> Option<String> {
        self.config.last_synced_at.as_ref().map(display_timestamp)
    }

    pub fn load(&mut self, api: SharedApi) -> Job<DriveEvent> {
        self.state = LoadState::Loading;
        Self::fetch(api).map(DriveEvent::Loaded).boxed()
    }

    pub fn connect(&mut self, api: SharedApi, toasts: &mut ToastChannel) -> Option<Job<DriveEvent>> {
        if self.folder_url.trim().is_empty() {
            toasts.error("Please enter a Google Drive folder URL");
            return None;
        }
        if self.connecting {
            return None;
        }
        self.connecting = true;
        let folder_url = self.folder_url.clone();
        Some(
            async move { DriveEvent::Connected(api.update_google_drive_config(&folder_url).await) }
                .boxed(),
        )
    }

    pub fn disconnect(&mut self, api: SharedApi) -> Option<Job<DriveEvent>> {
        if !self.config.is_connected || self.disconnecting {
            return None;
        }
        self.disconnecting = true;
        Some(async move { DriveEvent::Disconnected(api.disconnect_google_drive().await) }.boxed())
    }

    pub fn handle(&mut self, event: DriveEvent, toasts: &mut ToastChannel) {
        match event {
            DriveEvent::Loaded(result) => self.replace(result),
            DriveEvent::Connected(result) => {
                self.connecting = false;
                match result {
                    Ok(config) => {
                        info!("drive folder connected: {:?}", config.folder_id);
                        self.config = config;
                        toasts.success("Google Drive folder connected");
                    }
                    Err(err) => {
                        warn!("failed to connect drive folder: {}", err);
                        toasts.error(err.message_or("Failed to connect Google Drive"));
                    }
                }
            }
            DriveEvent::Disconnected(result) => {
                self.disconnecting = false;
                match result {
                    Ok(()) => {
                        info!("drive folder disconnected");
                        self.config = GoogleDriveConfig::default();
                        self.folder_url.clear();
                        toasts.success("Google Drive disconnected");
                    }
                    Err(err) => {
                        warn!("failed to disconnect drive folder: {}", err);
                        toasts.error("Failed to disconnect Google Drive");
                    }
                }
            }
        }
    }
}

impl Default for DrivePanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Refresh for DrivePanel {
    type Snapshot = ApiResult<GoogleDriveConfig>;

    fn fetch(api: SharedApi) -> BoxFuture<'static, Self::Snapshot> {
        async move { api.get_google_drive_config().await }.boxed()
    }

    fn replace(&mut self, snapshot: Self::Snapshot) {
        match snapshot {
            Ok(config) => {
                if let Some(url) = config.folder_url.as_deref().filter(|url| !url.is_empty()) {
                    self.folder_url = url.to_string();
                }
                self.config = config;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                warn!("drive config unavailable: {}", err);
                self.state = self.state.after_failure();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemorySettingsApi;
    use crate::toast::ToastKind;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const FOLDER: &str = "https://drive.google.com/drive/folders/1ABCdef";

    fn offline() -> (Arc<InMemorySettingsApi>, SharedApi) {
        let backend = Arc::new(InMemorySettingsApi::new());
        let api: SharedApi = backend.clone();
        (backend, api)
    }

    #[tokio::test]
    async fn blank_url_is_rejected_without_a_call() {
        let (backend, api) = offline();
        let mut panel = DrivePanel::new();
        let mut toasts = ToastChannel::default();
        panel.set_folder_url("  ");

        assert!(panel.connect(api, &mut toasts).is_none());
        assert!(backend.calls().is_empty());
        assert_eq!(
            toasts.current().unwrap().message,
            "Please enter a Google Drive folder URL"
        );
    }

    #[tokio::test]
    async fn connect_replaces_config_from_response() {
        let (_backend, api) = offline();
        let mut panel = DrivePanel::new();
        let mut toasts = ToastChannel::default();
        assert_eq!(panel.connect_label(), "Connect Folder");

        panel.set_folder_url(FOLDER);
        let job = panel.connect(api, &mut toasts).unwrap();
        assert_eq!(panel.connect_label(), "Connecting...");
        panel.handle(job.await, &mut toasts);

        assert!(panel.config().is_connected);
        assert_eq!(panel.config().folder_id.as_deref(), Some("1ABCdef"));
        assert!(panel.last_synced().is_some());
        assert_eq!(panel.connect_label(), "Update Folder");
        assert_eq!(toasts.current().unwrap().message, "Google Drive folder connected");
    }

    #[tokio::test]
    async fn connect_failure_toasts_collaborator_message() {
        let (_backend, api) = offline();
        let mut panel = DrivePanel::new();
        let mut toasts = ToastChannel::default();
        panel.set_folder_url("https://example.com/not-a-folder");

        let job = panel.connect(api, &mut toasts).unwrap();
        panel.handle(job.await, &mut toasts);

        let toast = toasts.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Could not extract folder ID from URL");
        assert!(!panel.config().is_connected);
        assert_eq!(panel.folder_url(), "https://example.com/not-a-folder");
    }

    #[tokio::test]
    async fn load_prefills_url_and_disconnect_clears_everything() {
        let (_backend, api) = offline();
        api.update_google_drive_config(FOLDER).await.unwrap();
        let mut panel = DrivePanel::new();
        let mut toasts = ToastChannel::default();

        let event = panel.load(api.clone()).await;
        panel.handle(event, &mut toasts);
        assert_eq!(panel.folder_url(), FOLDER);

        let job = panel.disconnect(api.clone()).unwrap();
        panel.handle(job.await, &mut toasts);
        assert_eq!(panel.config(), &GoogleDriveConfig::default());
        assert_eq!(panel.folder_url(), "");
        assert_eq!(toasts.current().unwrap().message, "Google Drive disconnected");
        assert!(panel.disconnect(api).is_none());
    }

    #[tokio::test]
    async fn failed_disconnect_keeps_connection() {
        let (backend, api) = offline();
        api.update_google_drive_config(FOLDER).await.unwrap();
        let mut panel = DrivePanel::new();
        let mut toasts = ToastChannel::default();
        let event = panel.load(api.clone()).await;
        panel.handle(event, &mut toasts);

        backend.set_unavailable(true);
        let job = panel.disconnect(api).unwrap();
        panel.handle(job.await, &mut toasts);

        assert!(panel.config().is_connected);
        assert_eq!(toasts.current().unwrap().message, "Failed to disconnect Google Drive");
    }
}
