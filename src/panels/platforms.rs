use std::collections::BTreeMap;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{info, warn};

use crate::api::ApiResult;
use crate::catalog;
use crate::model::{PlatformCredential, TestOutcome};
use crate::sync::{InFlight, Job, LoadState, Refresh, SharedApi, mutate_then_refresh};
use crate::toast::{ToastChannel, ToastKind};

pub type PlatformsSnapshot = ApiResult<Vec<PlatformCredential>>;

#[derive(Debug)]
pub enum PlatformsEvent {
    Loaded(PlatformsSnapshot),
    Saved {
        platform: String,
        result: ApiResult<((), PlatformsSnapshot)>,
    },
    Tested {
        platform: String,
        result: ApiResult<(TestOutcome, PlatformsSnapshot)>,
    },
    Removed {
        platform: String,
        result: ApiResult<((), PlatformsSnapshot)>,
    },
}

/// Credential cards for every social platform, plus one draft form each.
#[derive(Debug)]
pub struct PlatformsPanel {
    platforms: Vec<PlatformCredential>,
    expanded: Option<String>,
    forms: BTreeMap<String, BTreeMap<String, String>>,
    saving: InFlight,
    testing: InFlight,
    removing: InFlight,
    state: LoadState,
}

/// One blank card per catalog platform.
pub fn default_platforms() -> Vec<PlatformCredential> {
    catalog::PLATFORMS
        .iter()
        .map(|spec| PlatformCredential::blank(spec.key))
        .collect()
}

impl PlatformsPanel {
    pub fn new() -> Self {
        Self {
            platforms: default_platforms(),
            expanded: None,
            forms: BTreeMap::new(),
            saving: InFlight::default(),
            testing: InFlight::default(),
            removing: InFlight::default(),
            state: LoadState::Idle,
        }
    }

    pub fn platforms(&self) -> &[PlatformCredential] {
        &self.platforms
    }

    pub fn get(&self, platform: &str) -> Option<&PlatformCredential> {
        self.platforms.iter().find(|plat| plat.platform == platform)
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn load(&mut self, api: SharedApi) -> Job<PlatformsEvent> {
        self.state = LoadState::Loading;
        Self::fetch(api).map(PlatformsEvent::Loaded).boxed()
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    /// At most one card is open; opening another closes the current one.
    pub fn toggle_expanded(&mut self, platform: &str) {
        if self.expanded.as_deref() == Some(platform) {
            self.expanded = None;
        } else {
            self.expanded = Some(platform.to_string());
        }
    }

    pub fn field_value(&self, platform: &str, field: &str) -> &str {
        self.forms
            .get(platform)
            .and_then(|form| form.get(field))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_field(&mut self, platform: &str, field: &str, value: impl Into<String>) {
        self.forms
            .entry(platform.to_string())
            .or_default()
            .insert(field.to_string(), value.into());
    }

    pub fn is_saving(&self, platform: &str) -> bool {
        self.saving.contains(platform)
    }

    pub fn is_testing(&self, platform: &str) -> bool {
        self.testing.contains(platform)
    }

    pub fn is_removing(&self, platform: &str) -> bool {
        self.removing.contains(platform)
    }

    /// Test and Remove only make sense once something is stored.
    pub fn can_test(&self, platform: &str) -> bool {
        self.get(platform).is_some_and(PlatformCredential::is_configured)
    }

    /// "3 keys configured • connected", or "Not configured".
    pub fn status_line(&self, platform: &str) -> String {
        let Some(plat) = self.get(platform) else {
            return String::from("Not configured");
        };
        let mut line = if plat.is_configured() {
            format!("{} keys configured", plat.credential_keys.len())
        } else {
            String::from("Not configured")
        };
        if let Some(status) = plat.test_status.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(" • ");
            line.push_str(status);
        }
        line
    }

    pub fn shows_active_badge(&self, platform: &str) -> bool {
        self.get(platform)
            .is_some_and(|plat| plat.is_active && plat.is_configured())
    }

    /// Submits the non-blank fields of the platform's form.
    pub fn save(
        &mut self,
        api: SharedApi,
        platform: &str,
        toasts: &mut ToastChannel,
    ) -> Option<Job<PlatformsEvent>> {
        let fields: BTreeMap<String, String> = self
            .forms
            .get(platform)
            .map(|form| {
                form.iter()
                    .filter(|(_, value)| !value.trim().is_empty())
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if fields.is_empty() {
            toasts.error("Please fill in at least one credential field");
            return None;
        }
        if !self.saving.begin(platform) {
            return None;
        }
        let platform = platform.to_string();
        Some(
            async move {
                let call = api.save_platform_credential(&platform, fields);
                let result = mutate_then_refresh::<Self, _, _>(api.clone(), call).await;
                PlatformsEvent::Saved { platform, result }
            }
            .boxed(),
        )
    }

    pub fn test(&mut self, api: SharedApi, platform: &str) -> Option<Job<PlatformsEvent>> {
        if !self.can_test(platform) || !self.testing.begin(platform) {
            return None;
        }
        let platform = platform.to_string();
        Some(
            async move {
                let call = api.test_platform_credential(&platform);
                let result = mutate_then_refresh::<Self, _, _>(api.clone(), call).await;
                PlatformsEvent::Tested { platform, result }
            }
            .boxed(),
        )
    }

    pub fn remove(&mut self, api: SharedApi, platform: &str) -> Option<Job<PlatformsEvent>> {
        if !self.can_test(platform) || !self.removing.begin(platform) {
            return None;
        }
        let platform = platform.to_string();
        Some(
            async move {
                let call = api.delete_platform_credential(&platform);
                let result = mutate_then_refresh::<Self, _, _>(api.clone(), call).await;
                PlatformsEvent::Removed { platform, result }
            }
            .boxed(),
        )
    }

    pub fn handle(&mut self, event: PlatformsEvent, toasts: &mut ToastChannel) {
        match event {
            PlatformsEvent::Loaded(snapshot) => self.replace(snapshot),
            PlatformsEvent::Saved { platform, result } => {
                self.saving.finish(&platform);
                match result {
                    Ok(((), snapshot)) => {
                        info!("{} credentials saved", platform);
                        self.replace(snapshot);
                        self.forms.remove(&platform);
                        toasts.success(format!("{platform} credentials saved"));
                    }
                    Err(err) => {
                        warn!("failed to save {} credentials: {}", platform, err);
                        toasts.error(format!("Failed to save {platform} credentials"));
                    }
                }
            }
            PlatformsEvent::Tested { platform, result } => {
                self.testing.finish(&platform);
                match result {
                    Ok((outcome, snapshot)) => {
                        let kind = if outcome.is_connected() {
                            ToastKind::Success
                        } else {
                            ToastKind::Error
                        };
                        toasts.show(outcome.message, kind);
                        self.replace(snapshot);
                    }
                    Err(err) => {
                        warn!("{} credential test failed: {}", platform, err);
                        toasts.error(format!("Test failed for {platform}"));
                    }
                }
            }
            PlatformsEvent::Removed { platform, result } => {
                self.removing.finish(&platform);
                match result {
                    Ok(((), snapshot)) => {
                        info!("{} credentials removed", platform);
                        self.replace(snapshot);
                        toasts.success(format!("{platform} credentials removed"));
                    }
                    Err(err) => {
                        warn!("failed to remove {} credentials: {}", platform, err);
                        toasts.error(format!("Failed to remove {platform} credentials"));
                    }
                }
            }
        }
    }
}

impl Default for PlatformsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Refresh for PlatformsPanel {
    type Snapshot = PlatformsSnapshot;

    fn fetch(api: SharedApi) -> BoxFuture<'static, Self::Snapshot> {
        async move { api.list_platform_credentials().await }.boxed()
    }

    /// The backend only reports platforms it has rows for. Catalog platforms
    /// it leaves out are shown as blank cards, in catalog order.
    fn replace(&mut self, snapshot: Self::Snapshot) {
        match snapshot {
            Ok(reported) => {
                let mut platforms: Vec<PlatformCredential> = catalog::PLATFORMS
                    .iter()
                    .map(|spec| {
                        reported
                            .iter()
                            .find(|plat| plat.platform == spec.key)
                            .cloned()
                            .unwrap_or_else(|| PlatformCredential::blank(spec.key))
                    })
                    .collect();
                platforms.extend(
                    reported
                        .into_iter()
                        .filter(|plat| catalog::platform(&plat.platform).is_none()),
                );
                self.platforms = platforms;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                warn!("platform credentials unavailable: {}", err);
                self.state = self.state.after_failure();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemorySettingsApi;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn offline() -> (Arc<InMemorySettingsApi>, SharedApi) {
        let backend = Arc::new(InMemorySettingsApi::new());
        let api: SharedApi = backend.clone();
        (backend, api)
    }

    fn keys(panel: &PlatformsPanel) -> Vec<&str> {
        panel.platforms().iter().map(|p| p.platform.as_str()).collect()
    }

    #[tokio::test]
    async fn empty_response_shows_four_blank_cards() {
        let (_backend, api) = offline();
        let mut panel = PlatformsPanel::new();
        let mut toasts = ToastChannel::default();

        let event = panel.load(api).await;
        panel.handle(event, &mut toasts);

        assert_eq!(keys(&panel), vec!["instagram", "facebook", "twitter", "youtube"]);
        for plat in panel.platforms() {
            assert!(!plat.is_active);
            assert!(plat.credential_keys.is_empty());
            assert_eq!(panel.status_line(&plat.platform), "Not configured");
        }
        assert_eq!(panel.state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn failed_load_keeps_defaults() {
        let (backend, api) = offline();
        backend.set_unavailable(true);
        let mut panel = PlatformsPanel::new();
        let mut toasts = ToastChannel::default();

        let event = panel.load(api).await;
        panel.handle(event, &mut toasts);

        assert_eq!(panel.platforms().len(), 4);
        assert_eq!(panel.state(), LoadState::Fallback);
        assert!(toasts.current().is_none());
    }

    #[tokio::test]
    async fn blank_form_is_rejected_without_a_call() {
        let (backend, api) = offline();
        let mut panel = PlatformsPanel::new();
        let mut toasts = ToastChannel::default();
        panel.set_field("twitter", "api_key", "   ");

        assert!(panel.save(api, "twitter", &mut toasts).is_none());
        assert!(backend.calls().is_empty());
        assert!(!panel.is_saving("twitter"));
        let toast = toasts.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Please fill in at least one credential field");
    }

    #[tokio::test]
    async fn save_drops_blank_fields_and_reloads() {
        let (backend, api) = offline();
        let mut panel = PlatformsPanel::new();
        let mut toasts = ToastChannel::default();
        panel.set_field("twitter", "api_key", "xAi1234567890");
        panel.set_field("twitter", "api_secret", "");

        let job = panel.save(api.clone(), "twitter", &mut toasts).unwrap();
        assert!(panel.is_saving("twitter"));
        assert!(!panel.is_saving("youtube"));
        panel.handle(job.await, &mut toasts);

        assert_eq!(
            backend.calls(),
            vec!["save_platform_credential:twitter", "list_platform_credentials"]
        );
        let twitter = panel.get("twitter").unwrap();
        assert_eq!(twitter.credential_keys, vec!["api_key".to_string()]);
        assert_eq!(twitter.masked_credentials["api_key"], "xAi1****");
        assert_eq!(panel.field_value("twitter", "api_key"), "");
        assert_eq!(panel.status_line("twitter"), "1 keys configured");
        assert!(panel.shows_active_badge("twitter"));
        assert_eq!(toasts.current().unwrap().message, "twitter credentials saved");

        let latest = api.list_platform_credentials().await.unwrap();
        assert_eq!(panel.get("twitter"), latest.iter().find(|p| p.platform == "twitter"));
    }

    #[tokio::test]
    async fn test_toast_follows_server_status() {
        let (_backend, api) = offline();
        let mut panel = PlatformsPanel::new();
        let mut toasts = ToastChannel::default();
        assert!(panel.test(api.clone(), "youtube").is_none());

        panel.set_field("youtube", "api_key", "AIzaSyExample");
        let job = panel.save(api.clone(), "youtube", &mut toasts).unwrap();
        panel.handle(job.await, &mut toasts);

        let job = panel.test(api.clone(), "youtube").unwrap();
        panel.handle(job.await, &mut toasts);
        let toast = toasts.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Missing fields: client_id, client_secret, refresh_token");
        assert_eq!(panel.status_line("youtube"), "1 keys configured • failed");
        assert!(!panel.is_testing("youtube"));
    }

    #[tokio::test]
    async fn failed_save_keeps_form_and_list() {
        let (backend, api) = offline();
        let mut panel = PlatformsPanel::new();
        let mut toasts = ToastChannel::default();
        panel.set_field("facebook", "page_id", "100000000000000");

        backend.set_unavailable(true);
        let job = panel.save(api, "facebook", &mut toasts).unwrap();
        panel.handle(job.await, &mut toasts);

        assert_eq!(panel.field_value("facebook", "page_id"), "100000000000000");
        assert!(!panel.get("facebook").unwrap().is_configured());
        assert_eq!(toasts.current().unwrap().message, "Failed to save facebook credentials");
        assert_eq!(backend.calls(), vec!["save_platform_credential:facebook"]);
    }

    #[tokio::test]
    async fn remove_reloads_to_blank_card() {
        let (_backend, api) = offline();
        let mut panel = PlatformsPanel::new();
        let mut toasts = ToastChannel::default();
        panel.set_field("instagram", "access_token", "EAABwzLixnjY1234");
        let job = panel.save(api.clone(), "instagram", &mut toasts).unwrap();
        panel.handle(job.await, &mut toasts);

        let job = panel.remove(api, "instagram").unwrap();
        panel.handle(job.await, &mut toasts);

        assert!(!panel.get("instagram").unwrap().is_configured());
        assert_eq!(panel.platforms().len(), 4);
        assert_eq!(toasts.current().unwrap().message, "instagram credentials removed");
    }

    #[test]
    fn only_one_card_expands() {
        let mut panel = PlatformsPanel::new();
        panel.toggle_expanded("twitter");
        panel.toggle_expanded("youtube");
        assert_eq!(panel.expanded(), Some("youtube"));
        panel.toggle_expanded("youtube");
        assert_eq!(panel.expanded(), None);
    }
}
