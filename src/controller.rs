//! Composes the four settings panels behind one tab bar and one toast slot.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use log::debug;
use serde::Serialize;

use crate::model::{AgentModelConfig, CronSettings, GoogleDriveConfig, LlmProvider, PlatformCredential};
use crate::panels::{
    AiModelsEvent, AiModelsPanel, CronEvent, CronField, CronPanel, DriveEvent, DrivePanel,
    PlatformsEvent, PlatformsPanel,
};
use crate::sync::{Job, JobRunner, SharedApi};
use crate::toast::{Toast, ToastChannel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Cron,
    Platforms,
    Drive,
    AiModels,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Cron, Tab::Platforms, Tab::Drive, Tab::AiModels];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Cron => "Cron Schedules",
            Tab::Platforms => "Platforms",
            Tab::Drive => "Google Drive",
            Tab::AiModels => "AI Models",
        }
    }

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|tab| tab == self).unwrap_or(0)
    }

    /// The tab `delta` positions away, wrapping.
    pub fn offset(&self, delta: isize) -> Tab {
        let len = Tab::ALL.len() as isize;
        let index = (self.index() as isize + delta).rem_euclid(len) as usize;
        Tab::ALL[index]
    }
}

#[derive(Debug)]
pub enum SettingsEvent {
    Cron(CronEvent),
    Platforms(PlatformsEvent),
    Drive(DriveEvent),
    AiModels(AiModelsEvent),
}

/// Everything the console shows, in one serialisable value.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsSnapshot {
    pub cron: CronSettings,
    pub platforms: Vec<PlatformCredential>,
    pub google_drive: GoogleDriveConfig,
    pub llm_providers: Vec<LlmProvider>,
    pub agent_models: Vec<AgentModelConfig>,
}

pub struct SettingsController {
    api: SharedApi,
    active_tab: Tab,
    mounted: HashSet<Tab>,
    toasts: ToastChannel,
    jobs: JobRunner<SettingsEvent>,
    pub cron: CronPanel,
    pub platforms: PlatformsPanel,
    pub drive: DrivePanel,
    pub ai_models: AiModelsPanel,
}

impl SettingsController {
    pub fn new(api: SharedApi, toast_lifetime: Duration) -> Self {
        Self {
            api,
            active_tab: Tab::Cron,
            mounted: HashSet::new(),
            toasts: ToastChannel::new(toast_lifetime),
            jobs: JobRunner::new(),
            cron: CronPanel::new(),
            platforms: PlatformsPanel::new(),
            drive: DrivePanel::new(),
            ai_models: AiModelsPanel::new(),
        }
    }

    /// Mounts the initial tab. Must run inside a tokio runtime.
    pub fn start(&mut self) {
        self.activate_tab(self.active_tab);
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn is_mounted(&self, tab: Tab) -> bool {
        self.mounted.contains(&tab)
    }

    /// Switches the rendered panel. A panel loads the first time it is shown.
    pub fn activate_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        if self.mounted.insert(tab) {
            debug!("mounting {:?} panel", tab);
            self.reload(tab);
        }
    }

    pub fn reload(&mut self, tab: Tab) {
        let api = self.api.clone();
        match tab {
            Tab::Cron => {
                let job = self.cron.load(api);
                self.spawn(Some(job), SettingsEvent::Cron);
            }
            Tab::Platforms => {
                let job = self.platforms.load(api);
                self.spawn(Some(job), SettingsEvent::Platforms);
            }
            Tab::Drive => {
                let job = self.drive.load(api);
                self.spawn(Some(job), SettingsEvent::Drive);
            }
            Tab::AiModels => {
                let job = self.ai_models.load(api);
                self.spawn(Some(job), SettingsEvent::AiModels);
            }
        }
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toasts.current()
    }

    pub fn toasts_mut(&mut self) -> &mut ToastChannel {
        &mut self.toasts
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.pending()
    }

    // --- Cron ---

    pub fn step_cron(&mut self, field: CronField, delta: i32) {
        self.cron.step(field, delta);
    }

    pub fn save_cron(&mut self) {
        let job = self.cron.save(self.api.clone());
        self.spawn(job, SettingsEvent::Cron);
    }

    // --- Platforms ---

    pub fn save_platform(&mut self, platform: &str) {
        let job = self.platforms.save(self.api.clone(), platform, &mut self.toasts);
        self.spawn(job, SettingsEvent::Platforms);
    }

    pub fn test_platform(&mut self, platform: &str) {
        let job = self.platforms.test(self.api.clone(), platform);
        self.spawn(job, SettingsEvent::Platforms);
    }

    pub fn remove_platform(&mut self, platform: &str) {
        let job = self.platforms.remove(self.api.clone(), platform);
        self.spawn(job, SettingsEvent::Platforms);
    }

    // --- Drive ---

    pub fn connect_drive(&mut self) {
        let job = self.drive.connect(self.api.clone(), &mut self.toasts);
        self.spawn(job, SettingsEvent::Drive);
    }

    pub fn disconnect_drive(&mut self) {
        let job = self.drive.disconnect(self.api.clone());
        self.spawn(job, SettingsEvent::Drive);
    }

    // --- AI models ---

    pub fn save_provider_key(&mut self, provider: &str) {
        let job = self.ai_models.save_key(self.api.clone(), provider, &mut self.toasts);
        self.spawn(job, SettingsEvent::AiModels);
    }

    pub fn delete_provider_key(&mut self, provider: &str) {
        let job = self.ai_models.delete_key(self.api.clone(), provider);
        self.spawn(job, SettingsEvent::AiModels);
    }

    pub fn test_provider(&mut self, provider: &str) {
        let job = self.ai_models.test_provider(self.api.clone(), provider);
        self.spawn(job, SettingsEvent::AiModels);
    }

    pub fn select_agent_provider(&mut self, agent_id: &str, provider: &str) {
        let job = self
            .ai_models
            .select_provider(self.api.clone(), agent_id, provider, &mut self.toasts);
        self.spawn(job, SettingsEvent::AiModels);
    }

    pub fn select_agent_model(&mut self, agent_id: &str, model: &str) {
        let job = self.ai_models.select_model(self.api.clone(), agent_id, model);
        self.spawn(job, SettingsEvent::AiModels);
    }

    pub fn reset_agent(&mut self, agent_id: &str) {
        let job = self.ai_models.reset_agent(self.api.clone(), agent_id);
        self.spawn(job, SettingsEvent::AiModels);
    }

    fn spawn<E: Send + 'static>(&mut self, job: Option<Job<E>>, wrap: fn(E) -> SettingsEvent) {
        if let Some(job) = job {
            self.jobs.spawn(job.map(wrap).boxed());
        }
    }

    /// Applies finished jobs and expires the toast. Called on every UI tick.
    pub fn tick(&mut self, now: Instant) {
        while let Some(event) = self.jobs.try_next() {
            self.apply(event);
        }
        self.toasts.expire(now);
    }

    /// Waits for every job in flight, including reloads they trigger.
    pub async fn settle(&mut self) {
        while let Some(event) = self.jobs.next().await {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: SettingsEvent) {
        match event {
            SettingsEvent::Cron(event) => self.cron.handle(event, &mut self.toasts),
            SettingsEvent::Platforms(event) => self.platforms.handle(event, &mut self.toasts),
            SettingsEvent::Drive(event) => self.drive.handle(event, &mut self.toasts),
            SettingsEvent::AiModels(event) => self.ai_models.handle(event, &mut self.toasts),
        }
    }

    /// Mounts every tab, waits for the loads and returns what is shown.
    pub async fn load_all(&mut self) -> SettingsSnapshot {
        let initial = self.active_tab;
        for tab in Tab::ALL {
            self.activate_tab(tab);
        }
        self.active_tab = initial;
        self.settle().await;
        self.snapshot()
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            cron: self.cron.draft().clone(),
            platforms: self.platforms.platforms().to_vec(),
            google_drive: self.drive.config().clone(),
            llm_providers: self.ai_models.providers().to_vec(),
            agent_models: self.ai_models.agents().to_vec(),
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

    fn controller() -> (Arc<InMemorySettingsApi>, SettingsController) {
        let backend = Arc::new(InMemorySettingsApi::new());
        let api: SharedApi = backend.clone();
        (backend, SettingsController::new(api, Duration::from_secs(3)))
    }

    #[test]
    fn tabs_wrap_both_ways() {
        assert_eq!(Tab::Cron.offset(-1), Tab::AiModels);
        assert_eq!(Tab::AiModels.offset(1), Tab::Cron);
        assert_eq!(Tab::Platforms.offset(2), Tab::AiModels);
    }

    #[tokio::test]
    async fn panels_mount_once_on_first_activation() {
        let (backend, mut controller) = controller();
        controller.start();
        controller.settle().await;
        assert_eq!(backend.calls(), vec!["get_cron_settings"]);

        controller.activate_tab(Tab::Drive);
        controller.activate_tab(Tab::Cron);
        controller.activate_tab(Tab::Drive);
        controller.settle().await;
        assert_eq!(
            backend.calls(),
            vec!["get_cron_settings", "get_google_drive_config"]
        );
        assert!(controller.is_mounted(Tab::Drive));
        assert!(!controller.is_mounted(Tab::AiModels));
        assert_eq!(controller.active_tab(), Tab::Drive);
    }

    #[tokio::test]
    async fn manual_reload_refetches() {
        let (backend, mut controller) = controller();
        controller.start();
        controller.reload(Tab::Cron);
        controller.settle().await;
        assert_eq!(
            backend.calls(),
            vec!["get_cron_settings", "get_cron_settings"]
        );
    }

    #[tokio::test]
    async fn panels_share_one_toast_slot() {
        let (_backend, mut controller) = controller();
        controller.save_platform("twitter");
        assert_eq!(
            controller.toast().unwrap().message,
            "Please fill in at least one credential field"
        );

        controller.save_cron();
        controller.settle().await;
        let toast = controller.toast().unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.message, "Cron schedules saved successfully");

        controller.tick(Instant::now() + Duration::from_secs(4));
        assert!(controller.toast().is_none());
    }

    #[tokio::test]
    async fn tick_applies_finished_jobs() {
        let (_backend, mut controller) = controller();
        controller.drive.set_folder_url("https://drive.google.com/drive/folders/1XYZ");
        controller.connect_drive();
        assert_eq!(controller.pending_jobs(), 1);

        for _ in 0..50 {
            controller.tick(Instant::now());
            if controller.pending_jobs() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(controller.drive.config().is_connected);
    }

    #[tokio::test]
    async fn load_all_falls_back_when_backend_is_down() {
        let (backend, mut controller) = controller();
        backend.set_unavailable(true);
        let snapshot = controller.load_all().await;

        assert_eq!(snapshot.cron, CronSettings::default());
        assert_eq!(snapshot.platforms.len(), 4);
        assert_eq!(snapshot.google_drive, GoogleDriveConfig::default());
        assert_eq!(snapshot.llm_providers.len(), 5);
        assert_eq!(snapshot.agent_models.len(), 5);
        assert_eq!(controller.active_tab(), Tab::Cron);
        assert!(controller.toast().is_none());
    }
}
