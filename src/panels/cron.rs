use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{info, warn};

use crate::api::ApiResult;
use crate::catalog;
use crate::model::CronSettings;
use crate::sync::{Job, LoadState, Refresh, SharedApi};
use crate::toast::ToastChannel;

/// One editable field of [`CronSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronField {
    SchedulerHour,
    SchedulerMinute,
    EngagementDelayHours,
    AnalyticsDayOfWeek,
    AnalyticsHour,
    AnalyticsMinute,
    Timezone,
}

impl CronField {
    pub const ALL: [CronField; 7] = [
        CronField::SchedulerHour,
        CronField::SchedulerMinute,
        CronField::EngagementDelayHours,
        CronField::AnalyticsDayOfWeek,
        CronField::AnalyticsHour,
        CronField::AnalyticsMinute,
        CronField::Timezone,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CronField::SchedulerHour => "Scheduler hour",
            CronField::SchedulerMinute => "Scheduler minute",
            CronField::EngagementDelayHours => "Engagement delay (hours)",
            CronField::AnalyticsDayOfWeek => "Analytics day",
            CronField::AnalyticsHour => "Analytics hour",
            CronField::AnalyticsMinute => "Analytics minute",
            CronField::Timezone => "Timezone",
        }
    }

    /// Inclusive input bounds for numeric fields.
    pub fn bounds(&self) -> Option<(u8, u8)> {
        match self {
            CronField::SchedulerHour | CronField::AnalyticsHour => Some((0, 23)),
            CronField::SchedulerMinute | CronField::AnalyticsMinute => Some((0, 59)),
            CronField::EngagementDelayHours => Some((1, 48)),
            CronField::AnalyticsDayOfWeek => Some((0, 6)),
            CronField::Timezone => None,
        }
    }

    /// Enumerated fields wrap around instead of clamping.
    fn cycles(&self) -> bool {
        matches!(self, CronField::AnalyticsDayOfWeek | CronField::Timezone)
    }
}

#[derive(Debug)]
pub enum CronEvent {
    Loaded(ApiResult<CronSettings>),
    Saved(ApiResult<CronSettings>),
}

/// Draft of the cron schedules. Edits stay local until `save`.
#[derive(Debug)]
pub struct CronPanel {
    draft: CronSettings,
    state: LoadState,
    saving: bool,
}

impl CronPanel {
    pub fn new() -> Self {
        Self {
            draft: CronSettings::default(),
            state: LoadState::Idle,
            saving: false,
        }
    }

    pub fn draft(&self) -> &CronSettings {
        &self.draft
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn load(&mut self, api: SharedApi) -> Job<CronEvent> {
        self.state = LoadState::Loading;
        Self::fetch(api).map(CronEvent::Loaded).boxed()
    }

    pub fn value(&self, field: CronField) -> u8 {
        match field {
            CronField::SchedulerHour => self.draft.scheduler_hour,
            CronField::SchedulerMinute => self.draft.scheduler_minute,
            CronField::EngagementDelayHours => self.draft.engagement_delay_hours,
            CronField::AnalyticsDayOfWeek => self.draft.analytics_day_of_week,
            CronField::AnalyticsHour => self.draft.analytics_hour,
            CronField::AnalyticsMinute => self.draft.analytics_minute,
            CronField::Timezone => self.timezone_index().unwrap_or(0) as u8,
        }
    }

    pub fn display_value(&self, field: CronField) -> String {
        match field {
            CronField::AnalyticsDayOfWeek => {
                catalog::day_name(self.draft.analytics_day_of_week).to_string()
            }
            CronField::Timezone => self.draft.timezone.clone(),
            CronField::EngagementDelayHours => format!("{} h", self.draft.engagement_delay_hours),
            _ => format!("{:02}", self.value(field)),
        }
    }

    /// Sets a numeric field, held to the field's input bounds.
    pub fn set(&mut self, field: CronField, value: u8) {
        let Some((min, max)) = field.bounds() else {
            if let Some(zone) = catalog::TIMEZONES.get(value as usize) {
                self.draft.timezone = (*zone).to_string();
            }
            return;
        };
        let value = value.clamp(min, max);
        match field {
            CronField::SchedulerHour => self.draft.scheduler_hour = value,
            CronField::SchedulerMinute => self.draft.scheduler_minute = value,
            CronField::EngagementDelayHours => self.draft.engagement_delay_hours = value,
            CronField::AnalyticsDayOfWeek => self.draft.analytics_day_of_week = value,
            CronField::AnalyticsHour => self.draft.analytics_hour = value,
            CronField::AnalyticsMinute => self.draft.analytics_minute = value,
            CronField::Timezone => {}
        }
    }

    /// Moves a field by `delta`. Numbers clamp; day and timezone wrap.
    pub fn step(&mut self, field: CronField, delta: i32) {
        if field == CronField::Timezone && self.timezone_index().is_none() {
            // Zones outside the catalog enter the cycle at either end.
            let entry = if delta < 0 {
                catalog::TIMEZONES.len().saturating_sub(1)
            } else {
                0
            };
            if delta != 0 {
                self.set(field, entry as u8);
            }
            return;
        }
        let (min, max) = field
            .bounds()
            .unwrap_or((0, catalog::TIMEZONES.len().saturating_sub(1) as u8));
        let current = self.value(field) as i32;
        let next = if field.cycles() {
            let span = (max - min) as i32 + 1;
            (current - min as i32 + delta).rem_euclid(span) + min as i32
        } else {
            (current + delta).clamp(min as i32, max as i32)
        };
        self.set(field, next as u8);
    }

    pub fn set_timezone(&mut self, zone: &str) -> bool {
        if catalog::TIMEZONES.contains(&zone) {
            self.draft.timezone = zone.to_string();
            true
        } else {
            false
        }
    }

    fn timezone_index(&self) -> Option<usize> {
        catalog::TIMEZONES
            .iter()
            .position(|zone| *zone == self.draft.timezone)
    }

    /// Sends the whole draft. `None` while a save is already in flight.
    pub fn save(&mut self, api: SharedApi) -> Option<Job<CronEvent>> {
        if self.saving {
            return None;
        }
        self.saving = true;
        let draft = self.draft.clone();
        Some(
            async move { CronEvent::Saved(api.update_cron_settings(draft).await) }.boxed(),
        )
    }

    pub fn handle(&mut self, event: CronEvent, toasts: &mut ToastChannel) {
        match event {
            CronEvent::Loaded(result) => self.replace(result),
            CronEvent::Saved(result) => {
                self.saving = false;
                match result {
                    Ok(updated) => {
                        info!("cron settings saved");
                        self.draft = updated;
                        toasts.success("Cron schedules saved successfully");
                    }
                    Err(err) => {
                        warn!("failed to save cron settings: {}", err);
                        toasts.error("Failed to save cron settings");
                    }
                }
            }
        }
    }
}

impl Default for CronPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Refresh for CronPanel {
    type Snapshot = ApiResult<CronSettings>;

    fn fetch(api: SharedApi) -> BoxFuture<'static, Self::Snapshot> {
        async move { api.get_cron_settings().await }.boxed()
    }

    fn replace(&mut self, snapshot: Self::Snapshot) {
        match snapshot {
            Ok(settings) => {
                self.draft = settings;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                warn!("cron settings unavailable, keeping defaults: {}", err);
                self.state = self.state.after_failure();
            }
        }
    }
}
