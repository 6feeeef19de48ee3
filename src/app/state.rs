//! Defines the core state structures for the console.
//!
//! `App` wraps the [`SettingsController`] with everything that only matters to
//! the terminal front end: per-tab cursors, the input prompt overlay and the
//! status line.

use std::time::Duration;

use crate::catalog;
use crate::controller::{SettingsController, Tab};
use crate::panels::CronField;
use crate::policy::SettingsField;

/// The main application state.
pub struct App {
    /// Flag to indicate if the application should quit.
    pub should_quit: bool,
    pub controller: SettingsController,
    /// Cursor row per tab, indexed by `Tab::index`.
    pub(crate) cursors: [usize; 4],
    /// The currently active overlay, if any.
    pub overlay: Option<OverlayState>,
    /// The message currently displayed in the status bar.
    pub status_message: String,
    /// Interval between UI ticks.
    pub tick_rate: Duration,
}

/// One selectable line of the active tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    CronField(CronField),
    CronSave,
    Platform(String),
    PlatformField { platform: String, field: &'static str },
    DriveUrl,
    DriveConnect,
    DriveDisconnect,
    Provider(String),
    Agent(String),
}

impl App {
    pub fn tab(&self) -> Tab {
        self.controller.active_tab()
    }

    /// Rows of the active tab, in display order.
    pub fn rows(&self) -> Vec<Row> {
        match self.tab() {
            Tab::Cron => CronField::ALL
                .into_iter()
                .map(Row::CronField)
                .chain(std::iter::once(Row::CronSave))
                .collect(),
            Tab::Platforms => {
                let panel = &self.controller.platforms;
                let mut rows = Vec::new();
                for plat in panel.platforms() {
                    rows.push(Row::Platform(plat.platform.clone()));
                    if panel.expanded() == Some(plat.platform.as_str()) {
                        rows.extend(catalog::platform_fields(&plat.platform).iter().map(|field| {
                            Row::PlatformField {
                                platform: plat.platform.clone(),
                                field: field.key,
                            }
                        }));
                    }
                }
                rows
            }
            Tab::Drive => {
                let mut rows = vec![Row::DriveUrl, Row::DriveConnect];
                if self.controller.drive.config().is_connected {
                    rows.push(Row::DriveDisconnect);
                }
                rows
            }
            Tab::AiModels => {
                let panel = &self.controller.ai_models;
                panel
                    .providers()
                    .iter()
                    .map(|prov| Row::Provider(prov.provider.clone()))
                    .chain(
                        panel
                            .agents()
                            .iter()
                            .map(|agent| Row::Agent(agent.agent_id.clone())),
                    )
                    .collect()
            }
        }
    }

    /// Cursor of the active tab, clamped to the current row count.
    pub fn cursor(&self) -> usize {
        let len = self.rows().len();
        self.cursors[self.tab().index()].min(len.saturating_sub(1))
    }

    pub fn selected_row(&self) -> Option<Row> {
        let cursor = self.cursor();
        self.rows().into_iter().nth(cursor)
    }

    pub(crate) fn move_cursor(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let current = self.cursor() as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.cursors[self.tab().index()] = next;
    }

    pub(crate) fn select_row(&mut self, row: &Row) {
        if let Some(index) = self.rows().iter().position(|candidate| candidate == row) {
            self.cursors[self.tab().index()] = index;
        }
    }
}

/// Represents the different types of overlays that can be displayed.
#[derive(Debug, Clone)]
pub enum OverlayState {
    InputPrompt(InputPromptState),
}

/// What a confirmed input prompt writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingInputAction {
    CronValue(CronField),
    PlatformField { platform: String, field: &'static str },
    DriveFolderUrl,
    ProviderKey(String),
}

impl PendingInputAction {
    pub fn field(&self) -> SettingsField {
        match self {
            PendingInputAction::CronValue(field) => SettingsField::Cron(*field),
            PendingInputAction::PlatformField { .. } => SettingsField::PlatformCredential,
            PendingInputAction::DriveFolderUrl => SettingsField::DriveFolderUrl,
            PendingInputAction::ProviderKey(_) => SettingsField::ProviderApiKey,
        }
    }
}

/// State for the text input prompt overlay.
#[derive(Debug, Clone)]
pub struct InputPromptState {
    /// The title displayed at the top of the prompt.
    pub title: String,
    /// The current value entered by the user.
    pub value: String,
    /// Placeholder text to display when the input is empty.
    pub placeholder: String,
    /// The action that will be performed upon confirmation.
    pub action: PendingInputAction,
    /// An optional error message to display.
    pub error: Option<String>,
}

impl InputPromptState {
    pub fn new(
        title: impl Into<String>,
        placeholder: impl Into<String>,
        action: PendingInputAction,
        initial: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            value: initial.unwrap_or_default(),
            placeholder: placeholder.into(),
            action,
            error: None,
        }
    }

    /// The value as drawn on screen; secrets are masked.
    pub fn display_value(&self) -> String {
        if self.action.field().is_secret() {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}
