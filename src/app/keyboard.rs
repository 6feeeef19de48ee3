use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{App, PendingInputAction, Row};
use crate::catalog;
use crate::controller::Tab;

impl App {
    /// The main entry point for handling keyboard events.
    ///
    /// Overlays capture all input; otherwise global shortcuts are tried
    /// before the key is passed to the active tab.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return;
        }

        if self.handle_global_shortcuts(key) {
            return;
        }

        let Some(row) = self.selected_row() else {
            return;
        };
        match self.tab() {
            Tab::Cron => self.handle_cron_key(key, row),
            Tab::Platforms => self.handle_platforms_key(key, row),
            Tab::Drive => self.handle_drive_key(key, row),
            Tab::AiModels => self.handle_models_key(key, row),
        }
    }

    /// Returns `true` if a shortcut was handled.
    fn handle_global_shortcuts(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Char('q'), _) => self.should_quit = true,
            (KeyCode::Tab, _) => self.switch_tab(self.tab().offset(1)),
            (KeyCode::BackTab, _) => self.switch_tab(self.tab().offset(-1)),
            (KeyCode::Char(digit @ '1'..='4'), _) => {
                let index = digit as usize - '1' as usize;
                self.switch_tab(Tab::ALL[index]);
            }
            (KeyCode::Char('r'), _) => {
                let tab = self.tab();
                self.controller.reload(tab);
                self.status_message = format!("Reloading {}", tab.label());
            }
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => self.move_cursor(-1),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => self.move_cursor(1),
            (KeyCode::Esc, _) => self.controller.toasts_mut().dismiss(),
            _ => return false,
        }
        true
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.controller.activate_tab(tab);
        self.status_message = format!("{} panel", tab.label());
    }

    fn handle_cron_key(&mut self, key: KeyEvent, row: Row) {
        match (key.code, row) {
            (KeyCode::Left, Row::CronField(field)) | (KeyCode::Char('-'), Row::CronField(field)) => {
                self.controller.step_cron(field, -1);
            }
            (KeyCode::Right, Row::CronField(field)) | (KeyCode::Char('+'), Row::CronField(field)) => {
                self.controller.step_cron(field, 1);
            }
            (KeyCode::Enter, Row::CronField(field)) => {
                let current = self.controller.cron.display_value(field);
                let initial = match field.bounds() {
                    Some(_) => self.controller.cron.value(field).to_string(),
                    None => current,
                };
                self.prompt_input(PendingInputAction::CronValue(field), field.label(), Some(initial));
            }
            (KeyCode::Enter, Row::CronSave) | (KeyCode::Char('s'), _) => {
                self.controller.save_cron();
                self.status_message = String::from("Saving cron schedules...");
            }
            _ => {}
        }
    }

    fn handle_platforms_key(&mut self, key: KeyEvent, row: Row) {
        let platform = match &row {
            Row::Platform(platform) | Row::PlatformField { platform, .. } => platform.clone(),
            _ => return,
        };
        match (key.code, row) {
            (KeyCode::Enter, Row::Platform(_)) | (KeyCode::Char(' '), Row::Platform(_)) => {
                self.controller.platforms.toggle_expanded(&platform);
                self.select_row(&Row::Platform(platform));
            }
            (KeyCode::Enter, Row::PlatformField { platform, field }) => {
                let label = catalog::platform_fields(&platform)
                    .iter()
                    .find(|spec| spec.key == field)
                    .map(|spec| spec.label)
                    .unwrap_or(field);
                let title = format!("{} {}", catalog::platform_label(&platform), label);
                self.prompt_input(PendingInputAction::PlatformField { platform, field }, &title, None);
            }
            (KeyCode::Char('s'), _) => self.controller.save_platform(&platform),
            (KeyCode::Char('t'), _) => self.controller.test_platform(&platform),
            (KeyCode::Char('x'), _) => self.controller.remove_platform(&platform),
            _ => {}
        }
    }

    fn handle_drive_key(&mut self, key: KeyEvent, row: Row) {
        match (key.code, row) {
            (KeyCode::Enter, Row::DriveUrl) => {
                let current = self.controller.drive.folder_url().to_string();
                self.prompt_input(
                    PendingInputAction::DriveFolderUrl,
                    "Google Drive Folder URL",
                    Some(current),
                );
            }
            (KeyCode::Enter, Row::DriveConnect) => self.controller.connect_drive(),
            (KeyCode::Enter, Row::DriveDisconnect) => self.controller.disconnect_drive(),
            _ => {}
        }
    }

    fn handle_models_key(&mut self, key: KeyEvent, row: Row) {
        match (key.code, row) {
            (KeyCode::Enter, Row::Provider(provider)) if provider != catalog::OLLAMA => {
                let title = format!("{} API key", catalog::provider_label(&provider));
                self.prompt_input(PendingInputAction::ProviderKey(provider), &title, None);
            }
            (KeyCode::Char('t'), Row::Provider(provider)) => self.controller.test_provider(&provider),
            (KeyCode::Char('x'), Row::Provider(provider)) => {
                self.controller.delete_provider_key(&provider)
            }
            (KeyCode::Left, Row::Agent(agent_id)) | (KeyCode::Right, Row::Agent(agent_id)) => {
                let delta = if key.code == KeyCode::Left { -1 } else { 1 };
                if let Some(provider) = self.controller.ai_models.provider_after(&agent_id, delta) {
                    self.controller.select_agent_provider(&agent_id, &provider);
                }
            }
            (KeyCode::Char('['), Row::Agent(agent_id)) | (KeyCode::Char(']'), Row::Agent(agent_id)) => {
                let delta = if key.code == KeyCode::Char('[') { -1 } else { 1 };
                if let Some(model) = self.controller.ai_models.model_after(&agent_id, delta) {
                    self.controller.select_agent_model(&agent_id, &model);
                }
            }
            (KeyCode::Char('x'), Row::Agent(agent_id)) => self.controller.reset_agent(&agent_id),
            _ => {}
        }
    }
}
