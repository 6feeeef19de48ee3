use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;

use super::{App, InputPromptState, OverlayState, PendingInputAction};
use crate::catalog;
use crate::panels::CronField;

// Implementation block for overlay-related logic in the App.
impl App {
    /// Opens an input prompt overlay for `action`, pre-filled with `initial`.
    pub(crate) fn prompt_input(
        &mut self,
        action: PendingInputAction,
        title: &str,
        initial: Option<String>,
    ) {
        let placeholder = match &action {
            PendingInputAction::CronValue(CronField::Timezone) => String::from("e.g. Europe/Berlin"),
            PendingInputAction::CronValue(field) => match field.bounds() {
                Some((min, max)) => format!("A number from {min} to {max}"),
                None => String::new(),
            },
            PendingInputAction::PlatformField { platform, field } => catalog::platform_fields(platform)
                .iter()
                .find(|spec| spec.key == *field)
                .map(|spec| spec.placeholder.to_string())
                .unwrap_or_default(),
            PendingInputAction::DriveFolderUrl => {
                String::from("https://drive.google.com/drive/folders/1ABC...")
            }
            PendingInputAction::ProviderKey(provider) => {
                format!("Enter {} API key...", catalog::provider_label(provider))
            }
        };
        debug!("Showing input prompt: {}", title);
        self.overlay = Some(OverlayState::InputPrompt(InputPromptState::new(
            title,
            placeholder,
            action,
            initial,
        )));
        self.status_message = format!("{}: waiting for input", title);
    }

    pub(crate) fn handle_overlay_key(&mut self, key: KeyEvent) {
        let Some(OverlayState::InputPrompt(state)) = self.overlay.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.overlay = None;
                self.status_message = String::from("Input cancelled");
            }
            KeyCode::Enter => {
                let state = state.clone();
                self.confirm_input(state);
            }
            KeyCode::Backspace => {
                state.value.pop();
                state.error = None;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                state.value.clear();
                state.error = None;
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                state.value.push(ch);
                state.error = None;
            }
            _ => {}
        }
    }

    /// Writes the prompt value to its target. Invalid input keeps the prompt
    /// open with an error line.
    fn confirm_input(&mut self, state: InputPromptState) {
        let value = state.value.trim().to_string();
        match state.action {
            PendingInputAction::CronValue(CronField::Timezone) => {
                if !self.controller.cron.set_timezone(&value) {
                    self.reject_input(format!("Unknown timezone: {value}"));
                    return;
                }
                self.status_message = String::from("Schedule changed, press s to save");
            }
            PendingInputAction::CronValue(field) => {
                let Some((min, max)) = field.bounds() else {
                    return;
                };
                match value.parse::<u8>() {
                    Ok(number) => {
                        self.controller.cron.set(field, number);
                        self.status_message = String::from("Schedule changed, press s to save");
                    }
                    Err(_) => {
                        self.reject_input(format!("Enter a number from {min} to {max}"));
                        return;
                    }
                }
            }
            PendingInputAction::PlatformField { platform, field } => {
                self.controller.platforms.set_field(&platform, field, value);
                self.status_message = format!("{platform}: press s to save keys");
            }
            PendingInputAction::DriveFolderUrl => {
                self.controller.drive.set_folder_url(value);
                self.controller.connect_drive();
            }
            PendingInputAction::ProviderKey(provider) => {
                self.controller.ai_models.set_key_input(&provider, value);
                self.controller.save_provider_key(&provider);
            }
        }
        self.overlay = None;
    }

    fn reject_input(&mut self, message: String) {
        if let Some(OverlayState::InputPrompt(state)) = self.overlay.as_mut() {
            state.error = Some(message);
        }
    }
}
