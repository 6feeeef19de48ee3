//! Interaction contracts for editable settings.
//!
//! Cheap, reversible choices are applied the moment they change. Sensitive
//! input (secrets, schedules, links) waits for an explicit confirm.

use crate::panels::cron::CronField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPolicy {
    /// The collaborator is called as soon as the value changes.
    ApplyOnChange,
    /// The value is a local draft until the user confirms.
    ApplyOnConfirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Cron(CronField),
    PlatformCredential,
    DriveFolderUrl,
    ProviderApiKey,
    AgentProvider,
    AgentModel,
}

impl SettingsField {
    pub fn policy(&self) -> InputPolicy {
        match self {
            SettingsField::AgentProvider | SettingsField::AgentModel => InputPolicy::ApplyOnChange,
            SettingsField::Cron(_)
            | SettingsField::PlatformCredential
            | SettingsField::DriveFolderUrl
            | SettingsField::ProviderApiKey => InputPolicy::ApplyOnConfirm,
        }
    }

    /// Secrets are echoed masked while typing.
    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            SettingsField::PlatformCredential | SettingsField::ProviderApiKey
        )
    }

    /// Confirmed values only update a draft that is saved as a whole later.
    pub fn is_staged(&self) -> bool {
        matches!(
            self,
            SettingsField::Cron(_) | SettingsField::PlatformCredential
        )
    }

    pub fn hint(&self) -> &'static str {
        match self.policy() {
            InputPolicy::ApplyOnChange => "applies immediately",
            InputPolicy::ApplyOnConfirm if self.is_staged() => "Enter to stage, s to save",
            InputPolicy::ApplyOnConfirm => "Enter to save",
        }
    }
}
