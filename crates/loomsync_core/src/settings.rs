//! The global settings singleton.

use serde::{Deserialize, Serialize};

/// Global application configuration.
///
/// Exactly one logical instance exists, identified by a fixed cache key
/// and a fixed remote row. Initialized to defaults on first run, merged
/// remote-wins on connect, and never deleted - the bulk-erase operation
/// resets it to defaults instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Number of machines on the floor.
    pub machine_count: u32,
    /// Low-efficiency alert threshold, percent (0-100).
    pub alert_threshold: u8,
    /// Remote store endpoint URL. Empty means no remote configured.
    pub remote_endpoint: String,
    /// Remote store credential. Empty means no remote configured.
    pub remote_credential: String,
    /// Free-text messaging template for alerts.
    pub message_template: String,
    /// Messaging recipient for alerts.
    pub message_recipient: String,
}

impl Settings {
    /// Returns true when both endpoint and credential are set, i.e. a
    /// connection attempt is worth making.
    #[must_use]
    pub fn has_remote_config(&self) -> bool {
        !self.remote_endpoint.is_empty() && !self.remote_credential.is_empty()
    }

    /// Applies a partial update, returning the changed settings.
    ///
    /// Unset patch fields keep their current value. The alert threshold
    /// is clamped to 0-100.
    #[must_use]
    pub fn merged(&self, patch: SettingsPatch) -> Self {
        Self {
            machine_count: patch.machine_count.unwrap_or(self.machine_count),
            alert_threshold: patch
                .alert_threshold
                .map(|t| t.min(100))
                .unwrap_or(self.alert_threshold),
            remote_endpoint: patch
                .remote_endpoint
                .unwrap_or_else(|| self.remote_endpoint.clone()),
            remote_credential: patch
                .remote_credential
                .unwrap_or_else(|| self.remote_credential.clone()),
            message_template: patch
                .message_template
                .unwrap_or_else(|| self.message_template.clone()),
            message_recipient: patch
                .message_recipient
                .unwrap_or_else(|| self.message_recipient.clone()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            machine_count: 0,
            alert_threshold: 75,
            remote_endpoint: String::new(),
            remote_credential: String::new(),
            message_template: String::new(),
            message_recipient: String::new(),
        }
    }
}

/// A partial settings update, the input of `update_settings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    /// New machine count, if changing.
    pub machine_count: Option<u32>,
    /// New alert threshold, if changing.
    pub alert_threshold: Option<u8>,
    /// New remote endpoint, if changing.
    pub remote_endpoint: Option<String>,
    /// New remote credential, if changing.
    pub remote_credential: Option<String>,
    /// New messaging template, if changing.
    pub message_template: Option<String>,
    /// New messaging recipient, if changing.
    pub message_recipient: Option<String>,
}

impl SettingsPatch {
    /// Returns true if the patch touches the remote endpoint or
    /// credential, which forces a connection teardown and re-establish.
    #[must_use]
    pub fn changes_remote_config(&self) -> bool {
        self.remote_endpoint.is_some() || self.remote_credential.is_some()
    }
}
