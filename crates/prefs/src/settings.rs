//! Settings flags and the local account profile. Flags store the strings
//! "true"/"false"; an absent key means enabled.

use std::sync::Arc;

use anyhow::Result;
use core_types::KvStore;
use serde::{Deserialize, Serialize};
use tracing::warn;

const NOTIFICATIONS_KEY: &str = "notifications";
const AUTO_SAVE_KEY: &str = "autoSave";
const PROFILE_KEY: &str = "userData";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "User".to_owned(),
            email: "user@example.com".to_owned(),
        }
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KvStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn notifications_enabled(&self) -> Result<bool> {
        self.flag(NOTIFICATIONS_KEY).await
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) -> Result<()> {
        self.store
            .set(NOTIFICATIONS_KEY, if enabled { "true" } else { "false" })
            .await?;
        Ok(())
    }

    pub async fn auto_save_enabled(&self) -> Result<bool> {
        self.flag(AUTO_SAVE_KEY).await
    }

    pub async fn set_auto_save_enabled(&self, enabled: bool) -> Result<()> {
        self.store
            .set(AUTO_SAVE_KEY, if enabled { "true" } else { "false" })
            .await?;
        Ok(())
    }

    /// Stored account record; the defaults stand in until the user edits.
    pub async fn profile(&self) -> Result<UserProfile> {
        match self.store.get(PROFILE_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(profile) => Ok(profile),
                Err(error) => {
                    warn!(%error, "stored profile unreadable, using defaults");
                    Ok(UserProfile::default())
                }
            },
            None => Ok(UserProfile::default()),
        }
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        let raw = serde_json::to_string(profile)?;
        self.store.set(PROFILE_KEY, &raw).await?;
        Ok(())
    }

    // Anything but the literal "false" counts as enabled.
    async fn flag(&self, key: &str) -> Result<bool> {
        Ok(self
            .store
            .get(key)
            .await?
            .map(|value| value != "false")
            .unwrap_or(true))
    }
}
