//! Light/dark theme preference with device fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use core_types::{KvStore, ThemePreference};
use parking_lot::Mutex;
use tracing::warn;

const THEME_KEY: &str = "themePreference";

/// Theme capability object: one per process, handed to every consumer that
/// renders. `System` defers to the device appearance flag.
pub struct ThemeState {
    store: Arc<dyn KvStore>,
    preference: Mutex<ThemePreference>,
    device_dark: AtomicBool,
}

impl ThemeState {
    /// Loads the stored preference, defaulting to `System` when the key is
    /// absent or holds an unknown value.
    pub async fn load(store: Arc<dyn KvStore>, device_dark: bool) -> Result<Self> {
        let preference = match store.get(THEME_KEY).await? {
            Some(raw) => ThemePreference::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown stored theme preference, using system");
                ThemePreference::System
            }),
            None => ThemePreference::System,
        };

        Ok(Self {
            store,
            preference: Mutex::new(preference),
            device_dark: AtomicBool::new(device_dark),
        })
    }

    pub fn preference(&self) -> ThemePreference {
        *self.preference.lock()
    }

    pub fn is_dark_mode(&self) -> bool {
        self.preference()
            .resolves_dark(self.device_dark.load(Ordering::Relaxed))
    }

    /// Called when the device appearance changes; only affects `System`.
    pub fn set_device_dark(&self, device_dark: bool) {
        self.device_dark.store(device_dark, Ordering::Relaxed);
    }

    /// Persists an explicit preference.
    pub async fn set_preference(&self, preference: ThemePreference) -> Result<()> {
        self.store.set(THEME_KEY, preference.as_str()).await?;
        *self.preference.lock() = preference;
        Ok(())
    }

    /// Flips between light and dark, resolving `System` against the device
    /// first. The result is always an explicit mode.
    pub async fn toggle(&self) -> Result<ThemePreference> {
        let next = if self.is_dark_mode() {
            ThemePreference::Light
        } else {
            ThemePreference::Dark
        };
        self.set_preference(next).await?;
        Ok(next)
    }
}
