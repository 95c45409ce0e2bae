//! User preferences layered on the on-device store: theme, settings flags,
//! and the local account profile.

pub mod settings;
pub mod theme;

pub use settings::{SettingsStore, UserProfile};
pub use theme::ThemeState;
