//! Light/dark theme selection.
//!
//! A stored preference wins over the OS `prefers-color-scheme` signal. Every
//! explicit change (button or OS switch) is written back to storage.

use std::fmt;

use tracing::{debug, warn};

use crate::store::KeyValueStore;

pub const THEME_STORAGE_KEY: &str = "theme-preference";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_storage(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn from_dark(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }

    pub fn storage_value(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Emoji shown on the toggle button.
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Light => "\u{2600}",
            Self::Dark => "\u{1F311}",
        }
    }

    /// Attributes mirrored onto the document root.
    pub fn root_attributes(self) -> [(&'static str, &'static str); 2] {
        let value = self.storage_value();
        [("data-theme", value), ("data-bs-theme", value)]
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_value())
    }
}

/// Stored preference wins; anything other than `light`/`dark` counts
/// as no preference.
pub fn resolve(stored: Option<&str>, os_prefers_dark: bool) -> Theme {
    stored
        .and_then(Theme::from_storage)
        .unwrap_or_else(|| Theme::from_dark(os_prefers_dark))
}

#[derive(Debug)]
pub struct ThemeController<S> {
    store: S,
    key: String,
    theme: Theme,
}

impl<S: KeyValueStore> ThemeController<S> {
    pub fn load(store: S, key: impl Into<String>, os_prefers_dark: bool) -> Self {
        let key = key.into();
        let stored = match store.get(&key) {
            Ok(value) => value,
            Err(error) => {
                warn!(error = %error, "theme preference unreadable");
                None
            }
        };
        let theme = resolve(stored.as_deref(), os_prefers_dark);
        debug!(%theme, "resolved theme");

        Self { store, key, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle(&mut self) -> Theme {
        self.set(self.theme.next())
    }

    pub fn follow_system(&mut self, is_dark: bool) -> Theme {
        self.set(Theme::from_dark(is_dark))
    }

    pub fn set(&mut self, theme: Theme) -> Theme {
        self.theme = theme;
        self.persist();
        theme
    }

    pub fn persist(&self) {
        if let Err(error) = self.store.set(&self.key, self.theme.storage_value()) {
            warn!(error = %error, "failed saving theme preference");
        }
    }
}
