//! Per-site configuration.
//!
//! Both sites share one glue layer; what differs (storage keys, element ids,
//! hook names, class names) lives in `profiles.toml`, embedded at build time
//! and picked at runtime from `<html data-site>`.

use std::collections::BTreeMap;

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::sidebar::DEFAULT_COLLAPSE_WIDTH;
use crate::theme::THEME_STORAGE_KEY;
use crate::unload::DEFAULT_DELETE_ENDPOINT;

const BUILTIN_PROFILES: &str = include_str!("../profiles.toml");

/// DOM ids a site exposes. Missing ids disable the matching feature.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Elements {
    #[serde(default = "default_grid")]
    pub grid: String,
    #[serde(default = "default_item_selector")]
    pub item_selector: String,
    pub sidebar: Option<String>,
    /// Sidebar links that lose the active class whenever a category is
    /// picked, filter chips or not.
    pub nav_link_selector: Option<String>,
    pub header_search: Option<String>,
    pub sidebar_search: Option<String>,
    pub theme_toggle: Option<String>,
    pub drawer_open: Option<String>,
    pub drawer_close: Option<String>,
    pub search_toggle: Option<String>,
    pub search_wrap: Option<String>,
}

impl Default for Elements {
    fn default() -> Self {
        Self {
            grid: default_grid(),
            item_selector: default_item_selector(),
            sidebar: None,
            nav_link_selector: None,
            header_search: None,
            sidebar_search: None,
            theme_toggle: None,
            drawer_open: None,
            drawer_close: None,
            search_toggle: None,
            search_wrap: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SiteProfile {
    #[serde(skip)]
    pub name: String,
    pub jobs_key: String,
    #[serde(default = "default_theme_key")]
    pub theme_key: String,
    #[serde(default = "default_delete_endpoint")]
    pub delete_endpoint: String,
    pub add_job_hook: Option<String>,
    pub remove_job_hook: Option<String>,
    #[serde(default)]
    pub theme_button_label: bool,
    #[serde(default = "default_active_class")]
    pub active_class: String,
    #[serde(default = "default_collapse_width")]
    pub collapse_width: u32,
    #[serde(default)]
    pub elements: Elements,
}

#[derive(Debug, Deserialize)]
struct RawProfiles {
    default: String,
    profiles: BTreeMap<String, SiteProfile>,
}

/// Validated set of site profiles. Only [`Profiles::parse`] builds one,
/// so the default profile always exists.
#[derive(Debug, Clone)]
pub struct Profiles {
    default: String,
    profiles: BTreeMap<String, SiteProfile>,
}

impl Profiles {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::parse(BUILTIN_PROFILES).context("built-in profiles.toml is invalid")
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let RawProfiles {
            default,
            mut profiles,
        } = toml::from_str(text).context("failed to parse site profiles")?;

        for (name, profile) in &mut profiles {
            profile.name = name.clone();
            if profile.jobs_key.trim().is_empty() {
                return Err(anyhow!("profile {name} has an empty jobs_key"));
            }
            if !profile.delete_endpoint.contains("{id}") {
                return Err(anyhow!(
                    "profile {name}: delete_endpoint must contain {{id}}"
                ));
            }
        }

        if !profiles.contains_key(&default) {
            return Err(anyhow!("default profile {default} is not defined"));
        }

        debug!(count = profiles.len(), default = %default, "loaded site profiles");
        Ok(Self { default, profiles })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&SiteProfile> {
        self.profiles.get(name)
    }

    pub fn default_profile(&self) -> &SiteProfile {
        &self.profiles[&self.default]
    }

    /// Looks up `name`, falling back to the default profile.
    pub fn select(&self, name: Option<&str>) -> &SiteProfile {
        match name.map(str::trim) {
            Some(name) if !name.is_empty() => self.get(name).unwrap_or_else(|| {
                warn!(site = %name, fallback = %self.default, "unknown site profile");
                self.default_profile()
            }),
            _ => self.default_profile(),
        }
    }
}

fn default_grid() -> String {
    "tools-grid".to_string()
}

fn default_item_selector() -> String {
    ".tool-item".to_string()
}

fn default_theme_key() -> String {
    THEME_STORAGE_KEY.to_string()
}

fn default_delete_endpoint() -> String {
    DEFAULT_DELETE_ENDPOINT.to_string()
}

fn default_active_class() -> String {
    "is-active".to_string()
}

fn default_collapse_width() -> u32 {
    DEFAULT_COLLAPSE_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_parse() {
        let profiles = Profiles::builtin().expect("builtin");
        assert_eq!(
            profiles.names().collect::<Vec<_>>(),
            vec!["essential-tools", "neonpdf"]
        );

        let neon = profiles.get("neonpdf").expect("neonpdf");
        assert_eq!(neon.name, "neonpdf");
        assert_eq!(neon.jobs_key, "neonpdf-jobs");
        assert_eq!(neon.theme_key, "theme-preference");
        assert_eq!(neon.delete_endpoint, "/api/jobs/{id}/delete");
        assert!(neon.theme_button_label);
        assert_eq!(neon.active_class, "active");
        assert_eq!(
            neon.elements.sidebar_search.as_deref(),
            Some("sidebar-search")
        );

        let essential = profiles.default_profile();
        assert_eq!(essential.name, "essential-tools");
        assert_eq!(
            essential.add_job_hook.as_deref(),
            Some("essentialToolsAddJob")
        );
        assert_eq!(essential.collapse_width, 1024);
        assert_eq!(essential.elements.item_selector, ".tool-item");
    }

    #[test]
    fn neonpdf_clears_every_sidebar_nav_link() {
        let profiles = Profiles::builtin().expect("builtin");

        let neon = profiles.get("neonpdf").expect("neonpdf");
        assert_eq!(neon.elements.nav_link_selector.as_deref(), Some(".nav-link"));
        assert!(neon.elements.search_toggle.is_some());
        assert!(neon.elements.search_wrap.is_some());

        let essential = profiles.default_profile();
        assert!(essential.elements.nav_link_selector.is_none());
    }

    #[test]
    fn unknown_or_missing_site_uses_default() {
        let profiles = Profiles::builtin().expect("builtin");
        assert_eq!(profiles.select(Some("nope")).name, "essential-tools");
        assert_eq!(profiles.select(None).name, "essential-tools");
        assert_eq!(profiles.select(Some(" neonpdf ")).name, "neonpdf");
    }

    #[test]
    fn missing_default_is_rejected() {
        let text = r#"
            default = "ghost"
            [profiles.a]
            jobs_key = "a-jobs"
        "#;
        let err = Profiles::parse(text).expect_err("should fail");
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn endpoint_without_placeholder_is_rejected() {
        let text = r#"
            default = "a"
            [profiles.a]
            jobs_key = "a-jobs"
            delete_endpoint = "/api/jobs/delete"
        "#;
        assert!(Profiles::parse(text).is_err());
    }

    #[test]
    fn minimal_profile_gets_defaults() {
        let text = r#"
            default = "a"
            [profiles.a]
            jobs_key = "a-jobs"
        "#;
        let profiles = Profiles::parse(text).expect("parse");
        let a = profiles.default_profile();
        assert_eq!(a.elements, Elements::default());
        assert_eq!(a.active_class, "is-active");
        assert!(a.add_job_hook.is_none());
    }
}
