//! State and services behind the tool-grid front ends: theme preference,
//! grid filtering and sorting, the sidebar drawer, and the session job
//! registry with its unload-time cleanup.

pub mod grid;
pub mod jobs;
pub mod page;
pub mod profile;
pub mod sidebar;
pub mod store;
pub mod theme;
pub mod unload;

pub use jobs::{JobId, JobRegistry};
pub use page::{Effect, Page, PageState, UiEvent};
pub use profile::{Profiles, SiteProfile};
pub use store::KeyValueStore;
pub use unload::{Beacon, UnloadNotifier};
