//! Page-level event dispatch.
//!
//! [`PageState::handle`] is a pure reducer from a [`UiEvent`] to a list
//! of [`Effect`]s. [`Page`] wraps it together with the storage-backed
//! services, runs the effects that touch storage or the network, and
//! hands the DOM effects back to the shell.

use tracing::{debug, trace};

use crate::grid::{CategoryFilter, GridState, SortMode, ToolItem};
use crate::jobs::{JobId, JobRegistry};
use crate::profile::SiteProfile;
use crate::sidebar::{Drawer, SearchPanel, SearchSource, Viewport};
use crate::store::KeyValueStore;
use crate::theme::{Theme, ThemeController};
use crate::unload::{Beacon, DeleteEndpoint, UnloadNotifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ThemeToggled,
    SystemThemeChanged { dark: bool },
    SearchInput { source: SearchSource, value: String },
    CategoryChosen { filter: Option<String> },
    SortChosen { sort: Option<String> },
    DrawerOpenRequested,
    DrawerCloseRequested,
    BodyClicked { inside_sidebar: bool, inside_opener: bool },
    SearchPanelToggled,
    JobStarted { id: JobId },
    JobFinished { id: JobId },
    Unloading,
    /// The document came back from the back/forward cache.
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ApplyTheme(Theme),
    PersistTheme(Theme),
    /// `visible[i]` is for the i-th item in page-load DOM order. `order`
    /// is present only when the items must be re-appended.
    Render {
        visible: Vec<bool>,
        order: Option<Vec<usize>>,
    },
    MarkCategory(CategoryFilter),
    MarkSort(SortMode),
    SetDrawer(bool),
    SetSearchPanel(bool),
    FocusSearch(SearchSource),
    TrackJob(JobId),
    ForgetJob(JobId),
    FlushJobs,
    RearmCleanup,
}

#[derive(Debug, Clone)]
pub struct PageState {
    pub theme: Theme,
    pub grid: GridState,
    pub drawer: Drawer,
    pub search_panel: SearchPanel,
    search_source: SearchSource,
    header_query: String,
    sidebar_query: String,
    items: Vec<ToolItem>,
}

impl PageState {
    pub fn new(theme: Theme, items: Vec<ToolItem>, collapse_width: u32) -> Self {
        Self {
            theme,
            grid: GridState::new(),
            drawer: Drawer::new(collapse_width),
            search_panel: SearchPanel::default(),
            search_source: SearchSource::default(),
            header_query: String::new(),
            sidebar_query: String::new(),
            items,
        }
    }

    pub fn with_search_panel(mut self, panel: SearchPanel) -> Self {
        self.search_panel = panel;
        self
    }

    /// Seeds both inputs with text the browser restored into them.
    ///
    /// The header input drives the grid unless it is blank and the
    /// sidebar input is not.
    pub fn with_queries(mut self, header: Option<String>, sidebar: Option<String>) -> Self {
        self.header_query = header.unwrap_or_default();
        self.sidebar_query = sidebar.unwrap_or_default();
        self.search_source =
            if self.header_query.trim().is_empty() && !self.sidebar_query.trim().is_empty() {
                SearchSource::Sidebar
            } else {
                SearchSource::Header
            };
        self.sync_query();
        self
    }

    pub fn items(&self) -> &[ToolItem] {
        &self.items
    }

    pub fn search_source(&self) -> SearchSource {
        self.search_source
    }

    /// Effects to bring a freshly loaded page in line with the state.
    pub fn initial_effects(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::ApplyTheme(self.theme)];
        if !self.items.is_empty() {
            effects.push(self.render(true));
        }
        effects
    }

    pub fn handle(&mut self, event: UiEvent, viewport: &Viewport) -> Vec<Effect> {
        trace!(?event, "handling ui event");
        match event {
            UiEvent::ThemeToggled => self.set_theme(self.theme.next()),
            UiEvent::SystemThemeChanged { dark } => self.set_theme(Theme::from_dark(dark)),
            UiEvent::SearchInput { source, value } => {
                match source {
                    SearchSource::Header => self.header_query = value,
                    SearchSource::Sidebar => self.sidebar_query = value,
                }
                self.search_source = source;
                self.sync_query();
                self.render_if_items(false).into_iter().collect()
            }
            UiEvent::CategoryChosen { filter } => {
                self.grid.category = CategoryFilter::parse(filter.as_deref());
                let mut effects = vec![Effect::MarkCategory(self.grid.category.clone())];
                effects.extend(self.render_if_items(false));
                effects.extend(self.collapse_drawer(viewport));
                effects
            }
            UiEvent::SortChosen { sort } => {
                self.grid.sort = SortMode::parse(sort.as_deref());
                let mut effects = vec![Effect::MarkSort(self.grid.sort)];
                effects.extend(self.render_if_items(true));
                effects.extend(self.collapse_drawer(viewport));
                effects
            }
            UiEvent::DrawerOpenRequested => {
                if self.drawer.open() {
                    vec![Effect::SetDrawer(true)]
                } else {
                    vec![]
                }
            }
            UiEvent::DrawerCloseRequested => {
                if self.drawer.close() {
                    vec![Effect::SetDrawer(false)]
                } else {
                    vec![]
                }
            }
            UiEvent::BodyClicked {
                inside_sidebar,
                inside_opener,
            } => {
                if self.drawer.on_body_click(inside_sidebar, inside_opener) {
                    vec![Effect::SetDrawer(false)]
                } else {
                    vec![]
                }
            }
            UiEvent::SearchPanelToggled => {
                let visible = self.search_panel.toggle();
                let mut effects = vec![Effect::SetSearchPanel(visible)];
                if visible {
                    self.search_source = SearchSource::Sidebar;
                    self.sync_query();
                    effects.push(Effect::FocusSearch(SearchSource::Sidebar));
                    effects.extend(self.render_if_items(false));
                }
                effects
            }
            UiEvent::JobStarted { id } => vec![Effect::TrackJob(id)],
            UiEvent::JobFinished { id } => vec![Effect::ForgetJob(id)],
            UiEvent::Unloading => vec![Effect::FlushJobs],
            UiEvent::Restored => vec![Effect::RearmCleanup],
        }
    }

    fn set_theme(&mut self, theme: Theme) -> Vec<Effect> {
        self.theme = theme;
        vec![Effect::PersistTheme(theme), Effect::ApplyTheme(theme)]
    }

    fn sync_query(&mut self) {
        let query = match self.search_source {
            SearchSource::Header => &self.header_query,
            SearchSource::Sidebar => &self.sidebar_query,
        };
        self.grid.set_query(query);
    }

    fn collapse_drawer(&mut self, viewport: &Viewport) -> Option<Effect> {
        self.drawer
            .on_selection(viewport)
            .then_some(Effect::SetDrawer(false))
    }

    fn render_if_items(&self, reorder: bool) -> Option<Effect> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.render(reorder))
    }

    fn render(&self, reorder: bool) -> Effect {
        Effect::Render {
            visible: self.grid.visibility(&self.items),
            order: reorder.then(|| self.grid.order(&self.items)),
        }
    }
}

/// Reducer plus the services behind it: theme preference in `L`
/// (local storage), job ids in `S` (session storage), cleanup via `B`.
#[derive(Debug)]
pub struct Page<L, S, B> {
    state: PageState,
    theme: ThemeController<L>,
    notifier: UnloadNotifier<S, B>,
}

impl<L, S, B> Page<L, S, B>
where
    L: KeyValueStore,
    S: KeyValueStore,
    B: Beacon,
{
    pub fn new(
        profile: &SiteProfile,
        local: L,
        session: S,
        beacon: B,
        os_prefers_dark: bool,
        items: Vec<ToolItem>,
    ) -> Self {
        let theme = ThemeController::load(local, profile.theme_key.as_str(), os_prefers_dark);
        let state = PageState::new(theme.theme(), items, profile.collapse_width);
        let notifier = UnloadNotifier::new(
            JobRegistry::new(session, profile.jobs_key.as_str()),
            beacon,
            DeleteEndpoint::new(profile.delete_endpoint.as_str()),
        );
        debug!(
            site = %profile.name,
            theme = %state.theme,
            items = state.items.len(),
            "page initialised"
        );

        Self {
            state,
            theme,
            notifier,
        }
    }

    pub fn with_search_panel(mut self, panel: SearchPanel) -> Self {
        self.state = self.state.with_search_panel(panel);
        self
    }

    pub fn with_queries(mut self, header: Option<String>, sidebar: Option<String>) -> Self {
        self.state = self.state.with_queries(header, sidebar);
        self
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn jobs(&self) -> &JobRegistry<S> {
        self.notifier.registry()
    }

    pub fn start(&self) -> Vec<Effect> {
        self.state.initial_effects()
    }

    /// Runs the reducer, executes service effects and returns the rest.
    pub fn dispatch(&mut self, event: UiEvent, viewport: &Viewport) -> Vec<Effect> {
        let effects = self.state.handle(event, viewport);
        let mut dom = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::PersistTheme(theme) => {
                    self.theme.set(theme);
                }
                Effect::TrackJob(id) => self.notifier.registry().add(&id),
                Effect::ForgetJob(id) => self.notifier.registry().remove(&id),
                Effect::FlushJobs => {
                    self.notifier.notify();
                }
                Effect::RearmCleanup => self.notifier.rearm(),
                other => dom.push(other),
            }
        }
        dom
    }
}
