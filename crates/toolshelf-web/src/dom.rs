//! Reads the server-rendered page and applies effects back onto it.

use toolshelf_core::grid::{
  CategoryFilter,
  SortMode,
  ToolItem,
  parse_index
};
use toolshelf_core::page::Effect;
use toolshelf_core::profile::SiteProfile;
use toolshelf_core::sidebar::SearchSource;
use toolshelf_core::theme::Theme;
use tracing::{
  debug,
  warn
};
use wasm_bindgen::JsCast;
use web_sys::{
  Document,
  Element,
  HtmlElement,
  HtmlInputElement
};

const DRAWER_OPEN_CLASS: &str = "is-open";
const BODY_DRAWER_CLASS: &str = "sidebar-open";

pub struct Dom {
  document:           Document,
  grid:               Option<Element>,
  items:              Vec<HtmlElement>,
  pub sidebar:        Option<Element>,
  pub header_search:  Option<HtmlInputElement>,
  pub sidebar_search: Option<HtmlInputElement>,
  pub theme_toggle:   Option<Element>,
  pub drawer_open:    Option<Element>,
  pub drawer_close:   Option<Element>,
  pub search_toggle:  Option<Element>,
  search_wrap:        Option<HtmlElement>,
  theme_label:        bool,
  active_class:       String,
  nav_links:          Option<String>
}

impl Dom {
  pub fn bind(
    document: Document,
    profile: &SiteProfile
  ) -> Self {
    let ids = &profile.elements;
    let grid = by_id(&document, Some(&ids.grid));
    let items = grid
      .as_ref()
      .map(|grid| {
        collect_items(grid, &ids.item_selector)
      })
      .unwrap_or_default();

    let dom = Self {
      grid,
      items,
      sidebar: by_id(&document, ids.sidebar.as_deref()),
      header_search: by_id(
        &document,
        ids.header_search.as_deref()
      )
      .and_then(|el| el.dyn_into().ok()),
      sidebar_search: by_id(
        &document,
        ids.sidebar_search.as_deref()
      )
      .and_then(|el| el.dyn_into().ok()),
      theme_toggle: by_id(
        &document,
        ids.theme_toggle.as_deref()
      ),
      drawer_open: by_id(
        &document,
        ids.drawer_open.as_deref()
      ),
      drawer_close: by_id(
        &document,
        ids.drawer_close.as_deref()
      ),
      search_toggle: by_id(
        &document,
        ids.search_toggle.as_deref()
      ),
      search_wrap: by_id(
        &document,
        ids.search_wrap.as_deref()
      )
      .and_then(|el| el.dyn_into().ok()),
      theme_label: profile.theme_button_label,
      active_class: profile.active_class.clone(),
      nav_links: ids.nav_link_selector.clone(),
      document
    };

    debug!(
      items = dom.items.len(),
      sidebar = dom.sidebar.is_some(),
      "bound page elements"
    );
    dom
  }

  pub fn tool_items(&self) -> Vec<ToolItem> {
    self.items.iter().map(read_item).collect()
  }

  pub fn has_items(&self) -> bool {
    !self.items.is_empty()
  }

  pub fn body(&self) -> Option<HtmlElement> {
    self.document.body()
  }

  pub fn has_search_wrap(&self) -> bool {
    self.search_wrap.is_some()
  }

  /// Initial visibility of the sidebar search wrapper.
  pub fn search_panel_visible(&self) -> bool {
    self
      .search_wrap
      .as_ref()
      .map(|wrap| !is_hidden(wrap))
      .unwrap_or(true)
  }

  pub fn search_value(
    &self,
    source: SearchSource
  ) -> String {
    self
      .search_input(source)
      .map(|input| input.value())
      .unwrap_or_default()
  }

  pub fn apply(&self, effect: &Effect) {
    match effect {
      | Effect::ApplyTheme(theme) => {
        self.apply_theme(*theme)
      }
      | Effect::Render {
        visible,
        order
      } => self.render(visible, order.as_deref()),
      | Effect::MarkCategory(filter) => {
        self.mark_category(filter)
      }
      | Effect::MarkSort(sort) => {
        self.mark_sort(*sort)
      }
      | Effect::SetDrawer(open) => {
        self.set_drawer(*open)
      }
      | Effect::SetSearchPanel(visible) => {
        self.set_search_panel(*visible)
      }
      | Effect::FocusSearch(source) => {
        if let Some(input) =
          self.search_input(*source)
        {
          let _ = input.focus();
        }
      }
      | other => {
        warn!(?other, "service effect reached the DOM");
      }
    }
  }

  fn search_input(
    &self,
    source: SearchSource
  ) -> Option<&HtmlInputElement> {
    match source {
      | SearchSource::Header => {
        self.header_search.as_ref()
      }
      | SearchSource::Sidebar => {
        self.sidebar_search.as_ref()
      }
    }
  }

  fn apply_theme(&self, theme: Theme) {
    if let Some(root) =
      self.document.document_element()
    {
      for (name, value) in theme.root_attributes()
      {
        let _ = root.set_attribute(name, value);
      }
    }

    if self.theme_label
      && let Some(button) = &self.theme_toggle
    {
      let _ = button.set_attribute(
        "aria-label",
        theme.storage_value()
      );
      button.set_text_content(Some(
        theme.toggle_label()
      ));
    }
  }

  fn render(
    &self,
    visible: &[bool],
    order: Option<&[usize]>
  ) {
    if let (Some(grid), Some(order)) =
      (&self.grid, order)
    {
      for &index in order {
        if let Some(item) = self.items.get(index) {
          let _ = grid.append_child(item);
        }
      }
    }

    for (item, shown) in
      self.items.iter().zip(visible)
    {
      let _ = item.style().set_property(
        "display",
        if *shown { "" } else { "none" }
      );
    }
  }

  fn mark_category(
    &self,
    filter: &CategoryFilter
  ) {
    if let Some(selector) = &self.nav_links {
      for link in self.sidebar_controls(selector) {
        let _ =
          link.class_list().remove_1(&self.active_class);
      }
    }

    for chip in self.sidebar_controls("[data-filter]")
    {
      let chip_filter = CategoryFilter::parse(
        chip.get_attribute("data-filter").as_deref()
      );
      let _ = chip.class_list().toggle_with_force(
        &self.active_class,
        &chip_filter == filter
      );
    }
  }

  fn mark_sort(&self, sort: SortMode) {
    let wanted = sort.attr_value();
    for chip in self.sidebar_controls("[data-sort]") {
      let value = chip.get_attribute("data-sort");
      let active = match wanted {
        | None => false,
        | Some(_) if value.as_deref() == Some("clear") => {
          continue;
        }
        | Some(wanted) => value.as_deref() == Some(wanted)
      };
      let _ = chip
        .class_list()
        .toggle_with_force(&self.active_class, active);
    }
  }

  fn set_drawer(&self, open: bool) {
    if let Some(sidebar) = &self.sidebar {
      let _ = sidebar
        .class_list()
        .toggle_with_force(DRAWER_OPEN_CLASS, open);
    }
    if let Some(body) = self.document.body() {
      let _ = body
        .class_list()
        .toggle_with_force(BODY_DRAWER_CLASS, open);
    }
  }

  fn set_search_panel(&self, visible: bool) {
    if let Some(wrap) = &self.search_wrap {
      let _ = wrap.style().set_property(
        "display",
        if visible { "" } else { "none" }
      );
    }
    if let Some(toggle) = &self.search_toggle {
      let _ = toggle.set_attribute(
        "aria-expanded",
        if visible { "true" } else { "false" }
      );
    }
  }

  fn sidebar_controls(
    &self,
    selector: &str
  ) -> Vec<Element> {
    self
      .sidebar
      .as_ref()
      .map(|sidebar| query_all(sidebar, selector))
      .unwrap_or_default()
  }
}

fn by_id(
  document: &Document,
  id: Option<&str>
) -> Option<Element> {
  let id = id?;
  let found = document.get_element_by_id(id);
  if found.is_none() {
    debug!(%id, "element not on this page");
  }
  found
}

fn query_all(
  root: &Element,
  selector: &str
) -> Vec<Element> {
  let Ok(list) = root.query_selector_all(selector)
  else {
    warn!(%selector, "invalid selector");
    return Vec::new();
  };
  (0..list.length())
    .filter_map(|i| list.get(i))
    .filter_map(|node| node.dyn_into::<Element>().ok())
    .collect()
}

fn collect_items(
  grid: &Element,
  selector: &str
) -> Vec<HtmlElement> {
  query_all(grid, selector)
    .into_iter()
    .filter_map(|el| el.dyn_into::<HtmlElement>().ok())
    .collect()
}

fn read_item(el: &HtmlElement) -> ToolItem {
  let attr = |name: &str| {
    el.get_attribute(name).unwrap_or_default()
  };
  ToolItem {
    category: attr("data-category"),
    title:    attr("data-title"),
    desc:     attr("data-desc"),
    index:    parse_index(
      el.get_attribute("data-index").as_deref()
    )
  }
}

fn is_hidden(el: &HtmlElement) -> bool {
  el.style()
    .get_property_value("display")
    .map(|value| value.trim() == "none")
    .unwrap_or(false)
}
