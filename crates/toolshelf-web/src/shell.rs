use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{
  Context,
  anyhow
};
use gloo::events::{
  EventListener,
  EventListenerOptions
};
use toolshelf_core::jobs::JobId;
use toolshelf_core::page::{
  Page,
  UiEvent
};
use toolshelf_core::profile::{
  Profiles,
  SiteProfile
};
use toolshelf_core::sidebar::{
  SearchPanel,
  SearchSource
};
use tracing::{
  info,
  warn
};
use wasm_bindgen::JsCast;
use web_sys::{
  Element,
  Event,
  MediaQueryListEvent,
  Node,
  PageTransitionEvent
};

use crate::browser::{
  self,
  BrowserStorage,
  NavigatorBeacon
};
use crate::dom::Dom;
use crate::hooks;

type BrowserPage =
  Page<BrowserStorage, BrowserStorage, NavigatorBeacon>;

struct Shell {
  page: BrowserPage,
  dom:  Dom
}

impl Shell {
  fn dispatch(&mut self, event: UiEvent) {
    let effects = self
      .page
      .dispatch(event, &browser::viewport());
    for effect in &effects {
      self.dom.apply(effect);
    }
  }
}

#[derive(Clone)]
struct Handle(Rc<RefCell<Shell>>);

impl Handle {
  fn dispatch(&self, event: UiEvent) {
    match self.0.try_borrow_mut() {
      | Ok(mut shell) => shell.dispatch(event),
      | Err(_) => {
        warn!(?event, "dropped re-entrant ui event");
      }
    }
  }

  fn with_dom<R>(&self, f: impl FnOnce(&Dom) -> R) -> R {
    f(&self.0.borrow().dom)
  }
}

pub fn boot() -> anyhow::Result<()> {
  let window =
    web_sys::window().ok_or_else(|| anyhow!("no window"))?;
  let document = window
    .document()
    .ok_or_else(|| anyhow!("no document"))?;

  let profiles = Profiles::builtin()?;
  let site = document
    .document_element()
    .and_then(|root| root.get_attribute("data-site"));
  let profile = profiles.select(site.as_deref()).clone();
  info!(site = %profile.name, "binding page");

  let dom = Dom::bind(document, &profile);
  let page = Page::new(
    &profile,
    BrowserStorage::local(),
    BrowserStorage::session(),
    NavigatorBeacon,
    browser::prefers_dark(),
    dom.tool_items()
  )
  .with_search_panel(SearchPanel::new(
    dom.search_panel_visible()
  ))
  .with_queries(
    Some(dom.search_value(SearchSource::Header)),
    Some(dom.search_value(SearchSource::Sidebar))
  );

  for effect in &page.start() {
    dom.apply(effect);
  }

  let handle = Handle(Rc::new(RefCell::new(Shell { page, dom })));
  let mut listeners = Vec::new();

  wire_theme(&handle, &window, &mut listeners);
  wire_search(&handle, &mut listeners);
  wire_sidebar(&handle, &mut listeners);
  wire_jobs(&handle, &profile, &window, &mut listeners)
    .context("failed wiring job lifecycle")?;

  info!(listeners = listeners.len(), "page glue ready");
  for listener in listeners {
    listener.forget();
  }
  Ok(())
}

fn wire_theme(
  handle: &Handle,
  window: &web_sys::Window,
  listeners: &mut Vec<EventListener>
) {
  if let Some(button) =
    handle.with_dom(|dom| dom.theme_toggle.clone())
  {
    let handle = handle.clone();
    listeners.push(EventListener::new(
      &button,
      "click",
      move |_| handle.dispatch(UiEvent::ThemeToggled)
    ));
  }

  // Stylesheets loaded after the script may reset the root attributes.
  {
    let handle = handle.clone();
    listeners.push(EventListener::once(
      window,
      "load",
      move |_| {
        let shell = handle.0.borrow();
        let theme = shell.page.state().theme;
        shell
          .dom
          .apply(&toolshelf_core::Effect::ApplyTheme(theme));
      }
    ));
  }

  if let Some(query) = browser::prefers_dark_query() {
    let handle = handle.clone();
    listeners.push(EventListener::new(
      &query,
      "change",
      move |event: &Event| {
        let Some(event) =
          event.dyn_ref::<MediaQueryListEvent>()
        else {
          return;
        };
        handle.dispatch(UiEvent::SystemThemeChanged {
          dark: event.matches()
        });
      }
    ));
  }
}

fn wire_search(
  handle: &Handle,
  listeners: &mut Vec<EventListener>
) {
  if !handle.with_dom(Dom::has_items) {
    return;
  }

  for source in [SearchSource::Header, SearchSource::Sidebar] {
    let input = handle.with_dom(|dom| match source {
      | SearchSource::Header => dom.header_search.clone(),
      | SearchSource::Sidebar => dom.sidebar_search.clone()
    });
    let Some(input) = input else {
      continue;
    };

    let handle = handle.clone();
    listeners.push(EventListener::new(
      &input,
      "input",
      move |_| {
        let value =
          handle.with_dom(|dom| dom.search_value(source));
        handle.dispatch(UiEvent::SearchInput {
          source,
          value
        });
      }
    ));
  }
}

fn wire_sidebar(
  handle: &Handle,
  listeners: &mut Vec<EventListener>
) {
  let (sidebar, opener, closer, search_toggle, body) =
    handle.with_dom(|dom| {
      (
        dom.sidebar.clone(),
        dom.drawer_open.clone(),
        dom.drawer_close.clone(),
        dom
          .search_toggle
          .clone()
          .filter(|_| dom.has_search_wrap()),
        dom.body()
      )
    });

  if let Some(sidebar) = sidebar.clone()
    && handle.with_dom(Dom::has_items)
  {
    let handle = handle.clone();
    // Delegated so anchors and chips share one listener; default is
    // suppressed so `<a data-filter>` links do not navigate.
    listeners.push(EventListener::new_with_options(
      &sidebar,
      "click",
      EventListenerOptions::enable_prevent_default(),
      move |event: &Event| {
        let Some(target) = event_element(event) else {
          return;
        };
        if let Ok(Some(chip)) = target.closest("[data-filter]") {
          event.prevent_default();
          handle.dispatch(UiEvent::CategoryChosen {
            filter: chip.get_attribute("data-filter")
          });
        } else if let Ok(Some(chip)) =
          target.closest("[data-sort]")
        {
          handle.dispatch(UiEvent::SortChosen {
            sort: chip.get_attribute("data-sort")
          });
        }
      }
    ));
  }

  if let Some(opener) = opener.clone() {
    let handle = handle.clone();
    listeners.push(EventListener::new(
      &opener,
      "click",
      move |_| handle.dispatch(UiEvent::DrawerOpenRequested)
    ));
  }

  if let Some(closer) = closer {
    let handle = handle.clone();
    listeners.push(EventListener::new(
      &closer,
      "click",
      move |_| handle.dispatch(UiEvent::DrawerCloseRequested)
    ));
  }

  if let (Some(body), Some(sidebar)) = (body, sidebar) {
    let handle = handle.clone();
    listeners.push(EventListener::new(
      &body,
      "click",
      move |event: &Event| {
        let target = event
          .target()
          .and_then(|target| target.dyn_into::<Node>().ok());
        let inside = |container: Option<&Element>| {
          container.is_some_and(|container| {
            container.contains(target.as_ref())
          })
        };
        handle.dispatch(UiEvent::BodyClicked {
          inside_sidebar: inside(Some(&sidebar)),
          inside_opener:  inside(opener.as_ref())
        });
      }
    ));
  }

  if let Some(toggle) = search_toggle {
    let handle = handle.clone();
    listeners.push(EventListener::new(
      &toggle,
      "click",
      move |_| handle.dispatch(UiEvent::SearchPanelToggled)
    ));
  }
}

fn wire_jobs(
  handle: &Handle,
  profile: &SiteProfile,
  window: &web_sys::Window,
  listeners: &mut Vec<EventListener>
) -> anyhow::Result<()> {
  if let Some(name) = &profile.add_job_hook {
    let handle = handle.clone();
    hooks::install(name, move |id| {
      handle.dispatch(UiEvent::JobStarted {
        id: JobId::from(id)
      });
    })?;
  }

  if let Some(name) = &profile.remove_job_hook {
    let handle = handle.clone();
    hooks::install(name, move |id| {
      handle.dispatch(UiEvent::JobFinished {
        id: JobId::from(id)
      });
    })?;
  }

  // `pagehide` covers mobile browsers that skip `beforeunload`; the
  // notifier ignores the second trigger.
  for event in ["beforeunload", "pagehide"] {
    let handle = handle.clone();
    listeners.push(EventListener::new(
      window,
      event,
      move |_| handle.dispatch(UiEvent::Unloading)
    ));
  }

  // A page served from the back/forward cache keeps this state, so the
  // next teardown has to flush again.
  {
    let handle = handle.clone();
    listeners.push(EventListener::new(
      window,
      "pageshow",
      move |event: &Event| {
        let restored = event
          .dyn_ref::<PageTransitionEvent>()
          .is_some_and(PageTransitionEvent::persisted);
        if restored {
          handle.dispatch(UiEvent::Restored);
        }
      }
    ));
  }

  Ok(())
}

fn event_element(event: &Event) -> Option<Element> {
  event.target()?.dyn_into::<Element>().ok()
}
