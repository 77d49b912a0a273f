//! `web-sys` backed implementations of the core storage and beacon seams.

use anyhow::anyhow;
use toolshelf_core::store::KeyValueStore;
use toolshelf_core::unload::Beacon;
use toolshelf_core::sidebar::Viewport;
use wasm_bindgen::JsValue;

const PREFERS_DARK_QUERY: &str =
  "(prefers-color-scheme: dark)";

fn js_error(
  context: &str,
  value: JsValue
) -> anyhow::Error {
  anyhow!("{context}: {value:?}")
}

/// `localStorage` / `sessionStorage`. Browsers may refuse access
/// (privacy mode, sandboxed frames); every call then errors.
pub struct BrowserStorage {
  kind:  &'static str,
  inner: Option<web_sys::Storage>
}

impl BrowserStorage {
  pub fn local() -> Self {
    let inner = web_sys::window().and_then(
      |window| {
        window
          .local_storage()
          .ok()
          .flatten()
      }
    );
    Self {
      kind: "localStorage",
      inner
    }
  }

  pub fn session() -> Self {
    let inner = web_sys::window().and_then(
      |window| {
        window
          .session_storage()
          .ok()
          .flatten()
      }
    );
    Self {
      kind: "sessionStorage",
      inner
    }
  }

  fn storage(
    &self
  ) -> anyhow::Result<&web_sys::Storage> {
    self.inner.as_ref().ok_or_else(|| {
      anyhow!("{} is unavailable", self.kind)
    })
  }
}

impl KeyValueStore for BrowserStorage {
  fn get(
    &self,
    key: &str
  ) -> anyhow::Result<Option<String>> {
    self
      .storage()?
      .get_item(key)
      .map_err(|err| js_error(self.kind, err))
  }

  fn set(
    &self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    self
      .storage()?
      .set_item(key, value)
      .map_err(|err| js_error(self.kind, err))
  }

  fn remove(
    &self,
    key: &str
  ) -> anyhow::Result<()> {
    self
      .storage()?
      .remove_item(key)
      .map_err(|err| js_error(self.kind, err))
  }
}

/// `navigator.sendBeacon` with an empty `text/plain` body.
pub struct NavigatorBeacon;

impl Beacon for NavigatorBeacon {
  fn send(
    &self,
    path: &str
  ) -> anyhow::Result<bool> {
    let window = web_sys::window()
      .ok_or_else(|| anyhow!("no window"))?;

    let options = web_sys::BlobPropertyBag::new();
    options.set_type("text/plain");
    let body =
      web_sys::Blob::new_with_str_sequence_and_options(
        &js_sys::Array::new(),
        &options
      )
      .map_err(|err| js_error("blob", err))?;

    window
      .navigator()
      .send_beacon_with_opt_blob(path, Some(&body))
      .map_err(|err| js_error("sendBeacon", err))
  }
}

pub fn prefers_dark_query()
-> Option<web_sys::MediaQueryList> {
  web_sys::window()?
    .match_media(PREFERS_DARK_QUERY)
    .ok()
    .flatten()
}

pub fn prefers_dark() -> bool {
  prefers_dark_query()
    .map(|query| query.matches())
    .unwrap_or(false)
}

pub fn viewport() -> Viewport {
  web_sys::window()
    .and_then(|window| window.inner_width().ok())
    .and_then(|width| width.as_f64())
    .map(|width| Viewport::new(width.max(0.0) as u32))
    .unwrap_or_default()
}
