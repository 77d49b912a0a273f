//! Global functions page scripts call when they start or finish a job,
//! e.g. `window.neonpdfAddJob(id)`.

use anyhow::anyhow;
use tracing::debug;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

pub fn install<F>(
  name: &str,
  handler: F
) -> anyhow::Result<()>
where
  F: Fn(String) + 'static
{
  let window = web_sys::window()
    .ok_or_else(|| anyhow!("no window"))?;

  let closure =
    Closure::<dyn Fn(JsValue)>::new(
      move |value: JsValue| {
        match job_id_from_js(&value) {
          | Some(id) => handler(id),
          | None => {
            debug!(?value, "ignoring non-string job id");
          }
        }
      }
    );

  js_sys::Reflect::set(
    &window,
    &JsValue::from_str(name),
    closure.as_ref()
  )
  .map_err(|err| {
    anyhow!("failed to install window.{name}: {err:?}")
  })?;

  // The hook lives as long as the page.
  closure.forget();
  debug!(%name, "installed job hook");
  Ok(())
}

/// Ids arrive from page scripts; accept strings and numbers.
fn job_id_from_js(value: &JsValue) -> Option<String> {
  if let Some(text) = value.as_string() {
    return Some(text);
  }
  value
    .as_f64()
    .filter(|number| number.is_finite())
    .map(|number| format!("{number}"))
}
