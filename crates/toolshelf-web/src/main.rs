mod browser;
mod dom;
mod hooks;
mod shell;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!("starting toolshelf page glue");

  if let Err(error) = shell::boot() {
    tracing::error!(
      error = %format!("{error:#}"),
      "page glue disabled"
    );
  }
}
