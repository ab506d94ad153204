//! Sunshine Viewer - solar building viewer entry points
//!
//! In the browser the viewer starts on module load, reads `?model=` and
//! `?scale=` from the page URL and drives the `.compass>div` element. The
//! page can end the render loop with `stop_viewer()`.

mod app;
#[cfg(target_arch = "wasm32")]
mod browser;

pub use app::run;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::sync::OnceLock;
    use sunshine_core::{LoopHandle, ViewerConfig};
    use sunshine_scene::CompassIndicator;
    use wasm_bindgen::prelude::*;

    use crate::browser::{config_from_page, DomCompass};

    static LOOP: OnceLock<LoopHandle> = OnceLock::new();

    /// WASM entry point
    #[wasm_bindgen(start)]
    pub fn main() {
        // Set up panic hook for better error messages
        console_error_panic_hook::set_once();

        tracing_wasm::set_as_global_default_with_config(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(tracing::Level::INFO)
                .build(),
        );

        let config = match config_from_page() {
            Ok(config) => config,
            Err(err) => {
                tracing::error!("Ignoring page parameters: {}", err);
                ViewerConfig::default()
            }
        };
        let compass = CompassIndicator::new(DomCompass::new(config.compass.selector.clone()));
        let handle = LOOP.get_or_init(LoopHandle::new).clone();

        crate::app::run(config, handle, Some(compass));
    }

    /// Stop the render loop and release the scene. Returns `false` if it
    /// was not running.
    #[wasm_bindgen]
    pub fn stop_viewer() -> bool {
        LOOP.get().map(LoopHandle::stop).unwrap_or(false)
    }
}
