//! Page integration: URL configuration and the DOM compass

use sunshine_core::compass::compass_transform;
use sunshine_core::{ViewerConfig, ViewerError};
use sunshine_scene::CompassSink;
use wasm_bindgen::{JsCast, JsValue};

/// Query parameters the viewer reads from the page URL
const QUERY_KEYS: [&str; 2] = ["model", "scale"];

fn js_error(err: JsValue) -> ViewerError {
    ViewerError::Dom(format!("{:?}", err))
}

/// Defaults overridden by `?model=` and `?scale=` on the page URL
pub fn config_from_page() -> Result<ViewerConfig, ViewerError> {
    let mut config = ViewerConfig::default();

    let window = web_sys::window().ok_or_else(|| ViewerError::Dom("no window".to_string()))?;
    let href = window.location().href().map_err(js_error)?;
    let url = web_sys::Url::new(&href).map_err(js_error)?;
    let params = url.search_params();

    let pairs = QUERY_KEYS
        .into_iter()
        .filter_map(|key| params.get(key).map(|value| (key, value)));
    config.apply_query_pairs(pairs)?;

    Ok(config)
}

/// Rotates the element matched by a CSS selector via its `transform` style.
///
/// The element is looked up on every update so the sink holds no JS objects.
pub struct DomCompass {
    selector: String,
}

impl DomCompass {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

impl CompassSink for DomCompass {
    fn apply(&mut self, degrees: f32) -> Result<(), ViewerError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| ViewerError::Dom("no document".to_string()))?;

        let element = document
            .query_selector(&self.selector)
            .map_err(js_error)?
            .ok_or_else(|| ViewerError::MissingElement(self.selector.clone()))?;
        let element: web_sys::HtmlElement = element
            .dyn_into()
            .map_err(|_| ViewerError::Dom(format!("{} is not an HTML element", self.selector)))?;

        element
            .style()
            .set_property("transform", &compass_transform(degrees))
            .map_err(js_error)
    }
}
