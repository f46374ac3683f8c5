#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Feedback-trail video viewer.
//!
//! The render core (buffers, passes, geometry, loop) is target independent
//! and runs on the host through [`software::SoftwareBackend`]. The browser
//! side (WebGL2, camera/file sources, DOM controls) is only compiled for
//! wasm32.

pub mod accum;
pub mod blend;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod playback;
pub mod render_loop;
pub mod shaders;
pub mod software;
pub mod source;

pub use error::{Error, Result};

#[cfg(all(test, target_arch = "wasm32"))]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    use crate::config::{ViewerConfig, CONFIG_ELEMENT_ID};

    mod controls;
    mod gl;
    mod render;
    mod video;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let (config, config_err) = match document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content())
        {
            Some(text) => match ViewerConfig::from_json(&text) {
                Ok(cfg) => (cfg, None),
                Err(e) => (ViewerConfig::default(), Some(e)),
            },
            None => (ViewerConfig::default(), None),
        };

        console_log::init_with_level(config.level()).ok();
        if let Some(e) = config_err {
            log::warn!("ignoring inline config: {e}");
        }
        log::info!("trail viewer starting");

        let canvas = document
            .get_element_by_id(&config.canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        render::start(canvas, config).map_err(|e| {
            log::error!("start-up failed: {e}");
            JsValue::from(e)
        })
    }
}

// When compiling for non-wasm targets (e.g., `cargo test` on host),
// provide an empty stub so the crate still builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn main() {}
