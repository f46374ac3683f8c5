use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{window, HtmlCanvasElement, WebGl2RenderingContext as GL, Window};

use crate::config::ViewerConfig;
use crate::render_loop::{Command, RenderLoop};
use crate::{Error, Result};

use super::controls::{CommandQueue, Controls};
use super::gl::GlBackend;
use super::video::VideoSource;

type Viewer = RenderLoop<GlBackend, VideoSource>;

fn window_size(window: &Window) -> Result<(u32, u32)> {
    let w = window.inner_width()?.as_f64().unwrap_or(0.0);
    let h = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok((w as u32, h as u32))
}

/// Wire the canvas, controls and sources together and start the rAF loop.
pub fn start(canvas: HtmlCanvasElement, config: ViewerConfig) -> Result<()> {
    let window = window().ok_or_else(|| Error::Dom("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| Error::Dom("no document".into()))?;

    let (w, h) = window_size(&window)?;
    canvas.set_width(w);
    canvas.set_height(h);

    let gl: GL = canvas
        .get_context("webgl2")?
        .ok_or_else(|| Error::Gpu("WebGL2 not supported".into()))?
        .dyn_into()
        .map_err(|_| Error::Gpu("context is not WebGL2".into()))?;

    let mut viewer: Viewer =
        RenderLoop::new(GlBackend::new(gl)?, (w, h), config.metadata_retry_ms)?;
    let queue: CommandQueue = Rc::new(RefCell::new(VecDeque::new()));
    let controls = Controls::bind(&document, queue.clone(), &config)?;

    // Resize canvas to fit window; the loop resizes its buffers on the next tick.
    let resize_closure = {
        let canvas = canvas.clone();
        let queue = queue.clone();
        let window = window.clone();
        Closure::wrap(Box::new(move || match window_size(&window) {
            Ok((width, height)) => {
                canvas.set_width(width);
                canvas.set_height(height);
                queue
                    .borrow_mut()
                    .push_back(Command::Resize { width, height });
            }
            Err(e) => log::warn!("resize ignored: {e}"),
        }) as Box<dyn FnMut()>)
    };
    window.add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())?;
    resize_closure.forget();

    // `f` lets the frame closure reschedule itself.
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let raf_window = window.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        // Drain first so callbacks never observe a half-applied command.
        let pending: Vec<_> = queue.borrow_mut().drain(..).collect();
        for command in pending {
            if let Err(e) = viewer.dispatch(command) {
                controls.report(&e);
            }
        }
        if let Some(ticket) = viewer.take_acquisition() {
            controls.start_camera(ticket);
        }

        if let Err(e) = viewer.tick(now, &controls.params()) {
            log::error!("frame {} failed: {e}", viewer.frames());
        }
        controls.sync(viewer.status());

        // schedule next
        if let Some(cb) = f.borrow().as_ref() {
            if let Err(e) = raf_window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                log::error!("render loop stopped: {}", crate::error::describe_js(&e));
            }
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(cb) = g.borrow().as_ref() {
        window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    }

    log::info!("render loop running at {w}x{h}");
    Ok(())
}
