//! Overlay UI: buttons and sliders that turn into `Command`s, plus the
//! per-frame sync of playback widgets from the loop `Status`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement, Node};

use crate::blend::BlendParameters;
use crate::config::ViewerConfig;
use crate::render_loop::{Command, LoopState, Status};
use crate::error::describe_js;
use crate::source::{CameraSwitch, SourceKind, Ticket, Toggle};
use crate::{Error, Result};

use super::video::{request_camera, stop_stream, VideoSource};

pub type CommandQueue = Rc<RefCell<VecDeque<Command<VideoSource>>>>;

const PLAY_ICON: &str = r#"<polygon points="5 3 19 12 5 21 5 3"/>"#;
const PAUSE_ICON: &str =
    r#"<rect x="6" y="4" width="4" height="16"/><rect x="14" y="4" width="4" height="16"/>"#;

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| Error::Dom(format!("missing #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| Error::Dom(format!("#{id} has an unexpected element type")))
}

fn listen<T, F>(target: &T, event: &str, handler: F) -> Result<()>
where
    T: AsRef<EventTarget>,
    F: FnMut(Event) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target
        .as_ref()
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn set_style(el: &HtmlElement, property: &str, value: &str) {
    el.style().set_property(property, value).ok();
}

fn is_shown(el: &HtmlElement) -> bool {
    el.style().get_property_value("display").ok().as_deref() != Some("none")
}

fn slider_value(input: &HtmlInputElement, fallback: f32) -> f32 {
    input.value().parse().unwrap_or(fallback)
}

/// Call a promise-returning fullscreen method on `target` and wait for it.
/// A rejected promise is how browsers report a denied transition.
async fn fullscreen_call(target: &JsValue, method: &str) -> Result<()> {
    let failed = |e: JsValue| Error::Fullscreen(describe_js(&e));
    let function: Function = Reflect::get(target, &method.into())
        .map_err(failed)?
        .dyn_into()
        .map_err(|_| Error::Fullscreen(format!("{method} is not supported")))?;
    let returned = function.call0(target).map_err(failed)?;
    // Older engines return undefined instead of a promise.
    if let Ok(promise) = returned.dyn_into::<Promise>() {
        JsFuture::from(promise).await.map_err(failed)?;
    }
    Ok(())
}

#[derive(Clone)]
struct Slider {
    input: HtmlInputElement,
    label: HtmlElement,
}

impl Slider {
    fn new(document: &Document, id: &str, initial: f32) -> Result<Self> {
        let slider = Slider {
            input: element(document, id)?,
            label: element(document, &format!("{id}-value"))?,
        };
        slider.input.set_value(&initial.to_string());
        slider.show_value();
        Ok(slider)
    }

    fn show_value(&self) {
        let v = slider_value(&self.input, 0.0);
        self.label.set_text_content(Some(&format!("{v:.2}")));
    }
}

pub struct Controls {
    document: Document,
    queue: CommandQueue,
    camera: RefCell<CameraSwitch>,
    status: Cell<Option<Status>>,
    menu_visible: Cell<bool>,
    defaults: BlendParameters,
    camera_facing: String,

    decay: Slider,
    contrast: Slider,
    brightness: Slider,

    menu: HtmlElement,
    instructions: HtmlElement,
    camera_btn: HtmlElement,
    file_input: HtmlInputElement,
    play_icon: Element,
    video_controls: HtmlElement,
    video_time: HtmlInputElement,
    time_label: HtmlElement,
    status_line: HtmlElement,
}

impl Controls {
    pub fn bind(document: &Document, queue: CommandQueue, config: &ViewerConfig) -> Result<Rc<Self>> {
        let defaults = config.blend;
        let controls = Rc::new(Controls {
            document: document.clone(),
            queue,
            camera: RefCell::new(CameraSwitch::new()),
            status: Cell::new(None),
            menu_visible: Cell::new(true),
            defaults,
            camera_facing: config.camera_facing.clone(),
            decay: Slider::new(document, "decay", defaults.decay)?,
            contrast: Slider::new(document, "contrast", defaults.contrast)?,
            brightness: Slider::new(document, "brightness", defaults.brightness)?,
            menu: element(document, "menu")?,
            instructions: element(document, "instructions")?,
            camera_btn: element(document, "camera-btn")?,
            file_input: element(document, "file-input")?,
            play_icon: element(document, "play-pause-icon")?,
            video_controls: element(document, "video-controls")?,
            video_time: element(document, "video-time")?,
            time_label: element(document, "time-label")?,
            status_line: element(document, "status")?,
        });
        set_style(&controls.video_controls, "display", "none");
        controls.wire()?;
        Ok(controls)
    }

    /// Live slider values.
    pub fn params(&self) -> BlendParameters {
        BlendParameters {
            decay: slider_value(&self.decay.input, self.defaults.decay).clamp(0.0, 1.0),
            contrast: slider_value(&self.contrast.input, self.defaults.contrast),
            brightness: slider_value(&self.brightness.input, self.defaults.brightness),
        }
    }

    /// Reflect the loop status in the overlay; DOM is touched only on change.
    pub fn sync(&self, status: Status) {
        let previous = self.status.replace(Some(status));
        if previous == Some(status) {
            return;
        }

        let was_active = previous.is_some_and(|p| p.state == LoopState::Accumulating);
        match (was_active, status.state) {
            (false, LoopState::Accumulating) => {
                set_style(&self.instructions, "display", "none");
                self.status_line.set_text_content(None);
            }
            (true, LoopState::Idle) => {
                set_style(&self.instructions, "display", "flex");
                self.set_menu_visible(true);
            }
            _ => {}
        }

        let camera = status.kind == SourceKind::Camera;
        set_style(&self.camera_btn, "opacity", if camera { "0.5" } else { "1" });

        self.play_icon
            .set_inner_html(if status.playing { PAUSE_ICON } else { PLAY_ICON });

        match status.playback {
            Some(playback) if status.kind == SourceKind::File => {
                set_style(&self.video_controls, "display", "flex");
                self.video_time.set_value(&playback.percent().to_string());
                self.time_label.set_text_content(Some(&playback.label()));
            }
            _ => set_style(&self.video_controls, "display", "none"),
        }
    }

    /// Show a recoverable failure to the user.
    pub fn report(&self, err: &Error) {
        log::warn!("{err}");
        self.status_line.set_text_content(Some(&err.to_string()));
    }

    fn push(&self, command: Command<VideoSource>) {
        self.queue.borrow_mut().push_back(command);
    }

    fn is_active(&self) -> bool {
        self.status
            .get()
            .is_some_and(|s| s.state == LoopState::Accumulating)
    }

    fn set_menu_visible(&self, visible: bool) {
        self.menu_visible.set(visible);
        set_style(&self.menu, "opacity", if visible { "1" } else { "0" });
        set_style(&self.menu, "pointer-events", if visible { "auto" } else { "none" });
    }

    fn toggle_camera(&self) {
        let toggle = self.camera.borrow_mut().toggle();
        match toggle {
            Toggle::Off => self.push(Command::Deactivate),
            Toggle::On(ticket) => {
                set_style(&self.instructions, "display", "none");
                // The loop hands the ticket back once the old source is gone.
                self.push(Command::Acquire(ticket));
            }
        }
    }

    /// Ask for the camera; called after the previous source was torn down.
    pub fn start_camera(self: &Rc<Self>, ticket: Ticket) {
        if !self.camera.borrow().is_current(ticket) {
            log::debug!("camera request withdrawn before it started");
            return;
        }
        let controls = Rc::clone(self);
        spawn_local(async move {
            let result = request_camera(&controls.camera_facing).await;
            let current = controls.camera.borrow_mut().complete(ticket);
            match result {
                Ok(stream) if current => match VideoSource::camera(&controls.document, stream) {
                    Ok(source) => controls.push(Command::Activate(source)),
                    Err(e) => controls.camera_failed(&e),
                },
                Ok(stream) => {
                    log::debug!("discarding superseded camera stream");
                    stop_stream(&stream);
                }
                Err(e) if current => controls.camera_failed(&e),
                Err(e) => log::debug!("superseded camera request failed: {e}"),
            }
        });
    }

    fn camera_failed(&self, err: &Error) {
        self.camera.borrow_mut().abandon();
        self.report(err);
        set_style(&self.instructions, "display", "flex");
    }

    fn open_selected_file(&self) {
        let file = self.file_input.files().and_then(|files| files.get(0));
        let Some(file) = file else {
            self.report(&Error::SourceAcquisition("no file selected".into()));
            return;
        };
        // A pending camera request must not win over an explicit file choice.
        self.camera.borrow_mut().abandon();
        match VideoSource::file(&self.document, &file) {
            Ok(source) => self.push(Command::Activate(source)),
            Err(e) => self.report(&e),
        }
        self.file_input.set_value("");
    }

    fn toggle_fullscreen(&self) {
        let (target, method): (JsValue, _) = if self.document.fullscreen_element().is_some() {
            (self.document.clone().into(), "exitFullscreen")
        } else {
            match self.document.document_element() {
                Some(root) => (root.into(), "requestFullscreen"),
                None => {
                    log::warn!("{}", Error::Fullscreen("no document element".into()));
                    return;
                }
            }
        };
        spawn_local(async move {
            if let Err(e) = fullscreen_call(&target, method).await {
                log::warn!("{e}");
            }
        });
    }

    fn on_document_click(&self, event: &Event) {
        let target = event.target().and_then(|t| t.dyn_into::<Node>().ok());
        if self.menu.contains(target.as_ref()) {
            return;
        }
        if is_shown(&self.instructions) && !self.instructions.contains(target.as_ref()) {
            set_style(&self.instructions, "display", "none");
        }
        // Keep the tools reachable while nothing is loaded.
        if !self.is_active() {
            return;
        }
        self.set_menu_visible(!self.menu_visible.get());
    }

    fn wire(self: &Rc<Self>) -> Result<()> {
        let doc = &self.document;

        let c = Rc::clone(self);
        listen(doc, "click", move |e| c.on_document_click(&e))?;

        let c = Rc::clone(self);
        listen(&self.camera_btn, "click", move |e| {
            e.stop_propagation();
            c.toggle_camera();
        })?;

        let c = Rc::clone(self);
        let btn: HtmlElement = element(doc, "upload-btn")?;
        listen(&btn, "click", move |e| {
            e.stop_propagation();
            c.file_input.click();
        })?;

        let c = Rc::clone(self);
        listen(&self.file_input, "change", move |_| c.open_selected_file())?;

        let c = Rc::clone(self);
        let btn: HtmlElement = element(doc, "play-pause-btn")?;
        listen(&btn, "click", move |e| {
            e.stop_propagation();
            c.push(Command::TogglePlayback);
        })?;

        let c = Rc::clone(self);
        let btn: HtmlElement = element(doc, "rotate-btn")?;
        listen(&btn, "click", move |e| {
            e.stop_propagation();
            c.push(Command::Rotate);
        })?;

        let c = Rc::clone(self);
        let btn: HtmlElement = element(doc, "fullscreen-btn")?;
        listen(&btn, "click", move |e| {
            e.stop_propagation();
            c.toggle_fullscreen();
        })?;

        let c = Rc::clone(self);
        let btn: HtmlElement = element(doc, "instructions-btn")?;
        listen(&btn, "click", move |e| {
            e.stop_propagation();
            let next = if is_shown(&c.instructions) { "none" } else { "flex" };
            set_style(&c.instructions, "display", next);
        })?;

        let c = Rc::clone(self);
        listen(&self.video_time, "input", move |e| {
            e.stop_propagation();
            let percent: f64 = c.video_time.value().parse().unwrap_or(0.0);
            c.push(Command::Seek {
                fraction: percent / 100.0,
            });
        })?;

        for slider in [&self.decay, &self.contrast, &self.brightness] {
            let slider = slider.clone();
            let input = slider.input.clone();
            listen(&input, "input", move |e| {
                e.stop_propagation();
                slider.show_value();
            })?;
        }

        let page1: HtmlElement = element(doc, "sliders-page-1")?;
        let page2: HtmlElement = element(doc, "sliders-page-2")?;
        for (button, show, hide) in [
            ("next-sliders-btn", page2.clone(), page1.clone()),
            ("prev-sliders-btn", page1, page2),
        ] {
            let btn: HtmlElement = element(doc, button)?;
            listen(&btn, "click", move |e| {
                e.stop_propagation();
                set_style(&hide, "display", "none");
                set_style(&show, "display", "flex");
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use js_sys::Object;
    use wasm_bindgen_test::*;

    fn with_method(name: &str, body: &str) -> JsValue {
        let target = Object::new();
        Reflect::set(&target, &name.into(), &Function::new_no_args(body)).unwrap();
        target.into()
    }

    #[wasm_bindgen_test]
    async fn rejected_fullscreen_promise_is_an_error() {
        let target = with_method(
            "requestFullscreen",
            "return Promise.reject(new Error('denied'));",
        );
        match fullscreen_call(&target, "requestFullscreen").await {
            Err(Error::Fullscreen(msg)) => assert_eq!(msg, "denied"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[wasm_bindgen_test]
    async fn resolved_fullscreen_promise_succeeds() {
        let target = with_method("exitFullscreen", "return Promise.resolve();");
        assert!(fullscreen_call(&target, "exitFullscreen").await.is_ok());
    }

    #[wasm_bindgen_test]
    async fn missing_fullscreen_api_is_an_error() {
        let target: JsValue = Object::new().into();
        let result = fullscreen_call(&target, "requestFullscreen").await;
        assert!(matches!(result, Err(Error::Fullscreen(_))));
    }
}
