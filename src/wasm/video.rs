//! Camera and file sources, each decoding into its own detached `<video>`.

use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, File, HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack, Url,
};

use crate::error::describe_js;
use crate::playback::Playback;
use crate::source::{FrameSource, SourceKind};
use crate::{Error, Result};

const HAVE_CURRENT_DATA: u16 = 2;

fn create_video_element(document: &Document) -> Result<HtmlVideoElement> {
    let video: HtmlVideoElement = document
        .create_element("video")?
        .dyn_into()
        .map_err(|_| Error::Dom("created element is not a <video>".into()))?;
    video.set_muted(false);
    video.set_loop(false);
    video.set_attribute("playsinline", "")?;
    Ok(video)
}

/// Ask the browser for a camera stream.
///
/// Fails with `SourceAcquisition` when permission is denied or no device
/// matches.
pub async fn request_camera(facing: &str) -> Result<MediaStream> {
    let acquisition = |e: JsValue| Error::SourceAcquisition(describe_js(&e));

    let devices = web_sys::window()
        .ok_or_else(|| Error::Dom("no window".into()))?
        .navigator()
        .media_devices()
        .map_err(acquisition)?;

    let facing_mode = Object::new();
    Reflect::set(&facing_mode, &"ideal".into(), &facing.into())?;
    let video = Object::new();
    Reflect::set(&video, &"facingMode".into(), &facing_mode)?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&video);

    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(acquisition)?;
    let stream = JsFuture::from(promise).await.map_err(acquisition)?;
    Ok(stream.dyn_into()?)
}

/// Stop every track so the camera light goes off.
pub fn stop_stream(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

fn start_playback(video: &HtmlVideoElement) -> Result<()> {
    let promise = video.play()?;
    spawn_local(async move {
        if let Err(e) = JsFuture::from(promise).await {
            log::warn!("playback did not start: {}", describe_js(&e));
        }
    });
    Ok(())
}

pub struct VideoSource {
    video: HtmlVideoElement,
    kind: SourceKind,
    stream: Option<MediaStream>,
    object_url: Option<String>,
}

impl VideoSource {
    /// Attach an acquired camera stream and start it.
    pub fn camera(document: &Document, stream: MediaStream) -> Result<Self> {
        let video = create_video_element(document).inspect_err(|_| stop_stream(&stream))?;
        video.set_src_object(Some(&stream));
        let source = VideoSource {
            video,
            kind: SourceKind::Camera,
            stream: Some(stream),
            object_url: None,
        };
        start_playback(&source.video)?;
        Ok(source)
    }

    /// Play a user-selected file through a temporary object URL.
    pub fn file(document: &Document, file: &File) -> Result<Self> {
        let video = create_video_element(document)?;
        let url = Url::create_object_url_with_blob(file)
            .map_err(|e| Error::SourceAcquisition(describe_js(&e)))?;
        video.set_src(&url);
        let source = VideoSource {
            video,
            kind: SourceKind::File,
            stream: None,
            object_url: Some(url),
        };
        log::info!("playing file {:?} ({} bytes)", file.name(), file.size());
        start_playback(&source.video)?;
        Ok(source)
    }
}

impl FrameSource for VideoSource {
    type Frame = HtmlVideoElement;

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn native_size(&self) -> Option<(u32, u32)> {
        let (w, h) = (self.video.video_width(), self.video.video_height());
        (w > 0 && h > 0).then_some((w, h))
    }

    fn current_image(&self) -> Option<&HtmlVideoElement> {
        (self.video.ready_state() >= HAVE_CURRENT_DATA && self.native_size().is_some())
            .then_some(&self.video)
    }

    fn playback(&self) -> Option<Playback> {
        match self.kind {
            SourceKind::File => Playback::new(self.video.current_time(), self.video.duration()),
            _ => None,
        }
    }

    fn is_playing(&self) -> bool {
        !self.video.paused() && !self.video.ended()
    }

    fn toggle_playback(&mut self) -> Result<()> {
        if self.video.paused() {
            start_playback(&self.video)
        } else {
            Ok(self.video.pause()?)
        }
    }

    fn seek(&mut self, fraction: f64) {
        if let Some(playback) = self.playback() {
            self.video.set_current_time(playback.time_at(fraction));
        }
    }

    fn release(&mut self) {
        self.stop();
        log::debug!("released {:?} source", self.kind);
    }
}

impl VideoSource {
    /// Stop tracks and revoke the object URL; safe to call again.
    fn stop(&mut self) {
        self.video.pause().ok();
        if let Some(stream) = self.stream.take() {
            stop_stream(&stream);
            self.video.set_src_object(None);
        }
        if let Some(url) = self.object_url.take() {
            Url::revoke_object_url(&url).ok();
            self.video.remove_attribute("src").ok();
            self.video.load();
        }
    }
}

// Covers sources that fail half-way through construction and are never
// handed to the loop.
impl Drop for VideoSource {
    fn drop(&mut self) {
        self.stop();
    }
}
