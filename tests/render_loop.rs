use std::cell::Cell;
use std::rc::Rc;

use trail_viewer::blend::{BlendParameters, Texel};
use trail_viewer::geometry::{Fit, Rotation};
use trail_viewer::pipeline::RenderTarget;
use trail_viewer::playback::Playback;
use trail_viewer::render_loop::{Command, LoopState, RenderLoop};
use trail_viewer::software::{Image, SoftwareBackend, BLACK};
use trail_viewer::source::{AcquisitionSlot, FrameSource, SourceKind};
use trail_viewer::Result;

const RED: Texel = [1.0, 0.0, 0.0, 1.0];
const WHITE: Texel = [1.0, 1.0, 1.0, 1.0];
const RETRY_MS: f64 = 100.0;

/// A source that keeps showing one image.
struct StillSource {
    kind: SourceKind,
    image: Image,
    ready: Rc<Cell<bool>>,
    released: Rc<Cell<bool>>,
    playing: bool,
    position: f64,
    duration: f64,
}

impl StillSource {
    fn new(kind: SourceKind, width: u32, height: u32, texel: Texel) -> Self {
        StillSource {
            kind,
            image: Image::filled(width, height, texel),
            ready: Rc::new(Cell::new(true)),
            released: Rc::new(Cell::new(false)),
            playing: true,
            position: 0.0,
            duration: 120.0,
        }
    }
}

impl FrameSource for StillSource {
    type Frame = Image;

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn native_size(&self) -> Option<(u32, u32)> {
        self.ready.get().then(|| self.image.size())
    }

    fn current_image(&self) -> Option<&Image> {
        self.ready.get().then_some(&self.image)
    }

    fn playback(&self) -> Option<Playback> {
        match self.kind {
            SourceKind::File => Playback::new(self.position, self.duration),
            _ => None,
        }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn toggle_playback(&mut self) -> Result<()> {
        self.playing = !self.playing;
        Ok(())
    }

    fn seek(&mut self, fraction: f64) {
        if let Some(p) = self.playback() {
            self.position = p.time_at(fraction);
        }
    }

    fn release(&mut self) {
        assert!(!self.released.get(), "released twice");
        self.released.set(true);
    }
}

type Loop = RenderLoop<SoftwareBackend, StillSource>;

fn viewer(width: u32, height: u32) -> Loop {
    RenderLoop::new(SoftwareBackend::new(), (width, height), RETRY_MS).unwrap()
}

fn params(decay: f32) -> BlendParameters {
    BlendParameters {
        decay,
        contrast: 1.0,
        brightness: 0.0,
    }
}

fn rgb(t: Texel) -> [f32; 3] {
    [t[0], t[1], t[2]]
}

#[test]
fn idle_presents_black() {
    let mut v = viewer(8, 8);
    assert_eq!(v.state(), LoopState::Idle);
    v.tick(0.0, &params(0.9)).unwrap();
    assert!(v.backend().screen().is_uniform(BLACK));

    v.dispatch(Command::Activate(StillSource::new(SourceKind::Camera, 8, 8, RED)))
        .unwrap();
    for i in 0..4 {
        v.tick(16.0 * i as f64, &params(0.9)).unwrap();
    }
    assert!(!v.backend().screen().is_uniform(BLACK));

    v.dispatch(Command::Deactivate).unwrap();
    assert_eq!(v.state(), LoopState::Idle);
    v.tick(100.0, &params(0.9)).unwrap();
    assert!(v.backend().screen().is_uniform(BLACK));
}

#[test]
fn front_buffer_is_last_presented_frame() {
    let mut v = viewer(6, 6);
    v.dispatch(Command::Activate(StillSource::new(SourceKind::File, 6, 6, RED)))
        .unwrap();

    for i in 0..5 {
        v.tick(16.0 * i as f64, &params(0.8)).unwrap();
        let screen = v.backend().screen();
        let front = v.buffers().current();
        for (shown, stored) in screen.texels().iter().zip(front.texels()) {
            assert_eq!(rgb(*shown), rgb(*stored));
        }
    }
    assert_eq!(v.frames(), 5);
}

#[test]
fn reactivation_shows_no_stale_frame() {
    let mut v = viewer(4, 4);
    let p = params(0.9);

    v.dispatch(Command::Activate(StillSource::new(SourceKind::Camera, 4, 4, RED)))
        .unwrap();
    for i in 0..10 {
        v.tick(16.0 * i as f64, &p).unwrap();
    }
    let before = v.backend().screen().clone();

    v.dispatch(Command::Deactivate).unwrap();
    assert!(v.buffers().current().is_uniform([0.0; 4]));
    assert!(v.buffers().next().is_uniform([0.0; 4]));

    v.dispatch(Command::Activate(StillSource::new(SourceKind::Camera, 4, 4, RED)))
        .unwrap();
    v.tick(500.0, &p).unwrap();
    let after = v.backend().screen().clone();

    assert_ne!(before, after);
    // The trail restarted from blank: red is far dimmer than before.
    assert!(after.texel(0, 0)[0] < before.texel(0, 0)[0]);
}

#[test]
fn switching_sources_releases_the_previous_one() {
    let mut v = viewer(4, 4);
    let camera = StillSource::new(SourceKind::Camera, 4, 4, RED);
    let camera_released = camera.released.clone();
    let file = StillSource::new(SourceKind::File, 4, 4, WHITE);
    let file_released = file.released.clone();

    v.dispatch(Command::Activate(camera)).unwrap();
    v.tick(0.0, &params(0.5)).unwrap();
    assert_eq!(v.status().kind, SourceKind::Camera);

    v.dispatch(Command::Activate(file)).unwrap();
    assert!(camera_released.get());
    assert!(!file_released.get());
    assert_eq!(v.status().kind, SourceKind::File);
    assert!(v.buffers().current().is_uniform([0.0; 4]));

    v.dispatch(Command::Deactivate).unwrap();
    assert!(file_released.get());
    assert_eq!(v.status().kind, SourceKind::None);

    // Deactivating while idle is a no-op.
    v.dispatch(Command::Deactivate).unwrap();
}

#[test]
fn geometry_waits_for_metadata() {
    let mut v = viewer(8, 8);
    let source = StillSource::new(SourceKind::File, 16, 9, WHITE);
    let ready = source.ready.clone();
    ready.set(false);

    v.dispatch(Command::Activate(source)).unwrap();
    v.tick(0.0, &params(0.5)).unwrap();
    assert_eq!(v.geometry().fit, Fit::default());
    // No decoded frame yet: nothing blended, blank front presented.
    assert_eq!(v.frames(), 0);
    assert!(v.backend().screen().is_uniform(BLACK));

    ready.set(true);
    v.tick(50.0, &params(0.5)).unwrap();
    assert_eq!(v.geometry().fit, Fit::default(), "retried before the delay");

    v.tick(RETRY_MS, &params(0.5)).unwrap();
    let fit = v.geometry().fit;
    assert_eq!(fit.scale_x, 1.0);
    assert!((fit.scale_y - 0.5625).abs() < 1e-6, "{fit:?}");
}

#[test]
fn rotation_refits_and_cycles() {
    let mut v = viewer(16, 9);
    v.dispatch(Command::Activate(StillSource::new(SourceKind::File, 16, 9, WHITE)))
        .unwrap();
    v.tick(0.0, &params(0.5)).unwrap();
    assert_eq!(v.geometry().fit, Fit::default());

    v.dispatch(Command::Rotate).unwrap();
    v.tick(16.0, &params(0.5)).unwrap();
    assert_eq!(v.status().rotation, Rotation::Deg90);
    let turned = v.geometry().fit;
    assert_eq!(turned.scale_x, 1.0);
    assert!((turned.scale_y - 0.3164).abs() < 1e-3, "{turned:?}");

    for _ in 0..3 {
        v.dispatch(Command::Rotate).unwrap();
    }
    v.tick(32.0, &params(0.5)).unwrap();
    assert_eq!(v.status().rotation, Rotation::Deg0);
    assert_eq!(v.geometry().fit, Fit::default());
}

#[test]
fn letterbox_margins_stay_black() {
    let mut v = viewer(10, 10);
    v.dispatch(Command::Activate(StillSource::new(SourceKind::File, 32, 18, WHITE)))
        .unwrap();
    v.tick(0.0, &params(0.0)).unwrap();

    let screen = v.backend().screen();
    assert_eq!(screen.texel(5, 0), BLACK);
    assert_eq!(screen.texel(5, 9), BLACK);
    assert_eq!(screen.texel(0, 5), WHITE);
    assert_eq!(screen.texel(9, 5), WHITE);
}

#[test]
fn resize_reallocates_blank_buffers() {
    let mut v = viewer(4, 4);
    v.dispatch(Command::Activate(StillSource::new(SourceKind::Camera, 4, 4, RED)))
        .unwrap();
    v.tick(0.0, &params(0.5)).unwrap();
    assert!(!v.buffers().current().is_uniform([0.0; 4]));

    v.dispatch(Command::Resize {
        width: 12,
        height: 6,
    })
    .unwrap();
    assert_eq!(v.buffers().size(), (12, 6));
    assert!(v.buffers().current().is_uniform([0.0; 4]));
    assert!(v.buffers().next().is_uniform([0.0; 4]));

    v.tick(16.0, &params(0.5)).unwrap();
    assert_eq!(v.backend().screen().size(), (12, 6));
    assert_eq!(v.state(), LoopState::Accumulating);
}

#[test]
fn playback_commands_reach_the_source() {
    let mut v = viewer(4, 4);
    v.dispatch(Command::Activate(StillSource::new(SourceKind::File, 4, 4, RED)))
        .unwrap();
    assert!(v.status().playing);

    v.dispatch(Command::TogglePlayback).unwrap();
    assert!(!v.status().playing);

    v.dispatch(Command::Seek { fraction: 0.25 }).unwrap();
    let playback = v.status().playback.unwrap();
    assert_eq!(playback.current_time, 30.0);
    assert_eq!(playback.label(), "00:30 / 02:00");

    // Camera sources have no timeline.
    v.dispatch(Command::Activate(StillSource::new(SourceKind::Camera, 4, 4, RED)))
        .unwrap();
    v.dispatch(Command::Seek { fraction: 0.5 }).unwrap();
    assert_eq!(v.status().playback, None);
}

#[test]
fn camera_request_waits_for_teardown() {
    let mut v = viewer(4, 4);
    let file = StillSource::new(SourceKind::File, 4, 4, WHITE);
    let file_released = file.released.clone();
    v.dispatch(Command::Activate(file)).unwrap();
    v.tick(0.0, &params(0.5)).unwrap();
    assert_eq!(v.take_acquisition(), None);

    let mut slot = AcquisitionSlot::new();
    let ticket = slot.begin();
    v.dispatch(Command::Acquire(ticket)).unwrap();

    // The ticket only comes back once the file is gone and the trail cleared.
    assert!(file_released.get());
    assert_eq!(v.state(), LoopState::Idle);
    assert!(v.buffers().current().is_uniform([0.0; 4]));
    assert_eq!(v.take_acquisition(), Some(ticket));
    assert_eq!(v.take_acquisition(), None);

    // Requesting from idle has nothing to release.
    let again = slot.begin();
    v.dispatch(Command::Acquire(again)).unwrap();
    assert_eq!(v.take_acquisition(), Some(again));
}
