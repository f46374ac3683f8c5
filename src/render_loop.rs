//! The per-frame driver and its Idle/Accumulating state machine.

use crate::accum::AccumulationBuffers;
use crate::blend::BlendParameters;
use crate::geometry::{fit, GeometryState, Rotation};
use crate::pipeline::Backend;
use crate::playback::Playback;
use crate::source::{FrameSource, SourceKind, Ticket};
use crate::Result;

/// UI action or viewport change, consumed synchronously at the next tick.
pub enum Command<S> {
    /// Replace the active source; the previous one is torn down first.
    Activate(S),
    Deactivate,
    /// Tear down the active source, then release `ticket` through
    /// [`RenderLoop::take_acquisition`] so the replacement can be requested.
    Acquire(Ticket),
    /// Advance rotation by 90 degrees.
    Rotate,
    Resize { width: u32, height: u32 },
    TogglePlayback,
    /// Scrub a file source to `fraction` of its duration.
    Seek { fraction: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Accumulating,
}

/// Snapshot the control surface reads back after each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub state: LoopState,
    pub kind: SourceKind,
    pub playing: bool,
    pub playback: Option<Playback>,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Refit {
    Done,
    /// Try again once the tick timestamp reaches this value (ms).
    Pending { not_before: f64 },
}

pub struct RenderLoop<B: Backend, S> {
    backend: B,
    buffers: AccumulationBuffers<B::Target>,
    source: Option<S>,
    geometry: GeometryState,
    viewport: (u32, u32),
    refit: Refit,
    retry_delay_ms: f64,
    frames: u64,
    acquisition: Option<Ticket>,
}

impl<B, S> RenderLoop<B, S>
where
    B: Backend,
    S: FrameSource<Frame = B::Frame>,
{
    pub fn new(mut backend: B, viewport: (u32, u32), retry_delay_ms: f64) -> Result<Self> {
        let (w, h) = viewport;
        backend.resize_viewport(w, h);
        let a = backend.create_target(w, h)?;
        let b = backend.create_target(w, h)?;
        Ok(RenderLoop {
            backend,
            buffers: AccumulationBuffers::new(a, b),
            source: None,
            geometry: GeometryState::default(),
            viewport,
            refit: Refit::Done,
            retry_delay_ms,
            frames: 0,
            acquisition: None,
        })
    }

    pub fn state(&self) -> LoopState {
        if self.source.is_some() {
            LoopState::Accumulating
        } else {
            LoopState::Idle
        }
    }

    pub fn status(&self) -> Status {
        let source = self.source.as_ref();
        Status {
            state: self.state(),
            kind: source.map_or(SourceKind::None, |s| s.kind()),
            playing: source.is_some_and(|s| s.is_playing()),
            playback: source.and_then(|s| s.playback()),
            rotation: self.geometry.rotation,
        }
    }

    pub fn geometry(&self) -> GeometryState {
        self.geometry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn buffers(&self) -> &AccumulationBuffers<B::Target> {
        &self.buffers
    }

    /// Frames blended since start-up.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn dispatch(&mut self, command: Command<S>) -> Result<()> {
        match command {
            Command::Activate(source) => {
                self.teardown()?;
                log::info!("source activated: {:?}", source.kind());
                self.source = Some(source);
                self.schedule_refit();
            }
            Command::Deactivate => {
                if self.source.is_some() {
                    self.teardown()?;
                    log::info!("source deactivated, idle");
                }
            }
            Command::Acquire(ticket) => {
                self.teardown()?;
                self.acquisition = Some(ticket);
            }
            Command::Rotate => {
                self.geometry.rotation = self.geometry.rotation.next();
                log::debug!("rotation now {}°", self.geometry.rotation.degrees());
                self.schedule_refit();
            }
            Command::Resize { width, height } => {
                if (width, height) != self.viewport && width > 0 && height > 0 {
                    self.viewport = (width, height);
                    self.backend.resize_viewport(width, height);
                    self.buffers.resize(width, height)?;
                    self.schedule_refit();
                }
            }
            Command::TogglePlayback => {
                if let Some(source) = self.source.as_mut() {
                    source.toggle_playback()?;
                }
            }
            Command::Seek { fraction } => {
                if let Some(source) = self.source.as_mut() {
                    source.seek(fraction);
                }
            }
        }
        Ok(())
    }

    /// Ticket of an acquisition whose previous source is already torn down.
    pub fn take_acquisition(&mut self) -> Option<Ticket> {
        self.acquisition.take()
    }

    /// Run one display-refresh iteration. `now` is the frame timestamp in ms.
    pub fn tick(&mut self, now: f64, params: &BlendParameters) -> Result<()> {
        self.poll_refit(now);

        let Some(source) = self.source.as_ref() else {
            return self.backend.present_blank();
        };

        match source.current_image() {
            Some(frame) => {
                let (front, back) = self.buffers.split();
                self.backend.blend(frame, front, back, params)?;
                self.backend.present(self.buffers.next(), &self.geometry)?;
                self.buffers.swap();
                self.frames += 1;
                Ok(())
            }
            None => self.backend.present(self.buffers.current(), &self.geometry),
        }
    }

    fn teardown(&mut self) -> Result<()> {
        if let Some(mut old) = self.source.take() {
            old.release();
        }
        self.buffers.reset()
    }

    fn schedule_refit(&mut self) {
        self.refit = Refit::Pending {
            not_before: f64::NEG_INFINITY,
        };
    }

    fn poll_refit(&mut self, now: f64) {
        let Refit::Pending { not_before } = self.refit else {
            return;
        };
        if now < not_before {
            return;
        }
        let Some(source) = self.source.as_ref() else {
            return;
        };

        let fitted = source
            .native_size()
            .and_then(|size| fit(size, self.viewport, self.geometry.rotation));
        match fitted {
            Some(f) => {
                self.geometry.fit = f;
                self.refit = Refit::Done;
                log::debug!(
                    "fit {:?} in {:?} at {}°: {:.4} x {:.4}",
                    source.native_size(),
                    self.viewport,
                    self.geometry.rotation.degrees(),
                    f.scale_x,
                    f.scale_y
                );
            }
            None => {
                self.refit = Refit::Pending {
                    not_before: now + self.retry_delay_ms,
                };
                log::debug!("source metadata not ready, retrying in {}ms", self.retry_delay_ms);
            }
        }
    }
}
