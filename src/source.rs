//! What the render loop needs from a video producer.

use crate::playback::Playback;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    None,
    Camera,
    File,
}

/// A live image producer: camera stream or file playback.
pub trait FrameSource {
    type Frame: ?Sized;

    fn kind(&self) -> SourceKind;

    /// Native pixel size, or `None` before decode has started.
    fn native_size(&self) -> Option<(u32, u32)>;

    /// Latest decoded frame, or `None` before the first one.
    fn current_image(&self) -> Option<&Self::Frame>;

    /// File sources only.
    fn playback(&self) -> Option<Playback>;

    fn is_playing(&self) -> bool;

    fn toggle_playback(&mut self) -> Result<()>;

    /// Jump to `fraction` of the duration. No-op for live sources.
    fn seek(&mut self, fraction: f64);

    /// Stop tracks and drop temporary handles. The loop calls it exactly
    /// once, before dropping the source.
    fn release(&mut self);
}

/// Proof that an acquisition was started; see [`AcquisitionSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Keeps at most one source acquisition meaningful at a time.
///
/// Every request takes a fresh ticket, which invalidates all older ones. When
/// an async acquisition finishes, only the holder of the latest ticket may
/// activate its result; anything else must be released unused.
#[derive(Debug, Default)]
pub struct AcquisitionSlot {
    generation: u64,
    pending: bool,
}

impl AcquisitionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.pending = true;
        Ticket(self.generation)
    }

    /// Finish `ticket`; true if it is still the latest request.
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        if ticket.0 == self.generation && self.pending {
            self.pending = false;
            true
        } else {
            false
        }
    }

    /// Invalidate whatever is in flight without starting a new request.
    pub fn cancel(&mut self) {
        if self.pending {
            self.generation += 1;
            self.pending = false;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True while `ticket` is the latest request and still in flight.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.pending && ticket.0 == self.generation
    }
}

/// What a camera button press should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Start an acquisition under this ticket.
    On(Ticket),
    Off,
}

/// On/off state of the camera as the user last asked for it.
///
/// Flips at click time, so a second press always undoes the first even
/// before the loop has seen the resulting source.
#[derive(Debug, Default)]
pub struct CameraSwitch {
    slot: AcquisitionSlot,
    wanted: bool,
}

impl CameraSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) -> Toggle {
        if self.wanted {
            self.abandon();
            Toggle::Off
        } else {
            self.wanted = true;
            Toggle::On(self.slot.begin())
        }
    }

    /// See [`AcquisitionSlot::complete`].
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        self.slot.complete(ticket)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.slot.is_current(ticket)
    }

    /// Forget the camera: another source was chosen or acquisition failed.
    pub fn abandon(&mut self) {
        self.slot.cancel();
        self.wanted = false;
    }

    pub fn is_wanted(&self) -> bool {
        self.wanted
    }
}
