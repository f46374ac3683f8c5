/// Position within a file source, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub current_time: f64,
    pub duration: f64,
}

impl Playback {
    /// `None` until the duration is known and finite.
    pub fn new(current_time: f64, duration: f64) -> Option<Self> {
        if duration.is_finite() && duration > 0.0 {
            Some(Playback {
                current_time,
                duration,
            })
        } else {
            None
        }
    }

    /// Position as a percentage for the time slider.
    pub fn percent(&self) -> f64 {
        (self.current_time / self.duration * 100.0).clamp(0.0, 100.0)
    }

    /// Time in seconds for a slider fraction in `[0, 1]`.
    pub fn time_at(&self, fraction: f64) -> f64 {
        fraction.clamp(0.0, 1.0) * self.duration
    }

    /// `MM:SS / MM:SS`
    pub fn label(&self) -> String {
        format!(
            "{} / {}",
            format_clock(self.current_time),
            format_clock(self.duration)
        )
    }
}

/// Minutes and seconds, both zero-padded to two digits.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}
