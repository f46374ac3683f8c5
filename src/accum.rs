//! Ping-pong pair of accumulation targets.

use crate::pipeline::RenderTarget;
use crate::Result;

/// Two same-size targets whose "front" and "back" roles swap every frame.
///
/// Front is the last image presented; back is written next. The targets
/// themselves never move, only the role index does.
pub struct AccumulationBuffers<T> {
    slots: [T; 2],
    front: usize,
}

impl<T: RenderTarget> AccumulationBuffers<T> {
    pub fn new(a: T, b: T) -> Self {
        AccumulationBuffers {
            slots: [a, b],
            front: 0,
        }
    }

    /// The buffer most recently presented.
    pub fn current(&self) -> &T {
        &self.slots[self.front]
    }

    /// The buffer to be written this frame.
    pub fn next(&self) -> &T {
        &self.slots[1 - self.front]
    }

    /// Borrow `(front, back)` at once for the blend pass.
    pub fn split(&mut self) -> (&T, &mut T) {
        let (a, b) = self.slots.split_at_mut(1);
        if self.front == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Exchange roles. Call once per rendered frame, after presenting.
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    pub fn size(&self) -> (u32, u32) {
        self.slots[0].size()
    }

    /// Reallocate both targets; their content is lost.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        for slot in &mut self.slots {
            slot.resize(width, height)?;
        }
        self.front = 0;
        Ok(())
    }

    /// Blank both targets so nothing stale survives a source change.
    pub fn reset(&mut self) -> Result<()> {
        for slot in &mut self.slots {
            slot.clear()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tagged {
        id: u8,
        size: (u32, u32),
        clears: u32,
    }

    impl Tagged {
        fn new(id: u8) -> Self {
            Tagged {
                id,
                size: (4, 4),
                clears: 0,
            }
        }
    }

    impl RenderTarget for Tagged {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<()> {
            self.size = (width, height);
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.clears += 1;
            Ok(())
        }
    }

    #[test]
    fn swap_alternates_roles() {
        let mut bufs = AccumulationBuffers::new(Tagged::new(0), Tagged::new(1));
        assert_eq!(bufs.current().id, 0);
        assert_eq!(bufs.next().id, 1);

        bufs.swap();
        assert_eq!(bufs.current().id, 1);
        assert_eq!(bufs.next().id, 0);

        bufs.swap();
        assert_eq!(bufs.current().id, 0);
    }

    #[test]
    fn split_never_aliases() {
        let mut bufs = AccumulationBuffers::new(Tagged::new(0), Tagged::new(1));
        for _ in 0..3 {
            let (front, back) = bufs.split();
            assert_ne!(front.id, back.id);
            let back_id = back.id;
            bufs.swap();
            assert_eq!(bufs.current().id, back_id);
        }
    }

    #[test]
    fn resize_and_reset_touch_both() {
        let mut bufs = AccumulationBuffers::new(Tagged::new(0), Tagged::new(1));
        bufs.swap();
        bufs.resize(16, 9).unwrap();
        assert_eq!(bufs.size(), (16, 9));
        assert_eq!(bufs.next().size, (16, 9));
        assert_eq!(bufs.current().id, 0);

        bufs.reset().unwrap();
        assert_eq!(bufs.current().clears, 1);
        assert_eq!(bufs.next().clears, 1);
    }
}
