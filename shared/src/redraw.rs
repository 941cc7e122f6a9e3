#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedrawTracker {
    dirty: bool,
    continuous: bool,
}

impl RedrawTracker {
    pub fn new() -> Self {
        Self {
            dirty: true,
            continuous: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
        self.dirty = true;
    }

    pub fn wants_frame(&self) -> bool {
        self.continuous || self.dirty
    }

    pub fn take_frame(&mut self) -> bool {
        let draw = self.wants_frame();
        self.dirty = false;
        draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_demand_frames_are_consumed_once() {
        let mut tracker = RedrawTracker::new();
        assert!(tracker.take_frame());
        assert!(!tracker.take_frame());
        tracker.mark_dirty();
        assert!(tracker.wants_frame());
        assert!(tracker.take_frame());
        assert!(!tracker.wants_frame());
    }

    #[test]
    fn continuous_mode_paints_every_tick() {
        let mut tracker = RedrawTracker::new();
        tracker.set_continuous(true);
        for _ in 0..3 {
            assert!(tracker.take_frame());
        }
        tracker.set_continuous(false);
        assert!(tracker.take_frame());
        assert!(!tracker.take_frame());
    }
}
