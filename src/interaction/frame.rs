/// Keeps only the latest value pushed between two animation frames.
///
/// Pointer moves arrive far more often than the grid repaints; the
/// controllers recompute their preview once per frame from whatever position
/// is current when the frame fires.
#[derive(Debug, Clone)]
pub struct FrameCoalescer<T> {
    latest: Option<T>,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self { latest: None }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, replacing any not yet taken.
    pub fn push(&mut self, value: T) {
        self.latest = Some(value);
    }

    /// Take the pending value, if any, for this frame.
    pub fn take(&mut self) -> Option<T> {
        self.latest.take()
    }

    pub fn is_dirty(&self) -> bool {
        self.latest.is_some()
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_latest_value() {
        let mut frames = FrameCoalescer::new();
        frames.push(1);
        frames.push(2);
        frames.push(3);
        assert!(frames.is_dirty());
        assert_eq!(frames.take(), Some(3));
        assert_eq!(frames.take(), None);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut frames = FrameCoalescer::new();
        frames.push("a");
        frames.clear();
        assert!(!frames.is_dirty());
    }
}
