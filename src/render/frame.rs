use tracing::trace;

use super::FrameFence;

/// Round robin of frame slots. Each slot remembers the fence value signalled
/// when its commands were submitted, and is only handed out again once the GPU
/// has passed that value.
pub struct FrameRing {
    fence_values: Vec<u64>,
    current: usize,
    frame_number: u64,
}

impl FrameRing {
    pub fn new(frames_in_flight: usize) -> Self {
        Self {
            fence_values: vec![0; frames_in_flight.max(1)],
            current: 0,
            frame_number: 0,
        }
    }

    pub fn frames_in_flight(&self) -> usize {
        self.fence_values.len()
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Wait for the current slot's previous work, then hand the slot out.
    pub fn begin_frame<F: FrameFence + ?Sized>(&mut self, fence: &mut F) -> usize {
        let pending = self.fence_values[self.current];
        if fence.completed_value() < pending {
            trace!(
                "frame slot {} waiting on fence value {} (completed {})",
                self.current,
                pending,
                fence.completed_value()
            );
            fence.wait_for(pending);
        }
        self.current
    }

    /// Submit the current slot and advance to the next one.
    pub fn end_frame<F: FrameFence + ?Sized>(&mut self, fence: &mut F) {
        self.fence_values[self.current] = fence.signal();
        self.current = (self.current + 1) % self.fence_values.len();
        self.frame_number += 1;
    }

    /// Block until every submitted frame has finished.
    pub fn flush<F: FrameFence + ?Sized>(&self, fence: &mut F) {
        if let Some(&latest) = self.fence_values.iter().max() {
            if fence.completed_value() < latest {
                fence.wait_for(latest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ManualFence {
        next: u64,
        completed: u64,
        waits: Vec<u64>,
    }

    impl FrameFence for ManualFence {
        fn signal(&mut self) -> u64 {
            self.next += 1;
            self.next
        }

        fn completed_value(&self) -> u64 {
            self.completed
        }

        fn wait_for(&mut self, value: u64) {
            self.waits.push(value);
            self.completed = self.completed.max(value);
        }
    }

    #[test]
    fn slots_rotate() {
        let mut ring = FrameRing::new(3);
        let mut fence = ManualFence::default();
        let mut slots = Vec::new();
        for _ in 0..6 {
            slots.push(ring.begin_frame(&mut fence));
            ring.end_frame(&mut fence);
        }
        assert_eq!(slots, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(ring.frame_number(), 6);
    }

    #[test]
    fn reused_slot_waits_for_its_fence() {
        let mut ring = FrameRing::new(2);
        let mut fence = ManualFence::default();
        for _ in 0..2 {
            ring.begin_frame(&mut fence);
            ring.end_frame(&mut fence);
        }
        assert!(fence.waits.is_empty());

        // slot 0 was submitted with fence value 1 and the GPU has not finished it
        ring.begin_frame(&mut fence);
        assert_eq!(fence.waits, vec![1]);
    }

    #[test]
    fn finished_work_does_not_wait() {
        let mut ring = FrameRing::new(2);
        let mut fence = ManualFence::default();
        ring.begin_frame(&mut fence);
        ring.end_frame(&mut fence);
        fence.completed = 10;
        ring.begin_frame(&mut fence);
        ring.end_frame(&mut fence);
        ring.begin_frame(&mut fence);
        assert!(fence.waits.is_empty());
    }

    #[test]
    fn flush_waits_for_latest() {
        let mut ring = FrameRing::new(3);
        let mut fence = ManualFence::default();
        for _ in 0..2 {
            ring.begin_frame(&mut fence);
            ring.end_frame(&mut fence);
        }
        ring.flush(&mut fence);
        assert_eq!(fence.waits, vec![2]);
    }
}
