use super::*;
use std::collections::VecDeque;

/// A [`Replacer`] that evicts candidates in the order they were unpinned, with no second chance.
#[derive(Debug)]
pub struct FifoReplacer {
    /// A queue of unpinned frames, oldest first.
    queue: VecDeque<FrameId>,

    /// Whether each frame is currently in the queue.
    queued: Vec<bool>,
}

impl Replacer for FifoReplacer {
    fn new(num_frames: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(num_frames),
            queued: vec![false; num_frames],
        }
    }

    fn pin(&mut self, frame_id: FrameId) {
        // If the frame is unpinned it will be in the queue, so remove it.
        if !self.queued[frame_id.as_usize()] {
            return;
        }

        if let Some(index) = self.queue.iter().position(|&x| x == frame_id) {
            self.queue.remove(index);
        }
        self.queued[frame_id.as_usize()] = false;
    }

    fn unpin(&mut self, frame_id: FrameId) {
        // If the frame is already a candidate then do nothing.
        if self.queued[frame_id.as_usize()] {
            return;
        }

        self.queue.push_back(frame_id);
        self.queued[frame_id.as_usize()] = true;
    }

    fn victim(&mut self) -> Option<FrameId> {
        let frame_id = self.queue.pop_front()?;
        self.queued[frame_id.as_usize()] = false;
        Some(frame_id)
    }

    fn restore(&mut self, frame_id: FrameId) {
        if self.queued[frame_id.as_usize()] {
            return;
        }

        self.queue.push_front(frame_id);
        self.queued[frame_id.as_usize()] = true;
    }

    fn size(&self) -> usize {
        self.queue.len()
    }

    fn contains(&self, frame_id: FrameId) -> bool {
        self.queued.get(frame_id.as_usize()).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_in_unpin_order() {
        let mut fifo = FifoReplacer::new(4);
        fifo.unpin(FrameId::new(2));
        fifo.unpin(FrameId::new(0));
        fifo.unpin(FrameId::new(3));
        fifo.unpin(FrameId::new(0));
        assert_eq!(fifo.size(), 3);

        assert_eq!(fifo.victim(), Some(FrameId::new(2)));
        assert_eq!(fifo.victim(), Some(FrameId::new(0)));
        assert_eq!(fifo.victim(), Some(FrameId::new(3)));
        assert_eq!(fifo.victim(), None);
    }

    #[test]
    fn pin_removes_candidate() {
        let mut fifo = FifoReplacer::new(3);
        fifo.unpin(FrameId::new(0));
        fifo.unpin(FrameId::new(1));
        fifo.pin(FrameId::new(0));
        fifo.pin(FrameId::new(2));

        assert!(!fifo.contains(FrameId::new(0)));
        assert_eq!(fifo.size(), 1);
        assert_eq!(fifo.victim(), Some(FrameId::new(1)));
        assert_eq!(fifo.victim(), None);
    }

    #[test]
    fn restored_victim_goes_first() {
        let mut fifo = FifoReplacer::new(3);
        fifo.unpin(FrameId::new(1));
        fifo.unpin(FrameId::new(2));

        let victim = fifo.victim().unwrap();
        fifo.restore(victim);
        assert_eq!(fifo.size(), 2);
        assert_eq!(fifo.victim(), Some(victim));
        assert_eq!(fifo.victim(), Some(FrameId::new(2)));
    }
}
