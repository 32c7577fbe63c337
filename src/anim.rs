use std::time::{Duration, Instant};

/// Frame scheduler for one animated image.
///
/// Two states: loading (no frames yet, `frame()` is `None`) and playing
/// (cyclic index advanced on each frame's own delay, not a fixed rate).
/// Switching files just calls `start` again; there is no stop state.
pub struct Animator {
    delays: Vec<Duration>,
    frame: usize,
    next_at: Option<Instant>,
}

impl Animator {
    pub fn new() -> Self {
        Self {
            delays: Vec::new(),
            frame: 0,
            next_at: None,
        }
    }

    /// Begin playing a freshly decoded frame set from index 0.
    pub fn start(&mut self, delays: Vec<Duration>, now: Instant) {
        self.frame = 0;
        self.next_at = delays.first().map(|d| now + *d);
        self.delays = delays;
    }

    /// Current frame index, `None` while loading.
    pub fn frame(&self) -> Option<usize> {
        self.next_at.map(|_| self.frame)
    }

    /// Advance past every frame whose deadline has passed and return the
    /// time until the next flip, for `request_repaint_after`.
    ///
    /// Catch-up is capped at one full cycle; after a longer stall playback
    /// resumes from the frame we landed on rather than spinning through
    /// missed wraps.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        let mut next_at = self.next_at?;
        let len = self.delays.len();

        let mut steps = 0;
        while now >= next_at && steps < len {
            self.frame = (self.frame + 1) % len;
            next_at += self.delays[self.frame];
            steps += 1;
        }
        if now >= next_at {
            next_at = now + self.delays[self.frame];
        }

        self.next_at = Some(next_at);
        Some(next_at - now)
    }
}
