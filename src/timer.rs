use std::time::Instant;

/// Reports how long the current turn has been running.
pub trait Timer {
    /// Milliseconds since the turn started. Must never decrease within a turn.
    fn elapsed_ms(&self) -> u64;
}

/// Wall-clock [`Timer`] the host resets at the start of every turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnTimer {
    start: Instant,
}

impl TurnTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for TurnTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for TurnTimer {
    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Deadline for one `choose_move` call, fixed when the call starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    deadline_ms: u64,
}

impl SearchBudget {
    /// Allows `threshold_ms` more milliseconds on top of what `timer` has already used.
    pub fn starting_now<T: Timer>(timer: &T, threshold_ms: u64) -> Self {
        Self {
            deadline_ms: timer.elapsed_ms().saturating_add(threshold_ms),
        }
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    pub fn is_exhausted<T: Timer>(&self, timer: &T) -> bool {
        timer.elapsed_ms() > self.deadline_ms
    }
}
