//! Bounded retry for restoring a tape once its animation is attached
//!
//! ```text
//! Waiting --begin--> Attempting --ready--> Succeeded
//!    ^                   |
//!    +----not ready------+ (budget left)
//!                        +--not ready, budget spent--> Exhausted
//! ```

/// Where a single element's restore stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    /// Timer pending for the next attempt
    Waiting,
    /// An attempt is running right now
    Attempting,
    /// Position was applied
    Succeeded,
    /// Budget spent without the animation ever showing up
    Exhausted,
}

/// Outcome of probing the element during one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Ready,
    NotReady,
}

/// Retry budget plus current phase for one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreRetry {
    phase: RetryPhase,
    attempts: u32,
    max_attempts: u32,
}

impl RestoreRetry {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            phase: RetryPhase::Waiting,
            attempts: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    /// Attempts started so far (1-based once the first attempt begins)
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Move from `Waiting` to `Attempting`. Returns false in any other phase.
    pub fn begin(&mut self) -> bool {
        if self.phase != RetryPhase::Waiting {
            return false;
        }
        self.attempts += 1;
        self.phase = RetryPhase::Attempting;
        true
    }

    /// Close the running attempt and return the new phase
    pub fn finish(&mut self, outcome: AttemptOutcome) -> RetryPhase {
        if self.phase != RetryPhase::Attempting {
            return self.phase;
        }
        self.phase = match outcome {
            AttemptOutcome::Ready => RetryPhase::Succeeded,
            AttemptOutcome::NotReady if self.attempts >= self.max_attempts => RetryPhase::Exhausted,
            AttemptOutcome::NotReady => RetryPhase::Waiting,
        };
        self.phase
    }

    /// Run a whole attempt with `probe` deciding readiness
    pub fn attempt<F>(&mut self, probe: F) -> RetryPhase
    where
        F: FnOnce() -> AttemptOutcome,
    {
        if !self.begin() {
            return self.phase;
        }
        let outcome = probe();
        self.finish(outcome)
    }
}

/// Timing for a batch of element restores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    /// Delay before the first attempt (ms)
    pub initial_delay_ms: u32,
    /// Delay between later attempts (ms)
    pub retry_delay_ms: u32,
    pub max_attempts: u32,
}

impl RetrySchedule {
    /// Delay before attempt number `attempt` (1-based)
    pub fn delay_before(&self, attempt: u32) -> u32 {
        if attempt <= 1 {
            self.initial_delay_ms
        } else {
            self.retry_delay_ms
        }
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self {
            initial_delay_ms: crate::consts::RESTORE_INITIAL_DELAY_MS,
            retry_delay_ms: crate::consts::RESTORE_RETRY_DELAY_MS,
            max_attempts: crate::consts::RESTORE_MAX_ATTEMPTS,
        }
    }
}
