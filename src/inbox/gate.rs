//! Fetch gate: at most one request in flight, and no two attempts closer
//! together than the configured minimum interval.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    InFlight,
    TooSoon { remaining: Duration },
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateRejection::InFlight => write!(f, "a fetch is already in flight"),
            GateRejection::TooSoon { remaining } => {
                write!(f, "minimum interval not elapsed ({}ms left)", remaining.as_millis())
            }
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    last_attempt: Option<Instant>,
}

#[derive(Debug)]
pub struct FetchGate {
    min_interval: Duration,
    state: Mutex<GateState>,
}

/// Held for the duration of one accepted fetch. Dropping it reopens the gate.
#[must_use = "the gate reopens as soon as the permit is dropped"]
pub struct FetchPermit<'a> {
    gate: &'a FetchGate,
}

impl Drop for FetchPermit<'_> {
    fn drop(&mut self) {
        self.gate.state.lock().in_flight = false;
    }
}

impl FetchGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Check-and-mark in one critical section so two callers can never both
    /// pass.
    pub fn try_acquire(&self, now: Instant) -> Result<FetchPermit<'_>, GateRejection> {
        let mut state = self.state.lock();
        if state.in_flight {
            return Err(GateRejection::InFlight);
        }
        if let Some(remaining) = remaining_wait(state.last_attempt, now, self.min_interval) {
            return Err(GateRejection::TooSoon { remaining });
        }
        state.in_flight = true;
        state.last_attempt = Some(now);
        Ok(FetchPermit { gate: self })
    }

    pub fn interval_elapsed(&self, now: Instant) -> bool {
        remaining_wait(self.state.lock().last_attempt, now, self.min_interval).is_none()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        self.state.lock().last_attempt
    }
}

fn remaining_wait(last: Option<Instant>, now: Instant, min_interval: Duration) -> Option<Duration> {
    let elapsed = now.saturating_duration_since(last?);
    if elapsed < min_interval {
        Some(min_interval - elapsed)
    } else {
        None
    }
}
