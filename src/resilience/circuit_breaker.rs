//! Per-backend circuit breaker
//!
//! # State Machine
//!
//! ```text
//! CLOSED ──[failure_threshold consecutive faults]──► OPEN
//!                                                     │
//!                                              [reset_timeout]
//!                                                     ▼
//!                                                 HALF-OPEN ──[fault]──► OPEN (clock restarts)
//!                                                     │
//!                                   [half_open_max_calls successes]
//!                                                     ▼
//!                                                  CLOSED
//! ```
//!
//! State lives in atomics; the Open → HalfOpen transition is a
//! compare-exchange so exactly one caller performs it. Only errors for which
//! [`PhonemizerError::is_backend_fault`] holds count as failures.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::errors::PhonemizerError;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HALF_OPEN_MAX_CALLS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive faults that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing trial calls
    pub reset_timeout: Duration,
    /// Trial calls admitted while half-open; this many successes close the circuit
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
            half_open_max_calls: DEFAULT_HALF_OPEN_MAX_CALLS,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    /// Nanoseconds since `epoch` when the circuit last opened
    opened_at: AtomicU64,
    half_open_calls: AtomicU32,
    half_open_successes: AtomicU32,
    epoch: Instant,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU32::new(0),
            opened_at: AtomicU64::new(0),
            half_open_calls: AtomicU32::new(0),
            half_open_successes: AtomicU32::new(0),
            epoch: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Time until an open circuit admits trial calls
    pub fn remaining_open_time(&self) -> Option<Duration> {
        if self.state() != CircuitState::Open {
            return None;
        }
        let elapsed = self
            .now_nanos()
            .saturating_sub(self.opened_at.load(Ordering::Acquire));
        Some(
            self.config
                .reset_timeout
                .saturating_sub(Duration::from_nanos(elapsed)),
        )
    }

    /// Whether a call may go to the backend now
    ///
    /// An open circuit whose timeout has elapsed moves to half-open here; each
    /// `true` answer in half-open consumes one trial slot.
    pub fn can_execute(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = self
                    .now_nanos()
                    .saturating_sub(self.opened_at.load(Ordering::Acquire));
                if Duration::from_nanos(elapsed) < self.config.reset_timeout {
                    return false;
                }
                if self
                    .state
                    .compare_exchange(
                        CircuitState::Open as u8,
                        CircuitState::HalfOpen as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    // Half-open counters were zeroed when the circuit opened
                    tracing::info!(backend = %self.name, "Circuit half-open, admitting trial calls");
                }
                self.try_half_open_slot()
            }
            CircuitState::HalfOpen => self.try_half_open_slot(),
        }
    }

    fn try_half_open_slot(&self) -> bool {
        self.half_open_calls
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |calls| {
                (calls < self.config.half_open_max_calls).then_some(calls + 1)
            })
            .is_ok()
    }

    pub fn on_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
        if self.state() != CircuitState::HalfOpen {
            return;
        }
        let successes = self.half_open_successes.fetch_add(1, Ordering::AcqRel) + 1;
        if successes >= self.config.half_open_max_calls
            && self
                .state
                .compare_exchange(
                    CircuitState::HalfOpen as u8,
                    CircuitState::Closed as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
        {
            tracing::info!(backend = %self.name, "Circuit closed");
        }
    }

    /// Record a failed call
    ///
    /// Errors that are not backend faults (cancellation, invalid input) leave
    /// the failure count alone and hand back a half-open trial slot.
    pub fn on_failure(&self, error: &PhonemizerError) {
        if !error.is_backend_fault() {
            if self.state() == CircuitState::HalfOpen {
                let _ = self.half_open_calls.fetch_update(
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    |calls| calls.checked_sub(1),
                );
            }
            return;
        }
        self.record_fault(error);
    }

    fn record_fault(&self, error: &PhonemizerError) {
        match self.state() {
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.config.failure_threshold {
                    self.open(error);
                }
            }
            CircuitState::HalfOpen => self.open(error),
            CircuitState::Open => {}
        }
    }

    fn open(&self, error: &PhonemizerError) {
        self.opened_at.store(self.now_nanos(), Ordering::Release);
        self.half_open_calls.store(0, Ordering::Release);
        self.half_open_successes.store(0, Ordering::Release);
        self.state
            .store(CircuitState::Open as u8, Ordering::Release);
        tracing::warn!(
            backend = %self.name,
            failures = self.consecutive_failures(),
            reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
            error = %error,
            "Circuit opened"
        );
    }

    /// Force the circuit closed and clear counters
    pub fn reset(&self) {
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Release);
        self.half_open_calls.store(0, Ordering::Release);
        self.half_open_successes.store(0, Ordering::Release);
    }
}
