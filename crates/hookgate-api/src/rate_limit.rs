//! In-process request rate limiting.
//!
//! Counts requests in fixed windows for two scopes: all callers together
//! and each caller address on its own. The middleware consults the limiter
//! before any signature or origin work runs.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use hookgate_core::Clock;

/// Scope a limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScope<'a> {
    /// Every request regardless of caller.
    Global,
    /// Requests from one caller address.
    PerOrigin(&'a str),
}

impl RateScope<'_> {
    /// Label used in logs and rejection details.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::PerOrigin(_) => "per_origin",
        }
    }
}

/// Admission decision per scope.
///
/// Implementations own their counter consistency under concurrent calls.
pub trait RateLimiter: Send + Sync + fmt::Debug {
    /// Records one request against `scope` and returns whether it fits.
    fn allow(&self, scope: RateScope<'_>) -> bool;
}

/// Request budgets per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    /// Requests per window across all callers.
    pub global: u32,
    /// Requests per window from one caller.
    pub per_origin: u32,
    /// Window length.
    pub window: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    const fn new(now: Instant) -> Self {
        Self { started: now, count: 0 }
    }

    fn admit(&mut self, now: Instant, length: Duration, limit: u32) -> bool {
        if now.saturating_duration_since(self.started) >= length {
            *self = Self::new(now);
        }
        if self.count < limit {
            self.count += 1;
            true
        } else {
            false
        }
    }

    fn is_current(&self, now: Instant, length: Duration) -> bool {
        now.saturating_duration_since(self.started) < length
    }
}

#[derive(Debug)]
struct Windows {
    global: Window,
    per_origin: HashMap<String, Window>,
}

/// Fixed-window limiter keyed by scope.
///
/// Per-origin windows that have expired are pruned whenever the global
/// window rolls over, so the map only holds callers seen recently.
pub struct FixedWindowRateLimiter {
    limits: RateLimits,
    clock: Arc<dyn Clock>,
    windows: Mutex<Windows>,
}

impl fmt::Debug for FixedWindowRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedWindowRateLimiter")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl FixedWindowRateLimiter {
    /// Creates a limiter with empty windows starting now.
    pub fn new(limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            limits,
            clock,
            windows: Mutex::new(Windows { global: Window::new(now), per_origin: HashMap::new() }),
        }
    }

    /// Configured budgets.
    pub const fn limits(&self) -> RateLimits {
        self.limits
    }

    /// Number of caller addresses currently tracked.
    pub fn tracked_origins(&self) -> usize {
        self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).per_origin.len()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn allow(&self, scope: RateScope<'_>) -> bool {
        let now = self.clock.now();
        let length = self.limits.window;
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match scope {
            RateScope::Global => {
                if !windows.global.is_current(now, length) {
                    windows.per_origin.retain(|_, window| window.is_current(now, length));
                }
                windows.global.admit(now, length, self.limits.global)
            },
            RateScope::PerOrigin(origin) => windows
                .per_origin
                .entry(origin.to_string())
                .or_insert_with(|| Window::new(now))
                .admit(now, length, self.limits.per_origin),
        }
    }
}
