//! Fixed-window rate limiter keyed by logical endpoint.
//!
//! Each key gets `points` requests per `duration`. Exhausting the budget
//! blocks the key for `block_duration` (or, when that is zero, until the
//! window ends). Rejected requests are reported, never queued.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::domain::models::RateLimitConfig;

/// Longest window or block the limiter tracks; longer periods are clamped.
pub const MAX_PERIOD: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Outcome of consuming one point for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The point was consumed
    Allowed {
        /// Points left in the current window
        remaining_points: u32,
    },
    /// The budget is exhausted or the key is blocked
    Limited {
        /// Always zero while limited
        remaining_points: u32,
        /// Milliseconds until the key may be used again
        ms_before_next: u64,
        /// Requests seen for the key in this window, rejected ones included
        total_hits: u64,
    },
}

impl RateLimitDecision {
    /// Whether the request may proceed
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Read-only view of a key's budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    /// Points left in the current window
    pub remaining_points: u32,
    /// Milliseconds until the window or block ends
    pub ms_before_next: u64,
    /// Requests seen in the current window
    pub total_hits: u64,
    /// Budget per window
    pub max_points: u32,
}

#[derive(Debug, Clone)]
struct Budget {
    points_remaining: u32,
    window_start: Instant,
    blocked_until: Option<Instant>,
    total_hits: u64,
}

impl Budget {
    const fn fresh(now: Instant, points: u32) -> Self {
        Self {
            points_remaining: points,
            window_start: now,
            blocked_until: None,
            total_hits: 0,
        }
    }

    fn window_end(&self, duration: Duration) -> Option<Instant> {
        self.window_start.checked_add(duration)
    }

    fn is_stale(&self, now: Instant, duration: Duration) -> bool {
        match self.blocked_until {
            Some(until) => now >= until,
            None => self.window_end(duration).is_some_and(|end| now >= end),
        }
    }
}

fn remaining(now: Instant, deadline: Option<Instant>) -> u64 {
    deadline.map_or(u64::MAX, |deadline| millis(deadline.saturating_duration_since(now)))
}

/// Fixed-window rate limiter shared by all requests of one API client
#[derive(Debug)]
pub struct RateLimiter {
    points: u32,
    duration: Duration,
    block_duration: Duration,
    budgets: Mutex<HashMap<String, Budget>>,
}

impl RateLimiter {
    /// Create a limiter; `duration` and `block_duration` are capped at [`MAX_PERIOD`]
    pub fn new(points: u32, duration: Duration, block_duration: Duration) -> Self {
        Self {
            points,
            duration: duration.min(MAX_PERIOD),
            block_duration: block_duration.min(MAX_PERIOD),
            budgets: Mutex::new(HashMap::new()),
        }
    }

    /// Create a limiter from the `rate_limit` config section
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.points,
            Duration::from_secs(config.duration_secs),
            Duration::from_secs(config.block_duration_secs),
        )
    }

    /// Budget per window
    pub const fn max_points(&self) -> u32 {
        self.points
    }

    /// Consume one point for `key`
    pub fn consume(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut budgets = self.budgets.lock().unwrap_or_else(PoisonError::into_inner);
        let budget = budgets
            .entry(key.to_string())
            .or_insert_with(|| Budget::fresh(now, self.points));

        if let Some(until) = budget.blocked_until {
            if now < until {
                budget.total_hits += 1;
                return RateLimitDecision::Limited {
                    remaining_points: 0,
                    ms_before_next: remaining(now, Some(until)),
                    total_hits: budget.total_hits,
                };
            }
        }

        if budget.is_stale(now, self.duration) {
            *budget = Budget::fresh(now, self.points);
        }

        budget.total_hits += 1;

        if budget.points_remaining > 0 {
            budget.points_remaining -= 1;
            return RateLimitDecision::Allowed {
                remaining_points: budget.points_remaining,
            };
        }

        let ms_before_next = if self.block_duration.is_zero() {
            remaining(now, budget.window_end(self.duration))
        } else {
            match now.checked_add(self.block_duration) {
                Some(until) => {
                    budget.blocked_until = Some(until);
                    millis(self.block_duration)
                }
                // Block end not representable; stay limited until the window ends.
                None => remaining(now, budget.window_end(self.duration)),
            }
        };

        tracing::debug!(key, ms_before_next, "rate limit exhausted");

        RateLimitDecision::Limited {
            remaining_points: 0,
            ms_before_next,
            total_hits: budget.total_hits,
        }
    }

    /// Current budget for `key` without consuming anything
    pub fn status(&self, key: &str) -> RateLimitStatus {
        let now = Instant::now();
        let budgets = self.budgets.lock().unwrap_or_else(PoisonError::into_inner);

        match budgets.get(key) {
            Some(budget) if !budget.is_stale(now, self.duration) => {
                let deadline = budget
                    .blocked_until
                    .or_else(|| budget.window_end(self.duration));
                let ms_before_next = remaining(now, deadline);
                RateLimitStatus {
                    remaining_points: budget.points_remaining,
                    ms_before_next,
                    total_hits: budget.total_hits,
                    max_points: self.points,
                }
            }
            _ => RateLimitStatus {
                remaining_points: self.points,
                ms_before_next: 0,
                total_hits: 0,
                max_points: self.points,
            },
        }
    }

    /// Drop budgets whose window or block has elapsed. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let mut budgets = self.budgets.lock().unwrap_or_else(PoisonError::into_inner);
        let before = budgets.len();
        budgets.retain(|_, budget| !budget.is_stale(now, self.duration));
        before - budgets.len()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
