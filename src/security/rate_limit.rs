//! Multi-level sliding-window admission control.
//!
//! # Admission transaction
//! ```text
//! lock
//!   → sweep: drop records older than each level's window
//!   → check: every level must admit (no mutation)
//!   → commit: create or bump the caller's record in every level
//! unlock
//! ```
//!
//! A rejection from any level aborts before the commit, so no level is
//! charged for a call another level refused. The whole sequence runs under
//! one lock and never touches the network or disk.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::config::LimitLevelConfig;

/// Calls seen from one caller within one level's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRecord {
    /// Unix seconds of the first call in the window.
    pub created_at: u64,
    pub call_count: u32,
}

/// One admission policy and the callers it is currently tracking.
#[derive(Debug)]
struct LimitLevel {
    policy: LimitLevelConfig,
    lookup: HashMap<String, CallRecord>,
}

impl LimitLevel {
    fn sweep(&mut self, now: u64) {
        let expired = now.saturating_sub(self.policy.window_secs);
        self.lookup.retain(|_, record| record.created_at >= expired);
    }

    fn check(&self, caller: &str) -> Result<(), Rejection> {
        match self.lookup.get(caller) {
            Some(record) if record.call_count >= self.policy.max_calls_per_caller => {
                Err(Rejection::TooManyCalls {
                    caller: caller.to_string(),
                    calls: record.call_count,
                    window_secs: self.policy.window_secs,
                })
            }
            Some(_) => Ok(()),
            None if self.lookup.len() >= self.policy.max_total_callers => {
                Err(Rejection::OverCapacity {
                    total: self.lookup.len(),
                    window_secs: self.policy.window_secs,
                })
            }
            None => Ok(()),
        }
    }

    fn commit(&mut self, caller: &str, now: u64) -> LevelUsage {
        let record = self
            .lookup
            .entry(caller.to_string())
            .and_modify(|r| r.call_count += 1)
            .or_insert(CallRecord {
                created_at: now,
                call_count: 1,
            });
        let caller_calls = record.call_count;
        self.usage(caller_calls)
    }

    fn usage(&self, caller_calls: u32) -> LevelUsage {
        LevelUsage {
            window_secs: self.policy.window_secs,
            caller_calls,
            max_calls_per_caller: self.policy.max_calls_per_caller,
            total_callers: self.lookup.len(),
            max_total_callers: self.policy.max_total_callers,
        }
    }
}

/// Why the limiter refused a call. Names the first level that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// No room for another distinct caller in this window.
    #[error("already have {total} total callers within the last {window_secs} seconds")]
    OverCapacity { total: usize, window_secs: u64 },

    /// A known caller has used up their quota for this window.
    #[error("already had {calls} individual calls from {caller} within the last {window_secs} seconds")]
    TooManyCalls {
        caller: String,
        calls: u32,
        window_secs: u64,
    },
}

/// A caller's standing in one level, as of the last admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUsage {
    pub window_secs: u64,
    pub caller_calls: u32,
    pub max_calls_per_caller: u32,
    pub total_callers: usize,
    pub max_total_callers: usize,
}

impl fmt::Display for LevelUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-second window has {}/{} individual calls and {}/{} total unique callers",
            self.window_secs,
            self.caller_calls,
            self.max_calls_per_caller,
            self.total_callers,
            self.max_total_callers
        )
    }
}

/// Process-wide admission state shared by every request.
#[derive(Debug)]
pub struct RateLimiter {
    levels: Mutex<Vec<LimitLevel>>,
}

impl RateLimiter {
    pub fn new(policies: &[LimitLevelConfig]) -> Self {
        let levels = policies
            .iter()
            .map(|&policy| LimitLevel {
                policy,
                lookup: HashMap::new(),
            })
            .collect();
        Self {
            levels: Mutex::new(levels),
        }
    }

    /// Run one admission transaction for `caller` at unix time `now`.
    ///
    /// On success the caller has been charged one call in every level and
    /// the returned usage reflects that. On rejection nothing was charged.
    pub fn admit(&self, caller: &str, now: u64) -> Result<Vec<LevelUsage>, Rejection> {
        // Nothing in the transaction can panic part-way through a commit,
        // so a poisoned lock still guards consistent state.
        let mut levels = self.levels.lock().unwrap_or_else(PoisonError::into_inner);

        for level in levels.iter_mut() {
            level.sweep(now);
        }

        for level in levels.iter() {
            level.check(caller)?;
        }

        Ok(levels
            .iter_mut()
            .map(|level| level.commit(caller, now))
            .collect())
    }

    /// Current standing of `caller` in every level, without sweeping.
    pub fn usage(&self, caller: &str) -> Vec<LevelUsage> {
        let levels = self.levels.lock().unwrap_or_else(PoisonError::into_inner);
        levels
            .iter()
            .map(|level| {
                let calls = level.lookup.get(caller).map_or(0, |r| r.call_count);
                level.usage(calls)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(window_secs: u64, max_calls_per_caller: u32, max_total_callers: usize) -> LimitLevelConfig {
        LimitLevelConfig {
            window_secs,
            max_calls_per_caller,
            max_total_callers,
        }
    }

    #[test]
    fn test_caller_cap_admits_exactly_m() {
        let limiter = RateLimiter::new(&[level(60, 3, 10)]);

        for i in 1..=3 {
            let usage = limiter.admit("10.0.0.1", 100).unwrap();
            assert_eq!(usage[0].caller_calls, i);
        }

        let err = limiter.admit("10.0.0.1", 100).unwrap_err();
        assert_eq!(
            err,
            Rejection::TooManyCalls {
                caller: "10.0.0.1".into(),
                calls: 3,
                window_secs: 60,
            }
        );
    }

    #[test]
    fn test_total_cap_rejects_new_callers_only() {
        let limiter = RateLimiter::new(&[level(60, 100, 2)]);

        assert!(limiter.admit("a", 0).is_ok());
        assert!(limiter.admit("b", 0).is_ok());

        assert_eq!(
            limiter.admit("c", 1),
            Err(Rejection::OverCapacity {
                total: 2,
                window_secs: 60,
            })
        );

        // Known callers keep going while the level is full.
        assert!(limiter.admit("a", 2).is_ok());
        assert!(limiter.admit("b", 2).is_ok());
    }

    #[test]
    fn test_expired_record_is_dropped() {
        let limiter = RateLimiter::new(&[level(60, 1, 1)]);

        assert!(limiter.admit("a", 0).is_ok());
        assert!(limiter.admit("a", 30).is_err());
        assert!(limiter.admit("b", 30).is_err());

        let usage = limiter.admit("a", 61).unwrap();
        assert_eq!(usage[0].caller_calls, 1);
        assert_eq!(usage[0].total_callers, 1);
    }

    #[test]
    fn test_record_kept_at_window_boundary() {
        let limiter = RateLimiter::new(&[level(60, 1, 10)]);

        assert!(limiter.admit("a", 1000).is_ok());
        assert!(limiter.admit("a", 1060).is_err());
        assert!(limiter.admit("a", 1061).is_ok());
    }

    #[test]
    fn test_rejection_leaves_other_levels_untouched() {
        // Level A would admit, level B is already full.
        let limiter = RateLimiter::new(&[level(60, 10, 10), level(3600, 10, 1)]);
        assert!(limiter.admit("first", 0).is_ok());

        let before = limiter.usage("second");
        assert_eq!(before[0].total_callers, 1);

        let err = limiter.admit("second", 5).unwrap_err();
        assert!(matches!(err, Rejection::OverCapacity { window_secs: 3600, .. }));

        let after = limiter.usage("second");
        assert_eq!(before, after);
        assert_eq!(after[0].caller_calls, 0);
        assert_eq!(after[0].total_callers, 1);
    }

    #[test]
    fn test_first_failing_level_is_reported() {
        let limiter = RateLimiter::new(&[level(60, 1, 10), level(3600, 1, 10)]);
        assert!(limiter.admit("a", 0).is_ok());

        match limiter.admit("a", 1) {
            Err(Rejection::TooManyCalls { window_secs, .. }) => assert_eq!(window_secs, 60),
            other => panic!("unexpected admission result: {:?}", other),
        }
    }

    #[test]
    fn test_long_window_outlives_short_one() {
        let limiter = RateLimiter::new(&[level(60, 5, 10), level(86_400, 2, 10)]);

        assert!(limiter.admit("a", 0).is_ok());
        assert!(limiter.admit("a", 120).is_ok());

        // Short window expired and restarted; long window kept counting.
        let usage = limiter.usage("a");
        assert_eq!(usage[0].caller_calls, 1);
        assert_eq!(usage[1].caller_calls, 2);

        assert!(matches!(
            limiter.admit("a", 240),
            Err(Rejection::TooManyCalls { window_secs: 86_400, .. })
        ));
    }

    #[test]
    fn test_usage_summary_text() {
        let limiter = RateLimiter::new(&[level(60, 25, 5)]);
        let usage = limiter.admit("a", 0).unwrap();
        assert_eq!(
            usage[0].to_string(),
            "60-second window has 1/25 individual calls and 1/5 total unique callers"
        );
    }
}
