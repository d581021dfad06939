/*
 *  events/timer.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Repeating or counted interval timer
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::time::{Duration, Instant};

/// Interval timer, optionally capped at a number of firings.
///
/// `check()` returns true exactly once per due firing. Invoking whatever
/// the timer guards is the caller's job.
#[derive(Debug, Clone)]
pub struct Timer {
    interval: Duration,
    max_count: Option<u32>,
    next_fire: Option<Instant>,
    count: u32,
}

impl Timer {
    /// First firing is due one `interval` after `now`.
    /// A `max_count` of zero, or an interval beyond what an `Instant` can
    /// reach, yields a timer that never fires.
    pub fn new(interval: Duration, max_count: Option<u32>, now: Instant) -> Self {
        let next_fire = match max_count {
            Some(0) => None,
            _ => now.checked_add(interval),
        };
        Self { interval, max_count, next_fire, count: 0 }
    }

    pub fn is_active(&self) -> bool {
        self.next_fire.is_some()
    }

    /// Number of firings so far
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn check(&mut self, now: Instant) -> bool {
        let Some(next) = self.next_fire else {
            return false;
        };
        if now < next {
            return false;
        }
        self.count += 1;
        self.next_fire = match self.max_count {
            Some(max) if self.count >= max => None,
            _ => now.checked_add(self.interval),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_not_due_before_interval() {
        let t0 = Instant::now();
        let mut timer = Timer::new(secs(1.0), None, t0);
        assert!(!timer.check(t0));
        assert!(!timer.check(t0 + secs(0.999)));
        assert!(timer.check(t0 + secs(1.0)));
        assert_eq!(timer.count(), 1);
    }

    #[test]
    fn test_reschedules_from_check_time() {
        let t0 = Instant::now();
        let mut timer = Timer::new(secs(1.0), None, t0);
        // late check pushes the next firing out from the late time
        assert!(timer.check(t0 + secs(1.5)));
        assert!(!timer.check(t0 + secs(2.0)));
        assert!(timer.check(t0 + secs(2.5)));
    }

    #[test]
    fn test_max_count_exhausts() {
        let t0 = Instant::now();
        let mut timer = Timer::new(secs(1.0), Some(2), t0);
        assert!(timer.check(t0 + secs(1.0)));
        assert!(timer.is_active());
        assert!(timer.check(t0 + secs(2.0)));
        assert!(!timer.is_active());
        assert!(!timer.check(t0 + secs(10.0)));
        assert_eq!(timer.count(), 2);
    }

    #[test]
    fn test_zero_max_count_is_inactive() {
        let t0 = Instant::now();
        let mut timer = Timer::new(secs(1.0), Some(0), t0);
        assert!(!timer.is_active());
        assert!(!timer.check(t0 + secs(5.0)));
    }

    #[test]
    fn test_unreachable_interval_never_fires() {
        let t0 = Instant::now();
        let mut timer = Timer::new(Duration::MAX, None, t0);
        assert!(!timer.is_active());
        assert!(!timer.check(t0));
        assert!(!timer.check(t0 + secs(1e6)));
        assert_eq!(timer.count(), 0);
    }

    #[test]
    fn test_one_shot() {
        let t0 = Instant::now();
        let mut timer = Timer::new(secs(3.0), Some(1), t0);
        assert!(timer.check(t0 + secs(3.0)));
        assert!(!timer.is_active());
    }

    proptest! {
        #[test]
        fn test_fires_at_most_once_per_interval(
            interval_ms in 1u64..500,
            steps in proptest::collection::vec(0u64..200, 1..200),
        ) {
            let t0 = Instant::now();
            let interval = Duration::from_millis(interval_ms);
            let mut timer = Timer::new(interval, None, t0);
            let mut now = t0;
            let mut last_fire: Option<Instant> = None;
            for step in steps {
                now += Duration::from_millis(step);
                if timer.check(now) {
                    if let Some(prev) = last_fire {
                        prop_assert!(now - prev >= interval);
                    } else {
                        prop_assert!(now - t0 >= interval);
                    }
                    last_fire = Some(now);
                }
            }
            prop_assert!(timer.is_active());
        }

        #[test]
        fn test_never_exceeds_max_count(max in 1u32..10, checks in 1usize..50) {
            let t0 = Instant::now();
            let mut timer = Timer::new(Duration::from_millis(10), Some(max), t0);
            let mut fired = 0u32;
            for i in 1..=checks {
                if timer.check(t0 + Duration::from_millis(10 * i as u64)) {
                    fired += 1;
                }
            }
            prop_assert_eq!(fired, max.min(checks as u32));
            prop_assert_eq!(timer.is_active(), (checks as u32) < max);
        }
    }
}
