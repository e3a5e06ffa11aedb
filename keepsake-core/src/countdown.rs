//! Celebration countdown toward a fixed target timestamp.
//!
//! When the target has already passed on entry the countdown switches to a
//! short fallback that completes after [`FALLBACK_COUNTDOWN_SECS`] ticks.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_COUNTDOWN_SECS;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Remaining time split into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        let total_secs = millis / 1_000;
        Self {
            days: total_secs / SECS_PER_DAY,
            hours: (total_secs / SECS_PER_HOUR) % 24,
            minutes: (total_secs / SECS_PER_MINUTE) % 60,
            seconds: total_secs % 60,
        }
    }
}

/// Time left until `target`, or `None` once the target is reached.
#[must_use]
pub fn time_left(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<TimeLeft> {
    let millis = (target - now).num_milliseconds();
    (millis > 0).then(|| TimeLeft::from_millis(millis))
}

/// What the render layer should show after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownTick {
    Remaining(TimeLeft),
    Fallback(u32),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum CountdownMode {
    Target(DateTime<Utc>),
    Fallback(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    mode: CountdownMode,
    completed: bool,
}

impl Countdown {
    /// Start counting toward `target`, or fall back when it is already past.
    #[must_use]
    pub fn start(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let mode = if time_left(target, now).is_some() {
            CountdownMode::Target(target)
        } else {
            log::debug!("countdown target {target} already passed, using fallback");
            CountdownMode::Fallback(FALLBACK_COUNTDOWN_SECS)
        };
        Self {
            mode,
            completed: false,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.mode, CountdownMode::Fallback(_))
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Current display without advancing.
    #[must_use]
    pub fn peek(&self, now: DateTime<Utc>) -> CountdownTick {
        if self.completed {
            return CountdownTick::Completed;
        }
        match self.mode {
            CountdownMode::Target(target) => {
                time_left(target, now).map_or(CountdownTick::Completed, CountdownTick::Remaining)
            }
            CountdownMode::Fallback(secs) => CountdownTick::Fallback(secs),
        }
    }

    /// Advance by one one-second tick.
    pub fn tick(&mut self, now: DateTime<Utc>) -> CountdownTick {
        if self.completed {
            return CountdownTick::Completed;
        }
        let next = match &mut self.mode {
            CountdownMode::Target(target) => {
                time_left(*target, now).map_or(CountdownTick::Completed, CountdownTick::Remaining)
            }
            CountdownMode::Fallback(secs) => {
                if *secs <= 1 {
                    *secs = 0;
                    CountdownTick::Completed
                } else {
                    *secs -= 1;
                    CountdownTick::Fallback(*secs)
                }
            }
        };
        if next == CountdownTick::Completed {
            self.completed = true;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_717_900_000 + secs, 0).unwrap()
    }

    #[test]
    fn time_left_splits_units() {
        let target = at(2 * SECS_PER_DAY + 3 * SECS_PER_HOUR + 4 * SECS_PER_MINUTE + 5);
        let left = time_left(target, at(0)).unwrap();
        assert_eq!(
            left,
            TimeLeft {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5
            }
        );
        assert!(time_left(at(0), at(0)).is_none());
        assert!(time_left(at(0), at(1)).is_none());
    }

    #[test]
    fn past_target_completes_after_ten_ticks() {
        let mut countdown = Countdown::start(at(-30), at(0));
        assert!(countdown.is_fallback());
        assert_eq!(countdown.peek(at(0)), CountdownTick::Fallback(10));
        for expected in (1..10).rev() {
            assert_eq!(countdown.tick(at(0)), CountdownTick::Fallback(expected));
        }
        assert!(!countdown.is_completed());
        assert_eq!(countdown.tick(at(0)), CountdownTick::Completed);
        assert!(countdown.is_completed());
        assert_eq!(countdown.tick(at(0)), CountdownTick::Completed);
    }

    #[test]
    fn target_countdown_completes_when_reached() {
        let mut countdown = Countdown::start(at(3), at(0));
        assert!(!countdown.is_fallback());
        assert!(matches!(
            countdown.tick(at(1)),
            CountdownTick::Remaining(TimeLeft { seconds: 2, .. })
        ));
        assert!(matches!(countdown.tick(at(2)), CountdownTick::Remaining(_)));
        assert_eq!(
            countdown.tick(at(3) + Duration::milliseconds(1)),
            CountdownTick::Completed
        );
        assert!(countdown.is_completed());
    }
}
