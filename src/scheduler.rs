//! # Notification Scheduling
//!
//! Decides, once per poll tick, whether a notification goes out and which kind.
//! Two triggers are evaluated in priority order:
//!
//! 1. **Event trigger**: the window variance exceeds `min_change_cm`. Fires a
//!    [`Notification::Tendency`] regardless of the cooldown, so a fast-moving
//!    river can produce posts more often than the schedule would allow.
//! 2. **Scheduled trigger**: the cooldown has elapsed since the last
//!    notification. Fires a [`Notification::Scheduled`] whose sub-kind is drawn
//!    by weighted coin flip between a tendency report and a unit conversion.
//!
//! Neither trigger fires while the [`Assessment`] is still
//! [`Assessment::Insufficient`].
//!
//! ## Commit Point
//! [`Scheduler::decide`] is pure. The caller records the notification with
//! [`Scheduler::commit`] right after the dispatch attempt returns, whether
//! delivery succeeded, failed, or was suppressed by dry-run. A failed post
//! therefore still resets the cooldown and the loop never hammers a broken
//! endpoint every tick.
//!
//! ## Clock injection
//! `now` is always passed in, never read from the system clock here.

use crate::{tendency::Tendency, variance::Assessment};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::fmt;

/// Share of scheduled notifications that report the tendency.
pub const DEFAULT_TENDENCY_WEIGHT: f64 = 0.8;

/// Flavor of a cooldown-driven notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledKind {
    /// Current level plus the current tendency
    TendencyReport(Tendency),
    /// Current level expressed in a whimsical unit
    UnitConversion,
}

/// A decision to notify, carrying what the composer needs to pick a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Event-triggered: the level moved more than the threshold within the window
    Tendency(Tendency),
    /// Cooldown-triggered
    Scheduled(ScheduledKind),
}

impl Notification {
    /// Tendency the message talks about, if any.
    pub fn tendency(&self) -> Option<Tendency> {
        match self {
            Notification::Tendency(t)
            | Notification::Scheduled(ScheduledKind::TendencyReport(t)) => Some(*t),
            Notification::Scheduled(ScheduledKind::UnitConversion) => None,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Notification::Tendency(_))
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Tendency(t) => write!(f, "event/{}", t),
            Notification::Scheduled(ScheduledKind::TendencyReport(t)) => {
                write!(f, "scheduled/tendency/{}", t)
            }
            Notification::Scheduled(ScheduledKind::UnitConversion) => {
                write!(f, "scheduled/unit-conversion")
            }
        }
    }
}

/// Thresholds the scheduler applies. Read-only for the scheduler itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerPolicy {
    /// Event trigger fires when the window variance is strictly above this
    pub min_change_cm: u64,
    /// Minimum time between scheduled notifications
    pub cooldown: Duration,
    /// Probability that a scheduled notification is a tendency report
    pub scheduled_tendency_weight: f64,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            min_change_cm: 10,
            cooldown: Duration::hours(6),
            scheduled_tendency_weight: DEFAULT_TENDENCY_WEIGHT,
        }
    }
}

/// Mutable scheduling state, owned by the polling loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerState {
    /// `None` until the first notification; counts as "cooldown elapsed".
    pub last_notification: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    policy: SchedulerPolicy,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(policy: SchedulerPolicy) -> Self {
        Self {
            policy,
            state: SchedulerState::default(),
        }
    }

    /// Resume from an existing state, e.g. a fixed clock in tests.
    pub fn with_state(policy: SchedulerPolicy, state: SchedulerState) -> Self {
        Self { policy, state }
    }

    pub fn policy(&self) -> &SchedulerPolicy {
        &self.policy
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Whether at least `cooldown` has passed since the last notification.
    pub fn cooldown_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_notification {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.policy.cooldown,
        }
    }

    /// Decide whether to notify this tick. Does not touch the state.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        assessment: &Assessment,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<Notification> {
        let Assessment::Ready {
            tendency, variance, ..
        } = *assessment
        else {
            return None;
        };

        if variance > self.policy.min_change_cm {
            return Some(Notification::Tendency(tendency));
        }

        if !self.cooldown_elapsed(now) {
            return None;
        }

        let weight = self.policy.scheduled_tendency_weight;
        let weight = if (0.0..=1.0).contains(&weight) {
            weight
        } else {
            DEFAULT_TENDENCY_WEIGHT
        };

        let kind = if rng.gen_bool(weight) {
            ScheduledKind::TendencyReport(tendency)
        } else {
            ScheduledKind::UnitConversion
        };
        Some(Notification::Scheduled(kind))
    }

    /// Record that a notification was attempted at `now`.
    pub fn commit(&mut self, now: DateTime<Utc>) {
        self.state.last_notification = Some(now);
    }
}
