//! # Multi-Tick Scenarios
//!
//! These tests drive a full [`Monitor`] through simulated hours of readings with a
//! fixed clock, checking which ticks post and what they say. They complement the
//! per-module unit tests in the library crate.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pegel_lib::{
    config::Config,
    dispatch::{Delivery, DispatchError, Dispatcher},
    monitor::{DispatchStatus, Monitor, MonitorSettings, TickOutcome},
    source::{GaugeReading, LevelSource, SourceError},
    Assessment, Notification, ScheduledKind, Scheduler, SchedulerPolicy, Tendency,
};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};
use tempfile::NamedTempFile;

/// Gauge fake that hands out one level string per fetch.
struct Replay {
    levels: Mutex<VecDeque<String>>,
}

impl Replay {
    fn new(levels: &[&str]) -> Self {
        Replay {
            levels: Mutex::new(levels.iter().map(|s| s.to_string()).collect()),
        }
    }
}

impl LevelSource for Replay {
    async fn fetch(&self) -> Result<GaugeReading, SourceError> {
        let next = self.levels.lock().unwrap().pop_front();
        next.map(|level| GaugeReading {
            level,
            date: None,
            time: None,
        })
        .ok_or(SourceError::MissingField("Pegel"))
    }
}

/// Dispatcher whose platform is permanently down.
struct Broken {
    calls: AtomicUsize,
}

impl Dispatcher for &Broken {
    async fn dispatch(&self, _text: &str) -> Result<Delivery, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DispatchError::Rejected {
            status: 500,
            body: "down".to_string(),
        })
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 5, 6, 0, 0).unwrap()
}

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Test a rising river over sixteen hourly polls with slogan pools configured.
///
/// The event trigger keeps firing while the rise is still inside the window,
/// even once the newest two readings are equal, and the scheduled trigger only
/// returns one cooldown after the last event post.
#[test]
fn rising_river_over_sixteen_hours() {
    let up = write_file("Land unter!\n");
    let equal = write_file("Alles im Fluss.\n");
    let config_toml = format!(
        r#"
[gauge]
url = "http://gauge.invalid/pegel.xml"

[scheduler]
window_size = 5
min_change_cm = 10
cooldown_hours = 6
scheduled_tendency_weight = 1.0

[messages.pools]
up = "{}"
equal = "{}"

[dispatch]
dry_run = true
"#,
        up.path().display(),
        equal.path().display()
    );
    let config_file = write_file(&config_toml);
    let config = Config::load_from_path(config_file.path()).unwrap();

    let levels = [
        "3,00", "3,00", "3,01", "3,01", "3,02", "3,15", "3,30", "3,30", "3,30", "3,30", "3,30",
        "3,30", "3,30", "3,30", "3,30", "3,30",
    ];
    let broken = Broken {
        calls: AtomicUsize::new(0),
    };
    let mut monitor = Monitor::new(
        Replay::new(&levels),
        &broken,
        config.messages.pools.clone(),
        MonitorSettings::from_config(&config),
        StdRng::seed_from_u64(1),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let outcomes: Vec<TickOutcome> = rt.block_on(async {
        let mut outcomes = Vec::new();
        for hour in 0..levels.len() as i64 {
            outcomes.push(monitor.tick(t0() + Duration::hours(hour)).await);
        }
        outcomes
    });

    let posted: Vec<(usize, Notification)> = outcomes
        .iter()
        .enumerate()
        .filter_map(|(hour, outcome)| match outcome {
            TickOutcome::Notified {
                notification,
                status,
                ..
            } => {
                assert_eq!(*status, DispatchStatus::DryRun);
                Some((hour, *notification))
            }
            _ => None,
        })
        .collect();

    assert_eq!(outcomes[0], TickOutcome::Warming { samples: 1 });
    assert_eq!(
        posted,
        vec![
            (1, Notification::Scheduled(ScheduledKind::TendencyReport(Tendency::Equal))),
            (5, Notification::Tendency(Tendency::Up)),
            (6, Notification::Tendency(Tendency::Up)),
            (7, Notification::Tendency(Tendency::Equal)),
            (8, Notification::Tendency(Tendency::Equal)),
            (9, Notification::Tendency(Tendency::Equal)),
            (15, Notification::Scheduled(ScheduledKind::TendencyReport(Tendency::Equal))),
        ]
    );
    assert_eq!(
        outcomes[10],
        TickOutcome::Quiet {
            tendency: Tendency::Equal,
            variance: 0
        }
    );

    // Dry-run never reaches the dispatcher
    assert_eq!(broken.calls.load(Ordering::SeqCst), 0);

    match &outcomes[5] {
        TickOutcome::Notified { text, .. } => assert_eq!(
            text,
            "Land unter! Achtung, der Rhein beginnt zu steigen! Derzeit liegt der Pegel bei 3.15 m #koeln #rhein"
        ),
        other => panic!("expected a post at hour 5, got {:?}", other),
    }
}

/// Test that a jump of more than `min_change_cm` against the oldest retained
/// reading posts immediately, even though the cooldown has not elapsed.
#[test]
fn threshold_breach_overrides_cooldown() {
    let levels = ["1,00", "1,00", "1,00", "1,00", "1,00", "1,15"];
    let broken = Broken {
        calls: AtomicUsize::new(0),
    };
    let mut config = Config::default();
    config.scheduler.min_change_cm = 10;
    config.scheduler.window_size = 5;

    let mut monitor = Monitor::new(
        Replay::new(&levels),
        &broken,
        config.messages.pools.clone(),
        MonitorSettings::from_config(&config),
        StdRng::seed_from_u64(3),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let (before, last) = rt.block_on(async {
        for minute in 0..5 {
            monitor.tick(t0() + Duration::minutes(minute)).await;
        }
        let before = monitor.scheduler().state().last_notification;
        (before, monitor.tick(t0() + Duration::minutes(5)).await)
    });

    // Minute one posted a scheduled message, so the cooldown was still running
    assert_eq!(before, Some(t0() + Duration::minutes(1)));
    assert!(matches!(
        last,
        TickOutcome::Notified {
            notification: Notification::Tendency(Tendency::Up),
            ..
        }
    ));
    assert_eq!(
        monitor.scheduler().state().last_notification,
        Some(t0() + Duration::minutes(5))
    );
}

/// Test that a platform outage does not turn into a post on every tick.
///
/// Failed posts reset the cooldown just like successful ones, so with flat
/// readings the broken dispatcher is tried once per cooldown period only.
#[test]
fn failed_posts_still_respect_cooldown() {
    let levels = ["2,50"; 13];
    let broken = Broken {
        calls: AtomicUsize::new(0),
    };
    let mut config = Config::default();
    config.dispatch.dry_run = false;
    config.scheduler.cooldown_hours = 6;

    let mut monitor = Monitor::new(
        Replay::new(&levels),
        &broken,
        config.messages.pools.clone(),
        MonitorSettings::from_config(&config),
        StdRng::seed_from_u64(5),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let failed_hours: Vec<i64> = rt.block_on(async {
        let mut hours = Vec::new();
        for hour in 0..levels.len() as i64 {
            let outcome = monitor.tick(t0() + Duration::hours(hour)).await;
            if let TickOutcome::Notified { status, .. } = outcome {
                assert_eq!(status, DispatchStatus::Failed);
                hours.push(hour);
            }
        }
        hours
    });

    assert_eq!(failed_hours, vec![1, 7]);
    assert_eq!(broken.calls.load(Ordering::SeqCst), 2);
}

/// Test that the scheduled sub-kind split converges to the configured ratio.
#[test]
fn scheduled_split_converges_to_weight() {
    let mut scheduler = Scheduler::new(SchedulerPolicy {
        min_change_cm: 10_000,
        cooldown: Duration::hours(6),
        scheduled_tendency_weight: 0.8,
    });
    let assessment = Assessment::Ready {
        newest: 250,
        tendency: Tendency::Down,
        variance: 4,
    };
    let mut rng = StdRng::seed_from_u64(2024);

    let trials = 1000;
    let mut reports = 0;
    let mut now = t0();
    for _ in 0..trials {
        match scheduler.decide(&assessment, now, &mut rng) {
            Some(Notification::Scheduled(ScheduledKind::TendencyReport(_))) => reports += 1,
            Some(Notification::Scheduled(ScheduledKind::UnitConversion)) => {}
            other => panic!("expected a scheduled notification, got {:?}", other),
        }
        scheduler.commit(now);
        now += Duration::hours(6);
    }

    let share = reports as f64 / trials as f64;
    assert!(
        (0.74..=0.86).contains(&share),
        "tendency report share {} should be close to 0.8",
        share
    );
}
