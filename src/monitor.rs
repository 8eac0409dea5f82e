//! # Polling Loop
//!
//! [`Monitor`] owns everything that changes over the lifetime of the process: the
//! rolling [`History`], the [`Scheduler`] state and the random source. One call to
//! [`Monitor::tick`] is one poll cycle:
//!
//! 1. **Fetch** the raw reading from the [`LevelSource`]
//! 2. **Normalize** it to centimeters and push it into the history
//! 3. **Assess** tendency and window variance
//! 4. **Decide** whether to post
//! 5. **Compose** the text, optionally with a slogan
//! 6. **Deliver** through the [`Dispatcher`] and commit the timestamp
//!
//! Fetch and parse failures end the tick early without touching the history;
//! the next tick simply tries again. Delivery failures are logged and still
//! commit, see [`crate::scheduler`].
//!
//! [`Monitor::run`] repeats ticks until the shutdown future resolves. Shutdown is
//! only observed while sleeping, never in the middle of a tick.

use crate::{
    composer::Composer,
    config::Config,
    dispatch::{deliver, Delivery, Dispatcher},
    history::History,
    measurement::{format_meters, parse_level_cm, ParseError},
    scheduler::{Notification, Scheduler, SchedulerPolicy},
    slogans::SloganSource,
    source::LevelSource,
    tendency::Tendency,
    variance::{assess, Assessment},
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a delivery attempt as seen by the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Posted,
    DryRun,
    Failed,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The gauge could not be reached or its document was unusable
    FetchFailed,
    /// The level string was rejected; history untouched
    ParseFailed(ParseError),
    /// Fewer than two readings so far
    Warming { samples: usize },
    /// Nothing to post
    Quiet { tendency: Tendency, variance: u64 },
    Notified {
        notification: Notification,
        text: String,
        status: DispatchStatus,
    },
}

/// Static knobs for a [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub window_size: usize,
    pub policy: SchedulerPolicy,
    pub composer: Composer,
    pub dry_run: bool,
    pub dispatch_timeout: Duration,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        MonitorSettings {
            window_size: config.scheduler.window_size,
            policy: config.scheduler_policy(),
            composer: Composer::new(
                config.messages.templates.clone(),
                config.scheduler.unit_size_cm,
            ),
            dry_run: config.dispatch.dry_run,
            dispatch_timeout: config.dispatch_timeout(),
        }
    }
}

pub struct Monitor<S, D, P> {
    source: S,
    dispatcher: D,
    slogans: P,
    history: History,
    scheduler: Scheduler,
    composer: Composer,
    rng: StdRng,
    dry_run: bool,
    dispatch_timeout: Duration,
}

impl<S, D, P> Monitor<S, D, P>
where
    S: LevelSource,
    D: Dispatcher,
    P: SloganSource,
{
    pub fn new(
        source: S,
        dispatcher: D,
        slogans: P,
        settings: MonitorSettings,
        rng: StdRng,
    ) -> Self {
        Monitor {
            source,
            dispatcher,
            slogans,
            history: History::new(settings.window_size),
            scheduler: Scheduler::new(settings.policy),
            composer: settings.composer,
            rng,
            dry_run: settings.dry_run,
            dispatch_timeout: settings.dispatch_timeout,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run one poll cycle at `now`.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let reading = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, "gauge fetch failed, retrying next tick");
                return TickOutcome::FetchFailed;
            }
        };

        let level_cm = match parse_level_cm(&reading.level) {
            Ok(cm) => cm,
            Err(e) => {
                warn!(error = %e, raw = %reading.level, "rejected gauge reading");
                return TickOutcome::ParseFailed(e);
            }
        };

        info!(
            raw = %reading.level,
            cm = level_cm,
            date = reading.date.as_deref().unwrap_or("-"),
            time = reading.time.as_deref().unwrap_or("-"),
            "gauge reading"
        );
        self.history.push(level_cm);

        let assessment = assess(&self.history);
        let (tendency, variance) = match assessment {
            Assessment::Insufficient { samples } => {
                info!(samples, "not enough history yet, staying quiet");
                return TickOutcome::Warming { samples };
            }
            Assessment::Ready {
                tendency, variance, ..
            } => (tendency, variance),
        };
        debug!(
            history = ?self.history.iter().collect::<Vec<_>>(),
            %tendency,
            variance,
            "assessed window"
        );

        let Some(notification) = self.scheduler.decide(&assessment, now, &mut self.rng) else {
            debug!(%tendency, variance, "no trigger fired");
            return TickOutcome::Quiet { tendency, variance };
        };
        info!(%notification, %tendency, variance, "notification triggered");

        let slogan = self.pick_slogan(&notification);
        let text = self
            .composer
            .compose(&notification, level_cm, slogan.as_deref());

        let delivery = deliver(
            &self.dispatcher,
            &text,
            self.dry_run,
            self.dispatch_timeout,
        )
        .await;
        let status = match delivery {
            Ok(Delivery::Posted { url }) => {
                info!(url = url.as_deref().unwrap_or("-"), %text, "posted");
                DispatchStatus::Posted
            }
            Ok(Delivery::DryRun) => DispatchStatus::DryRun,
            Err(e) => {
                error!(error = %e, %text, "posting failed");
                DispatchStatus::Failed
            }
        };

        // Committed whatever the delivery outcome
        self.scheduler.commit(now);

        TickOutcome::Notified {
            notification,
            text,
            status,
        }
    }

    fn pick_slogan(&mut self, notification: &Notification) -> Option<String> {
        let tendency = Composer::pool_for(notification)?;
        match self.slogans.slogan(tendency, &mut self.rng) {
            Ok(slogan) => slogan,
            Err(e) => {
                warn!(error = %e, %tendency, "no slogan, posting without one");
                None
            }
        }
    }

    /// Tick every `interval` until `shutdown` resolves.
    pub async fn run<F>(&mut self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let outcome = self.tick(Utc::now()).await;
            debug!(?outcome, "tick finished");

            let level = self
                .history
                .newest()
                .map(format_meters)
                .unwrap_or_else(|| "-".to_string());
            info!(minutes = interval.as_secs() / 60, %level, "sleeping");
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }
    }
}
