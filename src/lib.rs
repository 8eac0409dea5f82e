//! # Pegel Tracker Core Library
//!
//! This library contains the decision engine behind the pegel tracker: it turns a
//! stream of river gauge readings into a sparse stream of "post now, and with which
//! message" decisions.
//!
//! ## Design Philosophy
//!
//! ### Integer Centimeters
//! - **No floating point in the core**: readings are normalized once into whole
//!   centimeters ([`Measurement`]) and every comparison after that is exact
//! - **Display only at the edge**: meters are formatted from centimeters by the
//!   [`composer`] when text is produced
//!
//! ### Explicit Cold Start
//! The rolling [`history::History`] reports "not enough data" instead of zero-valued
//! slots. Until two readings exist there is no tendency and no variance, and the
//! [`scheduler`] stays silent.
//!
//! ### Data Flow
//! 1. **Fetch**: [`source`] downloads the gauge document and extracts the level
//! 2. **Normalize**: [`measurement::parse_level_cm`] converts `"3,45"` into `345`
//! 3. **Assess**: [`variance::assess`] derives tendency and window variance
//! 4. **Decide**: [`scheduler::Scheduler::decide`] applies threshold and cooldown
//! 5. **Compose & dispatch**: [`composer`] renders text, [`dispatch`] posts it
//!
//! All state lives in one [`monitor::Monitor`] owned by the polling loop.

pub mod composer;
pub mod config;
pub mod dispatch;
pub mod history;
pub mod logging;
pub mod measurement;
pub mod monitor;
pub mod scheduler;
pub mod slogans;
pub mod source;
pub mod tendency;
pub mod variance;

/// A single water level reading in whole centimeters.
///
/// Produced once per poll cycle by [`measurement::parse_level_cm`]. Negative
/// values are rejected during normalization, so anything stored in a
/// [`history::History`] is a plausible gauge level.
///
/// # Example
/// ```
/// use pegel_lib::{measurement::parse_level_cm, Measurement};
///
/// let level: Measurement = parse_level_cm("3,45").unwrap();
/// assert_eq!(level, 345);
/// ```
pub type Measurement = i64;

pub use history::History;
pub use scheduler::{Notification, ScheduledKind, Scheduler, SchedulerPolicy, SchedulerState};
pub use tendency::Tendency;
pub use variance::Assessment;
