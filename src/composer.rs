//! # Message Composition
//!
//! Turns a [`Notification`] plus the newest reading into post text by filling one
//! of five template shapes:
//!
//! | Notification                         | Template             |
//! |--------------------------------------|----------------------|
//! | event, up / down / equal             | `up`, `down`, `equal`|
//! | scheduled, tendency report           | `scheduled_tendency` |
//! | scheduled, unit conversion           | `unit_conversion`    |
//!
//! ## Placeholders
//! - `{level}`: level in meters with two decimals (`3.45`)
//! - `{cm}`: level in centimeters
//! - `{tendency}`: the configured label for the current tendency
//! - `{units}`: `floor(cm / unit_size_cm)`, the level in Kölsch glasses by default
//!
//! A slogan picked from the tendency's message pool may be prefixed to the text.
//! Picking it is the job of [`crate::slogans`]; this module only names the pool
//! through [`Composer::pool_for`].

use crate::{
    measurement::format_meters,
    scheduler::{Notification, ScheduledKind},
    tendency::Tendency,
    Measurement,
};
use serde::{Deserialize, Serialize};

/// Height of a Kölsch glass ("Stange") in centimeters.
pub const DEFAULT_UNIT_SIZE_CM: i64 = 15;

/// Template text for every notification shape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Templates {
    pub up: String,
    pub down: String,
    pub equal: String,
    pub scheduled_tendency: String,
    pub unit_conversion: String,
    /// Labels substituted for `{tendency}`
    pub label_up: String,
    pub label_down: String,
    pub label_equal: String,
}

impl Default for Templates {
    fn default() -> Self {
        Templates {
            up: "Achtung, der Rhein beginnt zu steigen! Derzeit liegt der Pegel bei {level} m #koeln #rhein"
                .to_string(),
            down: "Der Rheinpegel sinkt! Derzeit liegen wir bei {level} m #koeln #rhein".to_string(),
            equal: "Alles ruhig. Der Rheinpegel bleibt derzeit bei {level} m #koeln #rhein"
                .to_string(),
            scheduled_tendency:
                "Der Rheinpegel liegt derzeit bei {level} m, Tendenz {tendency}. #koeln #rhein"
                    .to_string(),
            unit_conversion:
                "Der Rheinpegel ist derzeit {level} m, das sind {units} Kölschstangen #koeln #rhein"
                    .to_string(),
            label_up: "steigend".to_string(),
            label_down: "fallend".to_string(),
            label_equal: "gleichbleibend".to_string(),
        }
    }
}

impl Templates {
    fn event(&self, tendency: Tendency) -> &str {
        match tendency {
            Tendency::Up => &self.up,
            Tendency::Down => &self.down,
            Tendency::Equal => &self.equal,
        }
    }

    fn label(&self, tendency: Tendency) -> &str {
        match tendency {
            Tendency::Up => &self.label_up,
            Tendency::Down => &self.label_down,
            Tendency::Equal => &self.label_equal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Composer {
    templates: Templates,
    unit_size_cm: i64,
}

impl Composer {
    /// Non-positive unit sizes fall back to [`DEFAULT_UNIT_SIZE_CM`].
    pub fn new(templates: Templates, unit_size_cm: i64) -> Self {
        let unit_size_cm = if unit_size_cm > 0 {
            unit_size_cm
        } else {
            DEFAULT_UNIT_SIZE_CM
        };
        Self {
            templates,
            unit_size_cm,
        }
    }

    /// Whole units contained in `cm`, rounded down.
    pub fn units(&self, cm: Measurement) -> i64 {
        cm.div_euclid(self.unit_size_cm)
    }

    /// Message pool a slogan should come from, if this notification takes one.
    pub fn pool_for(notification: &Notification) -> Option<Tendency> {
        notification.tendency()
    }

    pub fn compose(
        &self,
        notification: &Notification,
        newest_cm: Measurement,
        slogan: Option<&str>,
    ) -> String {
        let (template, tendency) = match *notification {
            Notification::Tendency(t) => (self.templates.event(t), Some(t)),
            Notification::Scheduled(ScheduledKind::TendencyReport(t)) => {
                (self.templates.scheduled_tendency.as_str(), Some(t))
            }
            Notification::Scheduled(ScheduledKind::UnitConversion) => {
                (self.templates.unit_conversion.as_str(), None)
            }
        };

        let mut body = template
            .replace("{level}", &format_meters(newest_cm))
            .replace("{cm}", &newest_cm.to_string())
            .replace("{units}", &self.units(newest_cm).to_string());
        if let Some(t) = tendency {
            body = body.replace("{tendency}", self.templates.label(t));
        }

        match slogan.map(str::trim).filter(|s| !s.is_empty()) {
            Some(slogan) => format!("{} {}", slogan, body),
            None => body,
        }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(Templates::default(), DEFAULT_UNIT_SIZE_CM)
    }
}
