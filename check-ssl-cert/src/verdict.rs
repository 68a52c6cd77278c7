use chrono::{DateTime, NaiveDate, Utc};
use nagiosplugin::{Resource, ServiceState};

use crate::CHECK_NAME;

/// Thresholds in days. Warning is expected to be greater than critical,
/// otherwise [`ServiceState::Warning`] is never reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    /// Fewer days left than this is critical
    pub critical: u32,
    /// Fewer days left than this is warning
    pub warning: u32,
}

/// Check result
#[derive(Debug, PartialEq, Eq)]
pub struct Verdict {
    /// State of certificate
    pub state: ServiceState,
    /// Human-readable sentence
    pub message: String,
}

impl Verdict {
    /// Certificate is fine
    pub fn ok<T: Into<String>>(message: T) -> Self {
        Self::new(ServiceState::Ok, message)
    }

    /// Certificate will expire soon
    pub fn warning<T: Into<String>>(message: T) -> Self {
        Self::new(ServiceState::Warning, message)
    }

    /// Certificate will expire very soon or has expired
    pub fn critical<T: Into<String>>(message: T) -> Self {
        Self::new(ServiceState::Critical, message)
    }

    fn new<T: Into<String>>(state: ServiceState, message: T) -> Self {
        Verdict {
            state,
            message: message.into(),
        }
    }

    /// Map remaining days to verdict, first match wins
    ///
    /// ```
    /// # use check_ssl_cert::{Thresholds, Verdict};
    /// use nagiosplugin::ServiceState;
    /// let thresholds = Thresholds { critical: 7, warning: 30 };
    /// assert_eq!(ServiceState::Warning, Verdict::evaluate(20, &thresholds).state);
    /// ```
    pub fn evaluate(days: i64, thresholds: &Thresholds) -> Self {
        if days < 0 {
            Verdict::critical(format!("Expired {} days ago", days.abs()))
        } else if days < i64::from(thresholds.critical) {
            Verdict::critical(format!("{days} days left"))
        } else if days < i64::from(thresholds.warning) {
            Verdict::warning(format!("{days} days left"))
        } else {
            Verdict::ok(format!("{days} days left"))
        }
    }
}

impl From<Verdict> for Resource {
    fn from(verdict: Verdict) -> Self {
        Resource::new(CHECK_NAME)
            .with_description(verdict.message)
            .with_fixed_state(verdict.state)
    }
}

/// Whole days between `today` and the UTC calendar date of `not_after`.
/// Time of day is ignored on both sides.
pub(crate) fn days_until(not_after: &DateTime<Utc>, today: NaiveDate) -> i64 {
    (not_after.date_naive() - today).num_days()
}
