use crate::state::SessionState;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Threshold used when nothing else is configured (the 20-20-20 rule)
pub const DEFAULT_BREAK_THRESHOLD: Duration = Duration::from_secs(20 * 60);

/// Age group used to personalize break reminders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBracket {
    /// Under 13
    Child,
    /// 13 to 17
    Teen,
    /// 18 and over
    Adult,
}

impl AgeBracket {
    /// Determine bracket from age in whole years
    #[must_use]
    pub const fn from_age(years: u32) -> Self {
        match years {
            0..=12 => Self::Child,
            13..=17 => Self::Teen,
            _ => Self::Adult,
        }
    }

    /// Determine bracket from a date of birth as of `today`
    ///
    /// Returns `None` for a birth date in the future.
    #[must_use]
    pub fn from_date_of_birth(date_of_birth: NaiveDate, today: NaiveDate) -> Option<Self> {
        age_in_years(date_of_birth, today).map(Self::from_age)
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Child => "Child (under 13)",
            Self::Teen => "Teen (13-17)",
            Self::Adult => "Adult (18+)",
        }
    }
}

/// Completed years between `date_of_birth` and `today`
#[must_use]
pub fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if date_of_birth > today {
        return None;
    }
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Break threshold per age bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdTable {
    pub child: Duration,
    pub teen: Duration,
    pub adult: Duration,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            child: Duration::from_secs(15 * 60),
            teen: Duration::from_secs(20 * 60),
            adult: Duration::from_secs(30 * 60),
        }
    }
}

impl ThresholdTable {
    #[must_use]
    pub const fn threshold_for(&self, bracket: AgeBracket) -> Duration {
        match bracket {
            AgeBracket::Child => self.child,
            AgeBracket::Teen => self.teen,
            AgeBracket::Adult => self.adult,
        }
    }
}

/// Decides when a break reminder is due
///
/// Stateless apart from its threshold; evaluated on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPolicy {
    threshold: Duration,
}

impl Default for BreakPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_BREAK_THRESHOLD,
        }
    }
}

impl BreakPolicy {
    /// Create a policy, falling back to [`DEFAULT_BREAK_THRESHOLD`] when the
    /// threshold is missing or zero
    #[must_use]
    pub fn new(threshold: Option<Duration>) -> Self {
        match threshold {
            Some(t) if !t.is_zero() => Self { threshold: t },
            Some(_) => {
                log::warn!(
                    "Ignoring zero break threshold, using default of {}s",
                    DEFAULT_BREAK_THRESHOLD.as_secs()
                );
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Select the threshold from the user's age bracket, if known
    #[must_use]
    pub fn for_profile(bracket: Option<AgeBracket>, table: &ThresholdTable) -> Self {
        Self::new(bracket.map(|b| table.threshold_for(b)))
    }

    #[must_use]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    #[must_use]
    pub fn should_alert(&self, state: &SessionState, now: DateTime<Utc>) -> bool {
        should_alert(state, self.threshold, now)
    }
}

/// True iff a session is active, at least `threshold` has passed since the
/// last break, and no alert is already pending
#[must_use]
pub fn should_alert(state: &SessionState, threshold: Duration, now: DateTime<Utc>) -> bool {
    if state.break_alert_shown {
        return false;
    }
    let Some(since_break) = state.since_last_break(now) else {
        return false;
    };
    // Negative when the clock stepped backwards
    since_break
        .to_std()
        .is_ok_and(|elapsed| elapsed >= threshold)
}
