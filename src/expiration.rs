//! The date-based expiration state machine.
//!
//! All comparisons are date-only: the current time is truncated to the
//! local calendar date before comparing, so state transitions happen at
//! local midnight. Upper bounds are inclusive; the day the license expires
//! is still Active, the last day of grace is still Grace, and so on.
//! Nothing here is cached, every query is a pure function of the snapshot
//! and today's date.

use crate::info::LicenseInfo;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which window of the license lifetime today falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationState {
    /// On or before the expiration date.
    Active,
    /// Past expiration, within the grace window. Fully functional but
    /// flagged expired.
    Grace,
    /// Past grace, within the hard-stop window. Restricted operation.
    HardStop,
    /// Past the hard-stop window. Terminal.
    Expired,
}

/// The expiration flags and window bounds computed for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationInfo {
    /// Today is past the expiration date.
    pub is_license_expired: bool,
    /// Today is inside the grace window.
    pub is_in_grace_period: bool,
    /// Today is past the end of the grace window.
    pub is_grace_period_over: bool,
    /// Today is inside the hard-stop window.
    pub is_in_hard_stop_period: bool,
    /// Today is past the end of the hard-stop window.
    pub is_hard_stop_period_over: bool,
    /// Last day of the grace window.
    pub grace_period_exp_on: Option<NaiveDate>,
    /// Last day of the hard-stop window.
    pub hard_stop_exp_on: Option<NaiveDate>,
}

impl ExpirationInfo {
    /// Computes the expiration flags for `today`.
    ///
    /// A snapshot without an expiration date (only invalid snapshots lack
    /// one) reports the terminal Expired state so downstream gating fails
    /// closed.
    #[must_use]
    pub fn compute(info: &LicenseInfo, today: NaiveDate) -> Self {
        let Some(expires) = info.expiration_date else {
            return Self {
                is_license_expired: true,
                is_in_grace_period: false,
                is_grace_period_over: true,
                is_in_hard_stop_period: false,
                is_hard_stop_period_over: true,
                grace_period_exp_on: None,
                hard_stop_exp_on: None,
            };
        };

        let grace_end = add_days(expires, info.grace_period);
        let hard_end = add_days(expires, info.grace_period.saturating_add(info.hard_stop));

        let expired = today > expires;
        // An unrepresentable bound can never be crossed.
        let grace_over = grace_end.is_some_and(|end| today > end);
        let hard_over = hard_end.is_some_and(|end| today > end);

        Self {
            is_license_expired: expired,
            is_in_grace_period: expired && !grace_over,
            is_grace_period_over: grace_over,
            is_in_hard_stop_period: expired && grace_over && !hard_over,
            is_hard_stop_period_over: hard_over,
            grace_period_exp_on: grace_end,
            hard_stop_exp_on: hard_end,
        }
    }

    /// Collapses the flags into the single lifetime state.
    #[must_use]
    pub fn state(&self) -> ExpirationState {
        if !self.is_license_expired {
            ExpirationState::Active
        } else if self.is_in_grace_period {
            ExpirationState::Grace
        } else if self.is_in_hard_stop_period {
            ExpirationState::HardStop
        } else {
            ExpirationState::Expired
        }
    }
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|d| date.checked_add_signed(d))
}
