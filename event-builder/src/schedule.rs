//! Start/end validation for the date editor.
//!
//! Only the start instant is stored on the event; the end exists while the
//! editor is open so the host can see and check the event's span.

use crate::error::ScheduleError;
use chrono::{DateTime, Duration, Utc};

/// Default event length when the host has not picked an end
pub const DEFAULT_EVENT_DURATION: Duration = Duration::hours(2);

/// A start/end pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    /// Start instant
    pub start: DateTime<Utc>,
    /// End instant
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range without validating it
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Rejects an end before the start; equal instants are fine
    ///
    /// # Errors
    ///
    /// [`ScheduleError::EndBeforeStart`]
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.end < self.start {
            return Err(ScheduleError::EndBeforeStart);
        }
        Ok(())
    }

    /// Span of the range, negative when invalid
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Editor state for picking a start and end
///
/// Moving the start onto or past the end drags the end along so the range
/// stays valid; moving the end before the start is reported, not fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRangeDraft {
    range: DateRange,
    default_duration: Duration,
    error: Option<ScheduleError>,
}

impl DateRangeDraft {
    /// Starts at `start` and ends one default duration later
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self::with_duration(start, DEFAULT_EVENT_DURATION)
    }

    /// Starts at `start` and ends `default_duration` later
    #[must_use]
    pub fn with_duration(start: DateTime<Utc>, default_duration: Duration) -> Self {
        Self {
            range: DateRange::new(start, end_after(start, default_duration)),
            default_duration,
            error: None,
        }
    }

    /// Opens the editor on an event's start, or on `now` when unscheduled
    #[must_use]
    pub fn open(existing: Option<DateTime<Utc>>, now: DateTime<Utc>, default_duration: Duration) -> Self {
        Self::with_duration(existing.unwrap_or(now), default_duration)
    }

    /// Moves the start
    pub fn set_start(&mut self, start: DateTime<Utc>) {
        self.range.start = start;
        if start >= self.range.end {
            self.range.end = end_after(start, self.default_duration);
        }
        self.error = self.range.validate().err();
    }

    /// Moves the end
    pub fn set_end(&mut self, end: DateTime<Utc>) {
        self.range.end = end;
        self.error = self.range.validate().err();
    }

    /// Current range
    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Message to show under the inputs, if any
    #[must_use]
    pub const fn error(&self) -> Option<ScheduleError> {
        self.error
    }

    /// The start instant to save on the event
    ///
    /// # Errors
    ///
    /// [`ScheduleError::EndBeforeStart`] blocks the save
    pub fn commit(&self) -> Result<DateTime<Utc>, ScheduleError> {
        self.range.validate()?;
        Ok(self.range.start)
    }
}

/// `start` plus `duration`, never before `start` and saturating at the
/// latest representable instant
fn end_after(start: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    start
        .checked_add_signed(duration.max(Duration::zero()))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Renders an instant like `Jun 1, 2025 at 7:00 PM`, or a placeholder
#[must_use]
pub fn format_date_time(date_time: Option<DateTime<Utc>>) -> String {
    date_time.map_or_else(
        || "Date and time".to_string(),
        |dt| dt.format("%b %-d, %Y at %-I:%M %p").to_string(),
    )
}
