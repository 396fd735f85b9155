use std::fmt;
use std::num::NonZeroU64;

use jiff::SignedDuration;

/// A parsed ISO 8601 repeating interval: repetition budget plus calendar and
/// clock components.
///
/// The value never changes after construction. The sub-day (clock) part is
/// summed once and cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    repetitions: Repetitions,
    years: u32,
    months: u32,
    days: u32,
    hours: u32,
    minutes: u32,
    seconds: u32,
    clock: SignedDuration,
}

impl Period {
    /// Build a period from all of its components.
    ///
    /// `repetitions` follows the signed convention: `0` never fires, `n > 0`
    /// fires exactly `n` times, any negative value repeats forever.
    pub fn new(
        repetitions: i64,
        years: u32,
        months: u32,
        days: u32,
        hours: u32,
        minutes: u32,
        seconds: u32,
    ) -> Self {
        Self {
            repetitions: repetitions.into(),
            years,
            months,
            days,
            hours,
            minutes,
            seconds,
            clock: clock_duration(hours, minutes, seconds),
        }
    }

    /// Return a copy carrying a different repetition budget.
    pub fn with_repetitions(mut self, repetitions: Repetitions) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn repetitions(&self) -> Repetitions {
        self.repetitions
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// The fixed-length part of the period: `hours*3600 + minutes*60 + seconds`.
    pub fn clock_duration(&self) -> SignedDuration {
        self.clock
    }

    /// Whether any calendar component (years, months, days) is non-zero.
    pub fn has_calendar_part(&self) -> bool {
        self.years > 0 || self.months > 0 || self.days > 0
    }

    /// Whether any clock component (hours, minutes, seconds) is non-zero.
    pub fn has_clock_part(&self) -> bool {
        self.hours > 0 || self.minutes > 0 || self.seconds > 0
    }

    /// A period whose every component is zero never advances time.
    pub fn is_zero_length(&self) -> bool {
        !self.has_calendar_part() && !self.has_clock_part()
    }

    pub fn get(&self, field: Field) -> i64 {
        match field {
            Field::Repetitions => self.repetitions.count(),
            Field::Years => self.years.into(),
            Field::Months => self.months.into(),
            Field::Days => self.days.into(),
            Field::Hours => self.hours.into(),
            Field::Minutes => self.minutes.into(),
            Field::Seconds => self.seconds.into(),
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::new(0, 0, 0, 0, 0, 0, 0)
    }
}

fn clock_duration(hours: u32, minutes: u32, seconds: u32) -> SignedDuration {
    // u32::MAX * 3600 + u32::MAX * 60 + u32::MAX stays far below i64::MAX.
    let secs = i64::from(hours) * 3600 + i64::from(minutes) * 60 + i64::from(seconds);
    SignedDuration::from_secs(secs)
}

/// How many times a period elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Repetitions {
    /// The period never elapses.
    #[default]
    Never,
    /// The period elapses exactly this many times.
    Times(NonZeroU64),
    /// The period repeats until it is cancelled.
    Unbounded,
}

impl Repetitions {
    /// The signed-count view: `0` for never, `n` for a bounded budget, `-1`
    /// for unbounded.
    pub fn count(&self) -> i64 {
        match self {
            Self::Never => 0,
            Self::Times(n) => i64::try_from(n.get()).unwrap_or(i64::MAX),
            Self::Unbounded => -1,
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// Remaining budget as a countdown, `None` meaning unbounded.
    pub(crate) fn countdown(&self) -> Option<u64> {
        match self {
            Self::Never => Some(0),
            Self::Times(n) => Some(n.get()),
            Self::Unbounded => None,
        }
    }
}

impl From<i64> for Repetitions {
    fn from(count: i64) -> Self {
        match count {
            0 => Self::Never,
            n if n < 0 => Self::Unbounded,
            n => NonZeroU64::new(n.unsigned_abs()).map_or(Self::Never, Self::Times),
        }
    }
}

impl From<NonZeroU64> for Repetitions {
    fn from(n: NonZeroU64) -> Self {
        Self::Times(n)
    }
}

/// Names of the numeric fields of a period, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Repetitions,
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Repetitions => "repetitions",
            Field::Years => "years",
            Field::Months => "months",
            Field::Days => "days",
            Field::Hours => "hours",
            Field::Minutes => "minutes",
            Field::Seconds => "seconds",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
