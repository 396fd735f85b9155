//! isoperiod: ISO 8601 repeating intervals.
//!
//! Parses `[Rn/]P[nY][nM][nD][T[nH][nM][nS]]`, writes it back in canonical
//! form, computes when an interval next elapses, and drives a cancellable
//! ticker that fires once per interval until its repetition budget runs out.
//!
//! # Examples
//!
//! ```
//! use isoperiod::Period;
//!
//! let period: Period = "R5/PT30S".parse().unwrap();
//! assert_eq!(period.to_string(), "R5/PT30S");
//!
//! let now: jiff::Zoned = "2023-01-01T00:00:00+00:00[UTC]".parse().unwrap();
//! let next = period.next_from(&now).unwrap().unwrap();
//! assert_eq!(next.to_string(), "2023-01-01T00:00:30+00:00[UTC]");
//! ```

pub mod clock;
pub mod display;
pub mod error;
pub mod eval;
pub mod parser;
pub mod period;
pub mod ticker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{PeriodError, Span};
pub use eval::Occurrences;
pub use period::{Field, Period, Repetitions};
pub use ticker::{Ending, StopHandle, Ticker, TickerConfig, TickerState, Ticks, TryRecvError};

use jiff::Zoned;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// --- Period convenience methods ---

impl Period {
    /// Parse interval text.
    pub fn parse(input: &str) -> Result<Self, PeriodError> {
        parser::parse(input)
    }

    /// Check whether `input` parses, without keeping the result.
    pub fn validate(input: &str) -> bool {
        parser::parse(input).is_ok()
    }

    /// Compute when the period next elapses after `now`.
    ///
    /// `Ok(None)` means the period never elapses. The repetition budget is not
    /// consumed.
    pub fn next_from(&self, now: &Zoned) -> Result<Option<Zoned>, PeriodError> {
        eval::next_from(self, now)
    }

    /// Compute up to `n` successive occurrences after `now`, honoring the budget.
    pub fn next_n_from(&self, now: &Zoned, n: usize) -> Result<Vec<Zoned>, PeriodError> {
        eval::next_n_from(self, now, n)
    }

    /// Lazily iterate successive occurrences after `from`, honoring the budget.
    pub fn occurrences(&self, from: &Zoned) -> Occurrences<'_> {
        Occurrences::new(self, from.clone())
    }

    /// A ticker for this period with the default one-second interval.
    pub fn ticker(&self) -> Ticker {
        Ticker::new(*self)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(7))?;
        map.serialize_entry("repetitions", &self.repetitions().count())?;
        map.serialize_entry("year", &self.years())?;
        map.serialize_entry("month", &self.months())?;
        map.serialize_entry("day", &self.days())?;
        map.serialize_entry("hour", &self.hours())?;
        map.serialize_entry("minute", &self.minutes())?;
        map.serialize_entry("second", &self.seconds())?;
        map.end()
    }
}

/// Accepted shapes: interval text, or the map written by `Serialize`.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(untagged)]
enum PeriodRepr {
    Text(String),
    Fields {
        #[serde(default)]
        repetitions: i64,
        #[serde(default)]
        year: u32,
        #[serde(default)]
        month: u32,
        #[serde(default)]
        day: u32,
        #[serde(default)]
        hour: u32,
        #[serde(default)]
        minute: u32,
        #[serde(default)]
        second: u32,
    },
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PeriodRepr::deserialize(deserializer)? {
            PeriodRepr::Text(s) => Period::parse(&s).map_err(serde::de::Error::custom),
            PeriodRepr::Fields {
                repetitions,
                year,
                month,
                day,
                hour,
                minute,
                second,
            } => Ok(Period::new(
                repetitions,
                year,
                month,
                day,
                hour,
                minute,
                second,
            )),
        }
    }
}
